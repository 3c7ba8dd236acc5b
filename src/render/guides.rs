//! Guide overlays drawn on top of a finished label.
//!
//! | Guide | Color | Stroke | Where |
//! |-------|-------|--------|-------|
//! | Trim line | red | 1px, dashed 5/5 | printable-area boundary |
//! | Safe zone | green | 2px, dashed 5/5 | 3mm inside the trim (standard layout) |
//! | Crop marks | black | `max(2, dpi/150)` | 5mm arms, 2mm outside each corner |
//! | Center marks | red | `max(2, dpi/150)` | 5mm crosshair arms at the center |

use super::surface::{Rect, Surface, BLACK, GUIDE_DASH, GUIDE_GREEN, GUIDE_RED};
use crate::label::RenderOptions;
use crate::template::LayoutKind;
use crate::units::Dpi;

/// Trim line stroke width.
pub const TRIM_LINE_WIDTH: f32 = 1.0;
/// Safe zone stroke width.
pub const SAFE_ZONE_WIDTH: f32 = 2.0;
/// Safe zone inset from the trim.
pub const SAFE_ZONE_INSET_MM: f32 = 3.0;
/// Crop mark and center mark arm length.
pub const MARK_LENGTH_MM: f32 = 5.0;
/// Crop mark distance from the trim corner.
pub const CROP_MARK_OFFSET_MM: f32 = 2.0;

/// Draw the enabled guides in order: trim line, safe zone, crop marks,
/// center marks.
pub fn draw_guides(surface: &mut Surface, printable: Rect, layout: LayoutKind, options: &RenderOptions) {
    let dpi = options.dpi;
    if options.show_trim_line {
        draw_trim_line(surface, printable);
    }
    if options.show_safe_zone && layout != LayoutKind::DiscSurface {
        draw_safe_zone(surface, printable, dpi);
    }
    if options.show_crop_marks {
        draw_crop_marks(surface, printable, dpi);
    }
    if options.show_center_marks {
        draw_center_marks(surface, printable, dpi);
    }
}

pub fn draw_trim_line(surface: &mut Surface, printable: Rect) {
    surface.stroke_rect(printable, TRIM_LINE_WIDTH, GUIDE_RED, Some(GUIDE_DASH));
}

pub fn draw_safe_zone(surface: &mut Surface, printable: Rect, dpi: Dpi) {
    let inset = dpi.mm(SAFE_ZONE_INSET_MM);
    let safe = Rect::new(
        printable.x + inset,
        printable.y + inset,
        printable.width - 2 * inset,
        printable.height - 2 * inset,
    );
    if safe.is_empty() {
        return;
    }
    surface.stroke_rect(safe, SAFE_ZONE_WIDTH, GUIDE_GREEN, Some(GUIDE_DASH));
}

pub fn draw_crop_marks(surface: &mut Surface, printable: Rect, dpi: Dpi) {
    let len = dpi.mm(MARK_LENGTH_MM) as f32;
    let off = dpi.mm(CROP_MARK_OFFSET_MM) as f32;
    let weight = dpi.mark_weight();

    let (left, top) = (printable.x as f32, printable.y as f32);
    let (right, bottom) = (printable.right() as f32, printable.bottom() as f32);

    for y in [top, bottom] {
        surface.hline(left - off - len, left - off, y, weight, BLACK, None);
        surface.hline(right + off, right + off + len, y, weight, BLACK, None);
    }
    for x in [left, right] {
        surface.vline(x, top - off - len, top - off, weight, BLACK, None);
        surface.vline(x, bottom + off, bottom + off + len, weight, BLACK, None);
    }
}

pub fn draw_center_marks(surface: &mut Surface, printable: Rect, dpi: Dpi) {
    let len = dpi.mm(MARK_LENGTH_MM) as f32;
    let weight = dpi.mark_weight();
    let cx = printable.x as f32 + printable.width as f32 / 2.0;
    let cy = printable.y as f32 + printable.height as f32 / 2.0;

    surface.hline(cx - len, cx + len, cy, weight, GUIDE_RED, None);
    surface.vline(cx, cy - len, cy + len, weight, GUIDE_RED, None);
}
