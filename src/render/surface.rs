//! # Drawing Surface
//!
//! An RGB pixel buffer with the handful of primitives the label layouts need:
//! filled rectangles, axis-aligned strokes (solid or dashed), filled
//! triangles, alpha-blended pixels for text coverage, and clipped image
//! drawing. Serializes to PNG.
//!
//! ## Stroke geometry
//!
//! A stroke of width `w` centered on coordinate `c` covers the pixel span
//! starting at `round(c - w/2)` with length `max(1, round(w))`:
//!
//! ```text
//! c = 10, w = 2  → rows 9..11
//! c = 10, w = 1  → row 10
//! ```

use image::{imageops, imageops::FilterType, ImageFormat, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

use crate::error::MdLabelError;

pub type Color = Rgb<u8>;

pub const WHITE: Color = Rgb([0xFF, 0xFF, 0xFF]);
pub const BLACK: Color = Rgb([0x00, 0x00, 0x00]);
/// Fill for missing or failed artwork.
pub const PLACEHOLDER: Color = Rgb([0x40, 0x40, 0x40]);
/// Dark theme background.
pub const DARK_BACKGROUND: Color = Rgb([0x23, 0x1F, 0x20]);
/// Safe zone and text rule guide color.
pub const GUIDE_GREEN: Color = Rgb([0x00, 0xFF, 0x00]);
/// Trim line and center mark color.
pub const GUIDE_RED: Color = Rgb([0xFF, 0x00, 0x00]);

/// Dash pattern used by guide rectangles: 5px on, 5px off.
pub const GUIDE_DASH: Dash = Dash { on: 5, off: 5 };

/// Pixel rectangle. Width/height may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        Rect::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0))
    }

    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.width as i64 * self.height as i64
        }
    }
}

/// On/off dash lengths in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dash {
    pub on: u32,
    pub off: u32,
}

impl Dash {
    #[inline]
    fn is_on(&self, offset: i32) -> bool {
        let period = (self.on + self.off).max(1) as i32;
        offset.rem_euclid(period) < self.on as i32
    }
}

/// Rendering quality settings, reset on every surface configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityHints {
    /// Filter for scaling artwork.
    pub resample: FilterType,
    /// Blend glyph coverage instead of thresholding it.
    pub antialias_text: bool,
}

impl Default for QualityHints {
    fn default() -> Self {
        Self {
            resample: FilterType::Lanczos3,
            antialias_text: true,
        }
    }
}

/// Floating-point destination rectangle for image drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// # Drawing Surface
pub struct Surface {
    image: RgbImage,
    hints: QualityHints,
}

impl Surface {
    /// Create a white surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, WHITE),
            hints: QualityHints::default(),
        }
    }

    /// Resize to `width × height`, fill white and reset quality hints.
    pub fn reset(&mut self, width: u32, height: u32) {
        if self.image.dimensions() == (width, height) {
            for px in self.image.pixels_mut() {
                *px = WHITE;
            }
        } else {
            self.image = RgbImage::from_pixel(width, height, WHITE);
        }
        self.hints = QualityHints::default();
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width() as i32, self.height() as i32)
    }

    pub fn hints(&self) -> QualityHints {
        self.hints
    }

    pub fn hints_mut(&mut self) -> &mut QualityHints {
        &mut self.hints
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if self.bounds().contains(x, y) {
            Some(*self.image.get_pixel(x as u32, y as u32))
        } else {
            None
        }
    }

    /// Fill the whole surface.
    pub fn fill(&mut self, color: Color) {
        for px in self.image.pixels_mut() {
            *px = color;
        }
    }

    /// Fill a rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let r = rect.intersect(&self.bounds());
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                self.image.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    /// Blend `color` over the pixel with the given coverage in `0.0..=1.0`.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        if !self.bounds().contains(x, y) {
            return;
        }
        let a = if self.hints.antialias_text {
            coverage.clamp(0.0, 1.0)
        } else if coverage >= 0.5 {
            1.0
        } else {
            0.0
        };
        if a <= 0.0 {
            return;
        }
        let px = self.image.get_pixel_mut(x as u32, y as u32);
        for c in 0..3 {
            let dst = px.0[c] as f32;
            let src = color.0[c] as f32;
            px.0[c] = (dst + (src - dst) * a).round() as u8;
        }
    }

    /// Horizontal stroke from `x0` to `x1` (exclusive) centered on `y`.
    pub fn hline(&mut self, x0: f32, x1: f32, y: f32, width: f32, color: Color, dash: Option<Dash>) {
        let (top, thickness) = stroke_span(y, width);
        let start = x0.round() as i32;
        let end = x1.round() as i32;
        for x in start.min(end)..start.max(end) {
            if dash.is_some_and(|d| !d.is_on(x - start)) {
                continue;
            }
            self.fill_rect(Rect::new(x, top, 1, thickness), color);
        }
    }

    /// Vertical stroke from `y0` to `y1` (exclusive) centered on `x`.
    pub fn vline(&mut self, x: f32, y0: f32, y1: f32, width: f32, color: Color, dash: Option<Dash>) {
        let (left, thickness) = stroke_span(x, width);
        let start = y0.round() as i32;
        let end = y1.round() as i32;
        for y in start.min(end)..start.max(end) {
            if dash.is_some_and(|d| !d.is_on(y - start)) {
                continue;
            }
            self.fill_rect(Rect::new(left, y, thickness, 1), color);
        }
    }

    /// Stroke the outline of a rectangle; the stroke is centered on the edge.
    pub fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color, dash: Option<Dash>) {
        let (x0, y0) = (rect.x as f32, rect.y as f32);
        let (x1, y1) = (rect.right() as f32, rect.bottom() as f32);
        self.hline(x0, x1, y0, width, color, dash);
        self.hline(x0, x1, y1, width, color, dash);
        self.vline(x0, y0, y1, width, color, dash);
        self.vline(x1, y0, y1, width, color, dash);
    }

    /// Fill a triangle. A pixel is inside when its center is.
    pub fn fill_triangle(&mut self, points: [(f32, f32); 3], color: Color) {
        let min_x = points.iter().map(|p| p.0).fold(f32::INFINITY, f32::min).floor() as i32;
        let max_x = points.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max).ceil() as i32;
        let min_y = points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min).floor() as i32;
        let max_y = points.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max).ceil() as i32;

        let edge = |a: (f32, f32), b: (f32, f32), p: (f32, f32)| {
            (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
        };
        let [a, b, c] = points;
        let area = edge(a, b, c);
        if area == 0.0 {
            return;
        }

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b, c, p) * area.signum();
                let w1 = edge(c, a, p) * area.signum();
                let w2 = edge(a, b, p) * area.signum();
                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    self.fill_rect(Rect::new(x, y, 1, 1), color);
                }
            }
        }
    }

    /// Draw `source` scaled into `dest`, touching only pixels inside `clip`.
    ///
    /// Only the part of the source that lands inside the clip is resampled,
    /// so heavily zoomed artwork stays cheap. Returns the drawn pixel area.
    pub fn draw_image_clipped(&mut self, source: &RgbaImage, dest: Placement, clip: Rect) -> Rect {
        let (src_w, src_h) = source.dimensions();
        if src_w == 0 || src_h == 0 || dest.width <= 0.0 || dest.height <= 0.0 {
            return Rect::default();
        }

        let dest_rect = Rect::new(
            dest.x.round() as i32,
            dest.y.round() as i32,
            dest.width.round() as i32,
            dest.height.round() as i32,
        );
        let visible = dest_rect.intersect(&clip).intersect(&self.bounds());
        if visible.is_empty() {
            return visible;
        }

        // Source pixels per destination pixel
        let sx = src_w as f32 / dest.width;
        let sy = src_h as f32 / dest.height;

        let crop_x0 = (((visible.x as f32 - dest.x) * sx).floor().max(0.0) as u32).min(src_w - 1);
        let crop_y0 = (((visible.y as f32 - dest.y) * sy).floor().max(0.0) as u32).min(src_h - 1);
        let crop_x1 = (((visible.right() as f32 - dest.x) * sx).ceil() as u32).clamp(crop_x0 + 1, src_w);
        let crop_y1 = (((visible.bottom() as f32 - dest.y) * sy).ceil() as u32).clamp(crop_y0 + 1, src_h);

        let cropped =
            imageops::crop_imm(source, crop_x0, crop_y0, crop_x1 - crop_x0, crop_y1 - crop_y0).to_image();

        // Where the cropped part lands, in destination pixels
        let part_x = dest.x + crop_x0 as f32 / sx;
        let part_y = dest.y + crop_y0 as f32 / sy;
        let part_w = (((crop_x1 - crop_x0) as f32 / sx).round() as u32).max(1);
        let part_h = (((crop_y1 - crop_y0) as f32 / sy).round() as u32).max(1);

        let scaled = if (part_w, part_h) == cropped.dimensions() {
            cropped
        } else {
            imageops::resize(&cropped, part_w, part_h, self.hints.resample)
        };

        let origin_x = part_x.round() as i32;
        let origin_y = part_y.round() as i32;
        for y in visible.y..visible.bottom() {
            let ly = y - origin_y;
            if ly < 0 || ly >= part_h as i32 {
                continue;
            }
            for x in visible.x..visible.right() {
                let lx = x - origin_x;
                if lx < 0 || lx >= part_w as i32 {
                    continue;
                }
                let src = scaled.get_pixel(lx as u32, ly as u32);
                let alpha = src.0[3] as f32 / 255.0;
                if alpha >= 1.0 {
                    self.image.put_pixel(x as u32, y as u32, Rgb([src.0[0], src.0[1], src.0[2]]));
                } else if alpha > 0.0 {
                    let dst = self.image.get_pixel_mut(x as u32, y as u32);
                    for c in 0..3 {
                        let d = dst.0[c] as f32;
                        dst.0[c] = (d + (src.0[c] as f32 - d) * alpha).round() as u8;
                    }
                }
            }
        }

        visible
    }

    /// Serialize to PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, MdLabelError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| MdLabelError::Export(format!("Failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }
}

/// Pixel span `(start, length)` covered by a stroke centered on `center`.
#[inline]
fn stroke_span(center: f32, width: f32) -> (i32, i32) {
    let start = (center - width / 2.0 + 0.5).floor() as i32;
    let len = (width.round() as i32).max(1);
    (start, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_new_surface_is_white() {
        let s = Surface::new(4, 3);
        assert!(s.image().pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_reset_clears_content_and_hints() {
        let mut s = Surface::new(10, 10);
        s.fill_rect(Rect::new(2, 2, 4, 4), BLACK);
        s.hints_mut().resample = FilterType::Nearest;
        s.reset(10, 10);
        assert!(s.image().pixels().all(|p| *p == WHITE));
        assert_eq!(s.hints(), QualityHints::default());

        s.reset(5, 7);
        assert_eq!((s.width(), s.height()), (5, 7));
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut s = Surface::new(5, 5);
        s.fill_rect(Rect::new(-3, -3, 5, 5), BLACK);
        assert_eq!(s.pixel(0, 0), Some(BLACK));
        assert_eq!(s.pixel(1, 1), Some(BLACK));
        assert_eq!(s.pixel(2, 2), Some(WHITE));
    }

    #[test]
    fn test_stroke_span() {
        assert_eq!(stroke_span(10.0, 2.0), (9, 2));
        assert_eq!(stroke_span(10.0, 1.0), (10, 1));
        assert_eq!(stroke_span(10.0, 0.2), (10, 1));
    }

    #[test]
    fn test_dashed_hline() {
        let mut s = Surface::new(30, 3);
        s.hline(0.0, 30.0, 1.0, 1.0, BLACK, Some(GUIDE_DASH));
        let row: Vec<bool> = (0..30).map(|x| s.pixel(x, 1) == Some(BLACK)).collect();
        assert!(row[0..5].iter().all(|&b| b));
        assert!(row[5..10].iter().all(|&b| !b));
        assert!(row[10..15].iter().all(|&b| b));
    }

    #[test]
    fn test_stroke_rect_outline_only() {
        let mut s = Surface::new(20, 20);
        s.stroke_rect(Rect::new(5, 5, 10, 10), 1.0, GUIDE_RED, None);
        assert_eq!(s.pixel(5, 5), Some(GUIDE_RED));
        assert_eq!(s.pixel(14, 5), Some(GUIDE_RED));
        assert_eq!(s.pixel(15, 10), Some(GUIDE_RED));
        assert_eq!(s.pixel(10, 10), Some(WHITE));
    }

    #[test]
    fn test_fill_triangle() {
        let mut s = Surface::new(10, 10);
        s.fill_triangle([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)], BLACK);
        assert_eq!(s.pixel(1, 1), Some(BLACK));
        assert_eq!(s.pixel(9, 9), Some(WHITE));
    }

    #[test]
    fn test_image_exact_fit_covers_region() {
        let mut s = Surface::new(40, 40);
        let src = RgbaImage::from_pixel(20, 10, Rgba([200, 10, 10, 255]));
        let region = Rect::new(10, 10, 20, 10);
        let drawn = s.draw_image_clipped(
            &src,
            Placement { x: 10.0, y: 10.0, width: 20.0, height: 10.0 },
            region,
        );
        assert_eq!(drawn, region);
        for y in 10..20 {
            for x in 10..30 {
                assert_eq!(s.pixel(x, y), Some(Rgb([200, 10, 10])));
            }
        }
        assert_eq!(s.pixel(9, 10), Some(WHITE));
        assert_eq!(s.pixel(30, 10), Some(WHITE));
    }

    #[test]
    fn test_image_never_leaves_clip() {
        let mut s = Surface::new(40, 40);
        let src = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]));
        let clip = Rect::new(10, 10, 10, 10);
        s.draw_image_clipped(&src, Placement { x: 0.0, y: 0.0, width: 40.0, height: 40.0 }, clip);
        for y in 0..40 {
            for x in 0..40 {
                let expected = if clip.contains(x, y) { Rgb([0, 0, 255]) } else { WHITE };
                assert_eq!(s.pixel(x, y), Some(expected), "pixel {},{}", x, y);
            }
        }
    }

    #[test]
    fn test_png_signature() {
        let png = Surface::new(2, 2).to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
