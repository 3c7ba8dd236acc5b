//! # Layout Strategies
//!
//! A layout turns `(template, data, options)` into a [`DrawPlan`]: pixel
//! rectangles for every region, the text lines (already case-transformed)
//! with their sizes and styles, and any layout-specific guide rules. Planning
//! is pure; the renderer executes the plan.
//!
//! The strategy is selected by [`Template::layout`], so a new label shape is
//! a new [`LayoutKind`] variant plus a planning function.
//!
//! ## Standard layout
//!
//! ```text
//! ┌─────────────────────────────┐ ← trim (top of printable area)
//! │ ◄ INSERT THIS END           │ 4mm banner (optional)
//! ├─────────────────────────────┤
//! │                             │
//! │          artwork            │ height − banner − 6.5 − 1.0
//! │                             │
//! ├─────────────────────────────┤
//! │                             │ 1.0mm gap
//! ├─────────────────────────────┤
//! │ TITLE / ARTIST / YEAR       │ 6.5mm text region (themed)
//! └─────────────────────────────┘
//! ```
//!
//! ## Disc surface layout
//!
//! ```text
//! ┌─────────────────────────────┐
//! │ ▲ INSERT THIS END           │ 4mm
//! ├─────────────────────────────┤
//! │          artwork            │ 37mm square
//! ├─────────────────────────────┤
//! │ TITLE / ARTIST / YEAR       │ 9mm text region, text within first 6mm
//! │ ─────────────────────────── │ ← safe rule, 3mm above bottom trim
//! └─────────────────────────────┘
//! ```
//!
//! The millimeter constants below are properties of the physical media the
//! layouts were tuned for. They would move into [`Template`] if more
//! disc-surface-like formats are added.

use super::surface::{Color, Rect, BLACK, DARK_BACKGROUND, GUIDE_GREEN, WHITE};
use crate::label::{LabelData, LabelTheme, RenderOptions};
use crate::template::{LayoutKind, Template};
use crate::units::Dpi;

use super::text::{title_case, uppercase};

/// Minimum text size in pixels.
pub const MIN_FONT_PX: f32 = 8.0;

/// Banner height.
pub const BANNER_MM: f32 = 4.0;
/// Banner text and arrow padding.
pub const BANNER_PADDING_MM: f32 = 2.0;
/// Banner caption.
pub const BANNER_TEXT: &str = "INSERT THIS END";

/// Standard layout: text region height.
pub const TEXT_REGION_MM: f32 = 6.5;
/// Standard layout: gap between artwork and text region.
pub const TEXT_GAP_MM: f32 = 1.0;
/// Text left/right padding (both layouts).
pub const TEXT_PADDING_MM: f32 = 1.5;
/// Standard layout: distance from region top to the first line.
pub const TEXT_TOP_MM: f32 = 0.5;
/// Standard layout: title size.
pub const TITLE_MM: f32 = 2.5;
/// Standard layout: artist/year size relative to the title.
pub const SUBTITLE_RATIO: f32 = 0.75;
/// Standard layout: line advance after the title, relative to its size.
pub const TITLE_LEADING: f32 = 1.3;
/// Standard layout: line advance after the artist, relative to its size.
pub const SUBTITLE_LEADING: f32 = 1.2;

/// Disc surface: artwork square side.
pub const DISC_ARTWORK_MM: f32 = 37.0;
/// Disc surface: text region height.
pub const DISC_TEXT_REGION_MM: f32 = 9.0;
/// Disc surface: safe rule distance above the bottom trim edge.
pub const DISC_SAFE_MARGIN_MM: f32 = 3.0;
/// Disc surface: part of the text region all text must stay within.
pub const DISC_SAFE_BAND_MM: f32 = 6.0;
/// Disc surface: distance from region top to the first line.
pub const DISC_TEXT_TOP_MM: f32 = 0.5;
/// Disc surface: gap between lines.
pub const DISC_LEADING_MM: f32 = 0.4;
/// Disc surface: nominal title, artist and year sizes.
pub const DISC_LINE_MM: [f32; 3] = [2.8, 2.2, 2.0];

/// Guide rule stroke width.
pub const RULE_WIDTH: f32 = 2.0;

/// Orientation glyph direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Left,
    Up,
}

/// Banner geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct BannerPlan {
    pub rect: Rect,
    pub arrow: Arrow,
    /// Filled triangle standing in for the orientation glyph.
    pub arrow_points: [(f32, f32); 3],
    pub text: &'static str,
    pub text_x: f32,
    pub text_top: f32,
    pub text_max_width: f32,
    pub font_px: f32,
}

/// Which field a text line shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Title,
    Artist,
    Year,
}

/// One line of the text block, before width fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub role: LineRole,
    pub text: String,
    pub x: f32,
    /// Top of the line box.
    pub y: f32,
    pub px: f32,
    pub bold: bool,
    pub italic: bool,
    pub max_width: f32,
}

impl TextLine {
    /// Bottom of the line box.
    pub fn bottom(&self) -> f32 {
        self.y + self.px
    }
}

/// Solid horizontal guide rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub y: f32,
    pub x0: f32,
    pub x1: f32,
    pub width: f32,
    pub color: Color,
}

/// Everything a renderer needs to paint one label.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPlan {
    pub layout: LayoutKind,
    pub dpi: Dpi,
    pub surface_width: u32,
    pub surface_height: u32,
    /// Trim boundary.
    pub printable: Rect,
    pub background: Color,
    pub banner: Option<BannerPlan>,
    pub artwork: Rect,
    pub text_region: Rect,
    pub text_background: Color,
    pub text_color: Color,
    pub lines: Vec<TextLine>,
    /// Text must end at or above this y.
    pub text_limit: i32,
    /// Layout-specific rules drawn after the text.
    pub rules: Vec<Rule>,
}

/// Plan a render of `data` on `template` with `options`.
pub fn plan(template: &Template, data: &LabelData, options: &RenderOptions) -> DrawPlan {
    match template.layout {
        LayoutKind::Standard => plan_standard(template, data, options),
        LayoutKind::DiscSurface => plan_disc_surface(template, data, options),
    }
}

/// Printable-area rectangle and surface size shared by every layout.
fn frame(template: &Template, dpi: Dpi) -> (Rect, u32, u32) {
    let bleed = dpi.mm(template.bleed_mm);
    let printable = Rect::new(bleed, bleed, dpi.mm(template.width_mm), dpi.mm(template.height_mm));
    let width = dpi.mm(template.total_width_mm()).max(0) as u32;
    let height = dpi.mm(template.total_height_mm()).max(0) as u32;
    (printable, width, height)
}

fn banner(rect: Rect, arrow: Arrow, dpi: Dpi) -> BannerPlan {
    let h = rect.height as f32;
    let font_px = (h * 0.6).max(MIN_FONT_PX).max(dpi.mm(3.0) as f32 * 0.8);
    let padding = dpi.mm(BANNER_PADDING_MM) as f32;

    let side = font_px * 0.7;
    let ax = rect.x as f32 + padding;
    let cy = rect.y as f32 + h / 2.0;
    let arrow_points = match arrow {
        Arrow::Left => [(ax, cy), (ax + side, cy - side / 2.0), (ax + side, cy + side / 2.0)],
        Arrow::Up => [
            (ax + side / 2.0, cy - side / 2.0),
            (ax + side, cy + side / 2.0),
            (ax, cy + side / 2.0),
        ],
    };

    let text_x = ax + side + padding;
    BannerPlan {
        rect,
        arrow,
        arrow_points,
        text: BANNER_TEXT,
        text_x,
        text_top: cy - font_px / 2.0,
        text_max_width: (rect.right() as f32 - padding - text_x).max(0.0),
        font_px,
    }
}

/// Title and artist case transform.
fn transform(text: &str, options: &RenderOptions) -> String {
    if options.font_style.title_case {
        title_case(text)
    } else {
        uppercase(text)
    }
}

fn lines(
    data: &LabelData,
    options: &RenderOptions,
    x: f32,
    tops: [f32; 3],
    sizes: [f32; 3],
    max_width: f32,
) -> Vec<TextLine> {
    let style = options.font_style;
    let title_bold = !style.title_case || style.bold;
    let contents = [
        (LineRole::Title, transform(&data.title, options), title_bold),
        (LineRole::Artist, transform(&data.artist, options), style.bold),
        (LineRole::Year, data.year.clone(), style.bold),
    ];
    contents
        .into_iter()
        .zip(tops.into_iter().zip(sizes))
        .map(|((role, text, bold), (y, px))| TextLine {
            role,
            text,
            x,
            y,
            px,
            bold,
            italic: style.italic,
            max_width,
        })
        .collect()
}

fn plan_standard(template: &Template, data: &LabelData, options: &RenderOptions) -> DrawPlan {
    let dpi = options.dpi;
    let (printable, surface_width, surface_height) = frame(template, dpi);

    let banner_mm = if template.has_banner { BANNER_MM } else { 0.0 };
    let mut artwork_mm = template.height_mm - banner_mm - TEXT_REGION_MM - TEXT_GAP_MM;
    if artwork_mm < 0.0 {
        tracing::warn!(
            template = %template.id,
            height_mm = template.height_mm,
            "template too short for artwork region, collapsing it"
        );
        artwork_mm = 0.0;
    }

    let banner_px = dpi.mm(banner_mm);
    let artwork = Rect::new(printable.x, printable.y + banner_px, printable.width, dpi.mm(artwork_mm));
    let text_region = Rect::new(
        printable.x,
        artwork.bottom() + dpi.mm(TEXT_GAP_MM),
        printable.width,
        dpi.mm(TEXT_REGION_MM),
    );

    let (background, text_color) = match options.label_theme {
        LabelTheme::Light => (WHITE, BLACK),
        LabelTheme::Dark => (DARK_BACKGROUND, WHITE),
    };

    let padding = dpi.mm(TEXT_PADDING_MM) as f32;
    let title_px = (dpi.mm(TITLE_MM) as f32).max(MIN_FONT_PX);
    let sub_px = (title_px * SUBTITLE_RATIO).max(MIN_FONT_PX);
    let top = (text_region.y + dpi.mm(TEXT_TOP_MM)) as f32;
    let second = top + title_px * TITLE_LEADING;
    let third = second + sub_px * SUBTITLE_LEADING;

    let lines = lines(
        data,
        options,
        text_region.x as f32 + padding,
        [top, second, third],
        [title_px, sub_px, sub_px],
        (printable.width as f32 - 2.0 * padding).max(0.0),
    );

    let overflow = third + sub_px - text_region.bottom() as f32;
    if overflow > 0.0 {
        tracing::warn!(
            overflow_px = overflow,
            dpi = dpi.0,
            "text block extends past the text region"
        );
    }

    let mut rules = Vec::new();
    if options.show_trim_line && !options.show_safe_zone {
        rules.push(Rule {
            y: text_region.bottom() as f32,
            x0: printable.x as f32,
            x1: printable.right() as f32,
            width: RULE_WIDTH,
            color: GUIDE_GREEN,
        });
    }

    let banner_plan = template
        .has_banner
        .then(|| banner(Rect::new(printable.x, printable.y, printable.width, banner_px), Arrow::Left, dpi));

    DrawPlan {
        layout: LayoutKind::Standard,
        dpi,
        surface_width,
        surface_height,
        printable,
        background,
        banner: banner_plan,
        artwork,
        text_region,
        text_background: background,
        text_color,
        lines,
        text_limit: text_region.bottom(),
        rules,
    }
}

/// Disc surface text sizes, shrunk uniformly when the nominal stack does not
/// fit the safe band. Returns `(sizes, shrunk)`.
///
/// The band wins over [`MIN_FONT_PX`]: at screen resolutions the shrunk
/// sizes fall below the floor (4 px at 72 DPI).
pub fn disc_text_sizes(dpi: Dpi) -> ([f32; 3], bool) {
    let nominal = DISC_LINE_MM.map(|mm| (dpi.mm(mm) as f32).max(MIN_FONT_PX));
    let available = (dpi.mm(DISC_SAFE_BAND_MM) - dpi.mm(DISC_TEXT_TOP_MM) - 2 * dpi.mm(DISC_LEADING_MM))
        .max(0) as f32;
    let total: f32 = nominal.iter().sum();
    if total <= available {
        (nominal, false)
    } else {
        let k = available / total;
        (nominal.map(|px| (px * k).floor()), true)
    }
}

fn plan_disc_surface(template: &Template, data: &LabelData, options: &RenderOptions) -> DrawPlan {
    let dpi = options.dpi;
    let (printable, surface_width, surface_height) = frame(template, dpi);

    let banner_px = dpi.mm(BANNER_MM);
    let artwork = Rect::new(printable.x, printable.y + banner_px, printable.width, dpi.mm(DISC_ARTWORK_MM));
    let text_region = Rect::new(printable.x, artwork.bottom(), printable.width, dpi.mm(DISC_TEXT_REGION_MM));

    let (sizes, shrunk) = disc_text_sizes(dpi);
    if shrunk {
        tracing::warn!(
            dpi = dpi.0,
            title_px = sizes[0],
            "disc text shrunk to stay inside the safe band"
        );
    }
    if sizes.iter().any(|&px| px < MIN_FONT_PX) {
        tracing::warn!(
            dpi = dpi.0,
            smallest_px = sizes[2],
            floor_px = MIN_FONT_PX,
            "disc text below the legibility floor; use a higher DPI for a readable preview"
        );
    }

    let leading = dpi.mm(DISC_LEADING_MM) as f32;
    let first = (text_region.y + dpi.mm(DISC_TEXT_TOP_MM)) as f32;
    let second = first + sizes[0] + leading;
    let third = second + sizes[1] + leading;
    let padding = dpi.mm(TEXT_PADDING_MM) as f32;

    let lines = lines(
        data,
        options,
        text_region.x as f32 + padding,
        [first, second, third],
        sizes,
        (printable.width as f32 - 2.0 * padding).max(0.0),
    );

    let mut rules = Vec::new();
    if options.show_safe_zone {
        rules.push(Rule {
            y: (printable.bottom() - dpi.mm(DISC_SAFE_MARGIN_MM)) as f32,
            x0: printable.x as f32,
            x1: printable.right() as f32,
            width: RULE_WIDTH,
            color: GUIDE_GREEN,
        });
    }

    let banner_plan = template
        .has_banner
        .then(|| banner(Rect::new(printable.x, printable.y, printable.width, banner_px), Arrow::Up, dpi));

    DrawPlan {
        layout: LayoutKind::DiscSurface,
        dpi,
        surface_width,
        surface_height,
        printable,
        background: WHITE,
        banner: banner_plan,
        artwork,
        text_region,
        text_background: WHITE,
        text_color: BLACK,
        lines,
        text_limit: text_region.y + dpi.mm(DISC_SAFE_BAND_MM),
        rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::FontStyle;
    use crate::template;
    use pretty_assertions::assert_eq;

    fn options(id: &str, dpi: Dpi) -> RenderOptions {
        RenderOptions {
            dpi,
            ..RenderOptions::for_template(template::by_id(id).unwrap().clone())
        }
    }

    fn ok_computer() -> LabelData {
        LabelData::new("OK Computer", "Radiohead", "1997")
    }

    #[test]
    fn test_standard_geometry_at_print_dpi() {
        let opts = options("jewel-case", Dpi::PRINT);
        let p = plan(&opts.template, &ok_computer(), &opts);

        assert_eq!((p.surface_width, p.surface_height), (508, 697));
        assert_eq!(p.printable, Rect::new(35, 35, 437, 626));
        let banner = p.banner.as_ref().unwrap();
        assert_eq!(banner.rect, Rect::new(35, 35, 437, 47));
        assert_eq!(banner.arrow, Arrow::Left);
        // 53 - 4 - 6.5 - 1.0 = 41.5mm
        assert_eq!(p.artwork, Rect::new(35, 82, 437, 490));
        assert_eq!(p.text_region, Rect::new(35, 584, 437, 77));
        assert_eq!(p.text_region.bottom(), p.printable.bottom());
    }

    #[test]
    fn test_standard_lines_uppercased_and_title_bold() {
        let opts = options("jewel-case", Dpi::PRINT);
        let p = plan(&opts.template, &ok_computer(), &opts);
        let texts: Vec<_> = p.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["OK COMPUTER", "RADIOHEAD", "1997"]);
        assert!(p.lines[0].bold);
        assert!(!p.lines[1].bold);
        assert!(!p.lines[2].bold);
        assert_eq!(p.lines[0].px, 30.0);
        assert_eq!(p.lines[1].px, 22.5);
    }

    #[test]
    fn test_title_case_disables_default_bold() {
        let mut opts = options("jewel-case", Dpi::PRINT);
        opts.font_style = FontStyle {
            title_case: true,
            ..FontStyle::default()
        };
        let data = LabelData::new("the bends", "radiohead", "1995");
        let p = plan(&opts.template, &data, &opts);
        assert_eq!(p.lines[0].text, "The Bends");
        assert_eq!(p.lines[1].text, "Radiohead");
        assert!(!p.lines[0].bold);

        opts.font_style.bold = true;
        opts.font_style.italic = true;
        let p = plan(&opts.template, &data, &opts);
        assert!(p.lines.iter().all(|l| l.bold && l.italic));
    }

    #[test]
    fn test_year_never_transformed() {
        let mut opts = options("jewel-case", Dpi::SCREEN);
        let data = LabelData::new("x", "y", "rec. 1997-b");
        assert_eq!(plan(&opts.template, &data, &opts).lines[2].text, "rec. 1997-b");
        opts.font_style.title_case = true;
        assert_eq!(plan(&opts.template, &data, &opts).lines[2].text, "rec. 1997-b");
    }

    #[test]
    fn test_font_floor_at_screen_dpi() {
        let opts = options("jewel-case", Dpi::SCREEN);
        let p = plan(&opts.template, &ok_computer(), &opts);
        assert!(p.lines.iter().all(|l| l.px >= MIN_FONT_PX));
        assert!(p.banner.unwrap().font_px >= MIN_FONT_PX);
    }

    #[test]
    fn test_theme_controls_standard_colors() {
        let mut opts = options("jewel-case", Dpi::SCREEN);
        opts.label_theme = LabelTheme::Dark;
        let p = plan(&opts.template, &ok_computer(), &opts);
        assert_eq!(p.text_background, DARK_BACKGROUND);
        assert_eq!(p.text_color, WHITE);
    }

    #[test]
    fn test_no_banner_gives_artwork_the_space() {
        let opts = options("cd-booklet", Dpi::SCREEN);
        let p = plan(&opts.template, &ok_computer(), &opts);
        assert!(p.banner.is_none());
        assert_eq!(p.artwork.y, p.printable.y);
    }

    #[test]
    fn test_text_rule_only_without_safe_zone() {
        let mut opts = options("jewel-case", Dpi::PRINT);
        opts.show_trim_line = true;
        opts.show_safe_zone = true;
        assert!(plan(&opts.template, &ok_computer(), &opts).rules.is_empty());

        opts.show_safe_zone = false;
        let p = plan(&opts.template, &ok_computer(), &opts);
        assert_eq!(p.rules.len(), 1);
        assert_eq!(p.rules[0].y, p.text_region.bottom() as f32);
        assert_eq!(p.rules[0].color, GUIDE_GREEN);

        opts.show_trim_line = false;
        assert!(plan(&opts.template, &ok_computer(), &opts).rules.is_empty());
    }

    #[test]
    fn test_short_template_collapses_artwork() {
        let t = Template::new("tiny", 20.0, 8.0, 1.0, true);
        let opts = RenderOptions::for_template(t.clone());
        let p = plan(&t, &ok_computer(), &opts);
        assert_eq!(p.artwork.height, 0);
    }

    #[test]
    fn test_disc_geometry_ignores_template_height() {
        for height in [53.0, 60.0] {
            let t = Template::new("disc-surface", 37.0, height, 3.0, true);
            let opts = RenderOptions {
                dpi: Dpi::PRINT,
                ..RenderOptions::for_template(t.clone())
            };
            let p = plan(&t, &ok_computer(), &opts);
            assert_eq!(p.layout, LayoutKind::DiscSurface);
            assert_eq!(p.artwork, Rect::new(35, 82, 437, 437));
            assert_eq!(p.text_region, Rect::new(35, 519, 437, 106));
            assert_eq!(p.banner.as_ref().unwrap().arrow, Arrow::Up);
        }
    }

    #[test]
    fn test_disc_always_light() {
        let mut opts = options("disc-surface", Dpi::PRINT);
        opts.label_theme = LabelTheme::Dark;
        let p = plan(&opts.template, &ok_computer(), &opts);
        assert_eq!(p.background, WHITE);
        assert_eq!(p.text_background, WHITE);
        assert_eq!(p.text_color, BLACK);
    }

    #[test]
    fn test_disc_safe_rule_three_mm_above_trim() {
        let mut opts = options("disc-surface", Dpi::PRINT);
        opts.show_safe_zone = true;
        let p = plan(&opts.template, &ok_computer(), &opts);
        assert_eq!(p.rules.len(), 1);
        assert_eq!(p.rules[0].y, (661 - 35) as f32);

        opts.show_safe_zone = false;
        assert!(plan(&opts.template, &ok_computer(), &opts).rules.is_empty());
    }

    #[test]
    fn test_disc_text_inside_safe_band_at_any_dpi() {
        for dpi in (36..=1200).step_by(12) {
            let opts = options("disc-surface", Dpi(dpi));
            let p = plan(&opts.template, &ok_computer(), &opts);
            let band_bottom = p.text_region.y + Dpi(dpi).mm(DISC_SAFE_BAND_MM);
            assert_eq!(p.text_limit, band_bottom);
            let year = &p.lines[2];
            assert!(
                year.bottom() <= band_bottom as f32,
                "dpi {}: year bottom {} > {}",
                dpi,
                year.bottom(),
                band_bottom
            );
            assert!(p.lines[0].y >= p.text_region.y as f32);
        }
    }

    #[test]
    fn test_disc_sizes_pinned() {
        assert_eq!(disc_text_sizes(Dpi::SCREEN), ([4.0, 4.0, 4.0], true));
        assert_eq!(disc_text_sizes(Dpi::PRINT), ([21.0, 17.0, 15.0], true));

        let (sizes, _) = disc_text_sizes(Dpi(600));
        assert!(sizes.iter().all(|&px| px >= MIN_FONT_PX), "{:?}", sizes);
    }

    #[test]
    fn test_disc_sizes_keep_proportions() {
        let (sizes, _) = disc_text_sizes(Dpi::PRINT);
        assert!(sizes[0] > sizes[1]);
        assert!(sizes[1] >= sizes[2]);
    }

    #[test]
    fn test_banner_text_after_arrow() {
        let opts = options("jewel-case", Dpi::PRINT);
        let b = plan(&opts.template, &ok_computer(), &opts).banner.unwrap();
        let arrow_right = b.arrow_points.iter().map(|p| p.0).fold(f32::MIN, f32::max);
        assert!(b.text_x > arrow_right);
        assert!(b.text_x + b.text_max_width <= b.rect.right() as f32);
    }
}
