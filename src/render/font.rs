//! # Fonts
//!
//! Text is drawn best-effort: the requested family is looked up among the
//! font files found in the configured directories, then a fixed chain of
//! common sans-serif families, and finally the embedded Spleen 12×24 bitmap
//! face, which is always available. Rendering therefore never fails because a
//! font is missing, it only looks different.
//!
//! ## File discovery
//!
//! Files are indexed by normalized family name and style, derived from the
//! file stem:
//!
//! | File | Family key | Style |
//! |------|------------|-------|
//! | `SpaceGrotesk-Bold.ttf` | `spacegrotesk` | bold |
//! | `DejaVuSans-BoldOblique.ttf` | `dejavusans` | bold italic |
//! | `Arial Italic.ttf` | `arial` | italic |
//! | `Manrope[wght].ttf` | `manrope` | regular |
//!
//! When the exact style is missing the regular face is used with synthetic
//! bold (the glyphs are drawn again one pixel to the right) and/or synthetic
//! italic (a horizontal shear).

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont};
use spleen_font::{PSF2Font, FONT_12X24};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::surface::{Color, Rect, Surface};
use crate::error::MdLabelError;

/// Families offered for label text.
pub const FONT_FAMILIES: &[&str] = &[
    "Space Grotesk",
    "DM Sans",
    "Manrope",
    "Outfit",
    "Syne",
    "Archivo",
    "Red Hat Display",
    "Chivo",
    "Jost",
    "Lexend",
    "Plus Jakarta Sans",
];

/// Families tried, in order, after the requested one.
pub const FALLBACK_FAMILIES: &[&str] = &[
    "Futura PT",
    "Century Gothic",
    "Arial",
    "Helvetica",
    "DejaVu Sans",
    "Liberation Sans",
];

/// Environment variable naming an extra font directory.
pub const FONT_DIR_ENV: &str = "MDLABEL_FONT_DIR";

/// Horizontal shear applied for synthetic italics (x shift per pixel of height).
const ITALIC_SHEAR: f32 = 0.2;

/// Spleen cell size.
const BITMAP_CELL_W: usize = 12;
const BITMAP_CELL_H: usize = 24;

/// Directory recursion limit while indexing.
const MAX_SCAN_DEPTH: usize = 4;

/// Style of one indexed font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FaceStyle {
    pub fn new(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Self::Regular,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (true, true) => Self::BoldItalic,
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }
}

/// Normalize a family name for lookup: lowercase alphanumerics only.
pub fn family_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split a font file stem into `(family key, style)`. Returns `None` for
/// weights other than regular and bold (light, medium, black, ...).
pub fn classify_stem(stem: &str) -> Option<(String, FaceStyle)> {
    // Variable font axes: "Manrope[wght]"
    let stem = stem.split('[').next().unwrap_or(stem).trim();

    let (family, style) = match stem.split_once('-') {
        Some((family, style)) => (family.to_string(), style.to_lowercase()),
        None => {
            let mut family = Vec::new();
            let mut style = Vec::new();
            for word in stem.split([' ', '_']).filter(|w| !w.is_empty()) {
                let lower = word.to_lowercase();
                if !style.is_empty() || is_style_word(&lower) {
                    style.push(lower);
                } else {
                    family.push(word);
                }
            }
            (family.join(" "), style.concat())
        }
    };

    let style = style.replace(['_', ' '], "");
    let face_style = match style.as_str() {
        "" | "regular" | "book" | "roman" | "normal" => FaceStyle::Regular,
        "bold" => FaceStyle::Bold,
        "italic" | "oblique" => FaceStyle::Italic,
        "bolditalic" | "boldoblique" | "italicbold" => FaceStyle::BoldItalic,
        _ => return None,
    };

    let key = family_key(&family);
    if key.is_empty() {
        None
    } else {
        Some((key, face_style))
    }
}

fn is_style_word(word: &str) -> bool {
    matches!(
        word,
        "regular" | "bold" | "italic" | "oblique" | "book" | "roman" | "normal" | "light"
            | "medium" | "semibold" | "black" | "thin"
    )
}

/// Platform font directories plus `$MDLABEL_FONT_DIR`.
pub fn default_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(dir) = std::env::var(FONT_DIR_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    if let Ok(home) = std::env::var("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join("Library/Fonts"));
    }
    dirs.extend(
        [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/Library/Fonts",
            "/System/Library/Fonts",
            "C:\\Windows\\Fonts",
        ]
        .iter()
        .map(PathBuf::from),
    );
    dirs
}

/// # Font Book
///
/// Index of available font files with a lazily populated cache of parsed
/// faces. Shared between renderers behind an `Arc`.
pub struct FontBook {
    index: HashMap<String, HashMap<FaceStyle, PathBuf>>,
    loaded: Mutex<HashMap<PathBuf, FontArc>>,
}

impl FontBook {
    /// Index the platform font directories.
    pub fn system() -> Self {
        Self::with_dirs(&default_font_dirs())
    }

    /// Index the given directories (missing ones are skipped).
    pub fn with_dirs(dirs: &[PathBuf]) -> Self {
        let mut index: HashMap<String, HashMap<FaceStyle, PathBuf>> = HashMap::new();
        for dir in dirs {
            scan_dir(dir, 0, &mut index);
        }
        tracing::debug!(families = index.len(), "indexed font files");
        Self {
            index,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// A font book with no files: everything renders with the bitmap face.
    pub fn bitmap_only() -> Self {
        Self {
            index: HashMap::new(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a file for `family` was indexed.
    pub fn has_family(&self, family: &str) -> bool {
        self.index.contains_key(&family_key(family))
    }

    /// Resolve a face for `family`, walking the fallback chain.
    pub fn face(&self, family: &str, bold: bool, italic: bool) -> Face {
        let wanted = FaceStyle::new(bold, italic);
        let chain = std::iter::once(family).chain(FALLBACK_FAMILIES.iter().copied());

        for candidate in chain {
            let Some(styles) = self.index.get(&family_key(candidate)) else {
                continue;
            };
            let (path, found) = match styles.get(&wanted) {
                Some(path) => (path, wanted),
                None => match styles.get(&FaceStyle::Regular) {
                    Some(path) => (path, FaceStyle::Regular),
                    None => continue,
                },
            };
            match self.load(path) {
                Ok(font) => {
                    if candidate != family {
                        tracing::debug!(requested = family, using = candidate, "font fallback");
                    }
                    return Face {
                        kind: FaceKind::Outline(font),
                        synthetic_bold: bold && !found.is_bold(),
                        synthetic_italic: italic && !found.is_italic(),
                    };
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        Face::bitmap(bold, italic)
    }

    fn load(&self, path: &Path) -> Result<FontArc, MdLabelError> {
        let mut loaded = self
            .loaded
            .lock()
            .map_err(|_| MdLabelError::Font("font cache poisoned".to_string()))?;
        if let Some(font) = loaded.get(path) {
            return Ok(font.clone());
        }
        let bytes = std::fs::read(path)?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| {
            MdLabelError::Font(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        loaded.insert(path.to_path_buf(), font.clone());
        Ok(font)
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::system()
    }
}

fn scan_dir(dir: &Path, depth: usize, index: &mut HashMap<String, HashMap<FaceStyle, PathBuf>>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_dir(&path, depth + 1, index);
            continue;
        }
        let is_font = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"));
        if !is_font {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some((key, style)) = classify_stem(stem) {
            index.entry(key).or_default().entry(style).or_insert(path);
        }
    }
}

#[derive(Clone)]
enum FaceKind {
    Outline(FontArc),
    Bitmap,
}

/// A resolved font face with optional synthetic styling.
#[derive(Clone)]
pub struct Face {
    kind: FaceKind,
    synthetic_bold: bool,
    synthetic_italic: bool,
}

impl Face {
    /// The embedded bitmap face.
    pub fn bitmap(bold: bool, italic: bool) -> Self {
        Self {
            kind: FaceKind::Bitmap,
            synthetic_bold: bold,
            synthetic_italic: italic,
        }
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self.kind, FaceKind::Bitmap)
    }

    /// Extra pixels drawn to the right for synthetic bold.
    fn bold_offset(&self, px: f32) -> f32 {
        if self.synthetic_bold {
            (px / 24.0).round().max(1.0)
        } else {
            0.0
        }
    }

    fn italic_overhang(&self, px: f32) -> f32 {
        if self.synthetic_italic {
            (ITALIC_SHEAR * px).ceil()
        } else {
            0.0
        }
    }

    /// Width of `text` at `px` pixels, including synthetic styling.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        if text.is_empty() || px <= 0.0 {
            return 0.0;
        }
        let advance = match &self.kind {
            FaceKind::Outline(font) => {
                let scaled = font.as_scaled(px);
                let mut width = 0.0f32;
                let mut prev: Option<GlyphId> = None;
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    if let Some(p) = prev {
                        width += scaled.kern(p, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                width
            }
            FaceKind::Bitmap => text.chars().count() as f32 * bitmap_advance(px),
        };
        advance + self.bold_offset(px) + self.italic_overhang(px)
    }

    /// Draw `text` with its em box top at `top`. Returns the drawn width.
    pub fn draw(&self, surface: &mut Surface, text: &str, x: f32, top: f32, px: f32, color: Color) -> f32 {
        if text.is_empty() || px <= 0.0 {
            return 0.0;
        }
        let passes: &[f32] = if self.synthetic_bold {
            &[0.0, 1.0]
        } else {
            &[0.0]
        };
        let bold = self.bold_offset(px);
        for &pass in passes {
            let dx = pass * bold;
            match &self.kind {
                FaceKind::Outline(font) => self.draw_outline(font, surface, text, x + dx, top, px, color),
                FaceKind::Bitmap => self.draw_bitmap(surface, text, x + dx, top, px, color),
            }
        }
        self.measure(text, px)
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_outline(
        &self,
        font: &FontArc,
        surface: &mut Surface,
        text: &str,
        x: f32,
        top: f32,
        px: f32,
        color: Color,
    ) {
        let scaled = font.as_scaled(px);
        let baseline = top + scaled.ascent();
        let shear = if self.synthetic_italic { ITALIC_SHEAR } else { 0.0 };

        let mut caret = x;
        let mut prev: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(px, ab_glyph::point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let y = bounds.min.y + gy as f32;
                    let slant = shear * (baseline - y);
                    surface.blend_pixel(
                        (bounds.min.x + gx as f32 + slant).round() as i32,
                        y as i32,
                        color,
                        coverage,
                    );
                });
            }
        }
    }

    fn draw_bitmap(&self, surface: &mut Surface, text: &str, x: f32, top: f32, px: f32, color: Color) {
        let scale = px / BITMAP_CELL_H as f32;
        let advance = bitmap_advance(px);
        let shear = if self.synthetic_italic { ITALIC_SHEAR } else { 0.0 };

        for (i, ch) in text.chars().enumerate() {
            let cell_x = x + i as f32 * advance;
            let bits = bitmap_glyph(ch);
            for row in 0..BITMAP_CELL_H {
                let y0 = (top + row as f32 * scale).round() as i32;
                let y1 = (top + (row + 1) as f32 * scale).round() as i32;
                if y1 <= y0 {
                    continue;
                }
                let slant = shear * (BITMAP_CELL_H - row) as f32 * scale;
                for col in 0..BITMAP_CELL_W {
                    if !bits[row * BITMAP_CELL_W + col] {
                        continue;
                    }
                    let x0 = (cell_x + slant + col as f32 * scale).round() as i32;
                    let x1 = (cell_x + slant + (col + 1) as f32 * scale).round() as i32;
                    surface.fill_rect(Rect::new(x0, y0, (x1 - x0).max(1), y1 - y0), color);
                }
            }
        }
    }
}

#[inline]
fn bitmap_advance(px: f32) -> f32 {
    px * BITMAP_CELL_W as f32 / BITMAP_CELL_H as f32
}

/// Spleen 12×24 bitmap for `ch`; unknown characters get a box outline.
fn bitmap_glyph(ch: char) -> Vec<bool> {
    let mut bits = vec![false; BITMAP_CELL_W * BITMAP_CELL_H];
    if ch.is_whitespace() {
        return bits;
    }

    let mut spleen = PSF2Font::new(FONT_12X24).expect("Failed to load embedded Spleen 12x24");
    let utf8 = ch.to_string();
    match spleen.glyph_for_utf8(utf8.as_bytes()) {
        Some(glyph) => {
            for (row_y, row) in glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if row_y < BITMAP_CELL_H && col_x < BITMAP_CELL_W {
                        bits[row_y * BITMAP_CELL_W + col_x] = on;
                    }
                }
            }
        }
        None => draw_box(&mut bits),
    }
    bits
}

/// Box outline for characters missing from the bitmap font.
fn draw_box(bits: &mut [bool]) {
    for x in 0..BITMAP_CELL_W {
        bits[x] = true;
        bits[(BITMAP_CELL_H - 1) * BITMAP_CELL_W + x] = true;
    }
    for y in 0..BITMAP_CELL_H {
        bits[y * BITMAP_CELL_W] = true;
        bits[y * BITMAP_CELL_W + BITMAP_CELL_W - 1] = true;
    }
}
