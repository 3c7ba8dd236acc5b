//! # Physical Units
//!
//! Every measurement in a label template is expressed in millimeters. Pixel
//! positions are derived from a single conversion function, parameterized on
//! the DPI of the current render pass:
//!
//! ```text
//! pixels = round(mm × 0.0393701 × dpi)
//!
//! At 300 DPI:
//!   1mm  ≈ 11.8px  → 12px
//!   37mm ≈ 437.0px → 437px
//! ```
//!
//! Rounding happens only here, at the pixel boundary. Callers that need the
//! size of a region computed from several millimeter values (for example the
//! standard layout's artwork height) should do the arithmetic in millimeters
//! and convert once.

/// Inches per millimeter.
pub const MM_TO_INCH: f32 = 0.0393701;

/// Millimeters per PostScript point (1pt = 1/72 inch).
pub const MM_PER_POINT: f32 = 25.4 / 72.0;

/// # Render Resolution
///
/// Dots per inch for one render pass. The same layout is produced at every
/// resolution, only the pixel density differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Dpi(pub u32);

impl Dpi {
    /// Screen preview resolution.
    pub const SCREEN: Self = Self(72);

    /// Print export resolution.
    pub const PRINT: Self = Self(300);

    /// Convert millimeters to whole pixels at this resolution.
    ///
    /// ## Example
    ///
    /// ```
    /// use mdlabel::units::Dpi;
    ///
    /// assert_eq!(Dpi::PRINT.mm(43.0), 508);
    /// assert_eq!(Dpi::SCREEN.mm(3.0), 9);
    /// ```
    #[inline]
    pub fn mm(self, mm: f32) -> i32 {
        mm_to_pixels(mm, self.0)
    }

    /// Convert pixels back to millimeters (unrounded).
    #[inline]
    pub fn to_mm(self, px: f32) -> f32 {
        px / (MM_TO_INCH * self.0 as f32)
    }

    /// Crop/center mark stroke width: `max(2, dpi / 150)`.
    #[inline]
    pub fn mark_weight(self) -> f32 {
        (self.0 as f32 / 150.0).max(2.0)
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Self::SCREEN
    }
}

/// Convert millimeters to pixels, rounding halves upward
/// (`2.5 → 3`, `-2.5 → -2`).
#[inline]
pub fn mm_to_pixels(mm: f32, dpi: u32) -> i32 {
    (mm * MM_TO_INCH * dpi as f32 + 0.5).floor() as i32
}

/// Convert millimeters to PostScript points.
#[inline]
pub fn mm_to_points(mm: f32) -> f32 {
    mm / MM_PER_POINT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_to_pixels_print() {
        // 37 + 2×3 = 43mm, 53 + 2×3 = 59mm
        assert_eq!(mm_to_pixels(43.0, 300), 508);
        assert_eq!(mm_to_pixels(59.0, 300), 697);
        assert_eq!(mm_to_pixels(37.0, 300), 437);
    }

    #[test]
    fn test_mm_to_pixels_screen() {
        assert_eq!(mm_to_pixels(43.0, 72), 122);
        assert_eq!(mm_to_pixels(59.0, 72), 167);
        assert_eq!(mm_to_pixels(0.0, 72), 0);
    }

    #[test]
    fn test_negative_offsets_round_like_canvas() {
        assert_eq!(mm_to_pixels(-1.0, 300), -12);
        assert_eq!(mm_to_pixels(1.0, 300), 12);
    }

    #[test]
    fn test_round_trip_within_a_pixel() {
        let dpi = Dpi::PRINT;
        let px = dpi.mm(12.5);
        assert!((dpi.to_mm(px as f32) - 12.5).abs() < dpi.to_mm(1.0));
    }

    #[test]
    fn test_mark_weight_scales_with_dpi() {
        assert_eq!(Dpi::SCREEN.mark_weight(), 2.0);
        assert_eq!(Dpi::PRINT.mark_weight(), 2.0);
        assert_eq!(Dpi(600).mark_weight(), 4.0);
    }

    #[test]
    fn test_mm_to_points() {
        assert!((mm_to_points(25.4) - 72.0).abs() < 1e-3);
    }
}
