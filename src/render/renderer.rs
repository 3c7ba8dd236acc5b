//! # Label Renderer
//!
//! Executes a [`DrawPlan`](super::layout::DrawPlan) on an owned surface.
//!
//! ## Render order
//!
//! ```text
//! configure surface → background → banner → artwork (await) → text
//!   → layout rules → trim line → safe zone → crop marks → center marks
//! ```
//!
//! The artwork load is the only suspension point. It is bounded by a timeout
//! (10 seconds unless configured otherwise); failure or expiry leaves the
//! placeholder fill and the render still completes. Only invalid
//! configuration (non-positive template dimensions or DPI) is an error.

use std::sync::Arc;
use std::time::Duration;

use super::artwork::{fit_artwork, ArtworkSource};
use super::font::FontBook;
use super::guides;
use super::layout::{self, BannerPlan, DrawPlan};
use super::surface::{Rect, Surface, BLACK, PLACEHOLDER, WHITE};
use super::text::truncate_to_width;
use crate::error::MdLabelError;
use crate::label::{LabelData, RenderOptions, RenderSnapshot};
use crate::template::Template;
use crate::units::Dpi;

/// Largest surface `configure_surface` allocates (a 120mm booklet with bleed
/// at 1200 DPI is about 35 million).
pub const MAX_SURFACE_PIXELS: u64 = 100_000_000;

/// Default bound on artwork resolution.
pub const DEFAULT_ARTWORK_TIMEOUT: Duration = Duration::from_secs(10);

/// Fraction of the scaled artwork that may be clipped away before it is
/// reported.
const CLIP_REPORT_THRESHOLD: f64 = 0.5;

/// # Label Renderer
///
/// Owns one pixel surface. Rendering takes `&mut self`, so renders on the
/// same renderer never overlap.
///
/// ## Example
///
/// ```no_run
/// use std::sync::Arc;
/// use mdlabel::label::{LabelData, RenderOptions};
/// use mdlabel::render::{DefaultArtworkSource, FontBook, LabelRenderer};
///
/// # async fn example() -> Result<(), mdlabel::MdLabelError> {
/// let mut renderer = LabelRenderer::new(
///     Arc::new(FontBook::system()),
///     Arc::new(DefaultArtworkSource::new()?),
/// );
/// let data = LabelData::new("OK Computer", "Radiohead", "1997");
/// renderer.render(&data, &RenderOptions::default()).await?;
/// std::fs::write("label.png", renderer.to_png()?)?;
/// # Ok(())
/// # }
/// ```
pub struct LabelRenderer {
    surface: Surface,
    fonts: Arc<FontBook>,
    artwork: Arc<dyn ArtworkSource>,
    artwork_timeout: Duration,
}

impl LabelRenderer {
    pub fn new(fonts: Arc<FontBook>, artwork: Arc<dyn ArtworkSource>) -> Self {
        Self {
            surface: Surface::new(0, 0),
            fonts,
            artwork,
            artwork_timeout: DEFAULT_ARTWORK_TIMEOUT,
        }
    }

    /// Override the artwork resolution timeout.
    pub fn with_artwork_timeout(mut self, timeout: Duration) -> Self {
        self.artwork_timeout = timeout;
        self
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn into_surface(self) -> Surface {
        self.surface
    }

    /// Serialize the current surface as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, MdLabelError> {
        self.surface.to_png()
    }

    /// Size the surface for `template` at `dpi`, fill it white and reset the
    /// quality hints.
    pub fn configure_surface(&mut self, template: &Template, dpi: Dpi) -> Result<(), MdLabelError> {
        template.validate()?;
        if dpi.0 == 0 {
            return Err(MdLabelError::Surface("DPI must be positive".to_string()));
        }

        let width = dpi.mm(template.total_width_mm());
        let height = dpi.mm(template.total_height_mm());
        if width <= 0 || height <= 0 {
            return Err(MdLabelError::Surface(format!(
                "template '{}' is {}×{}px at {} DPI",
                template.id, width, height, dpi.0
            )));
        }

        let pixels = width as u64 * height as u64;
        if pixels > MAX_SURFACE_PIXELS {
            return Err(MdLabelError::Surface(format!(
                "template '{}' is {}×{}px at {} DPI, over the {} pixel limit",
                template.id, width, height, dpi.0, MAX_SURFACE_PIXELS
            )));
        }

        self.surface.reset(width as u32, height as u32);
        Ok(())
    }

    /// Render a snapshot.
    pub async fn render_snapshot(&mut self, snapshot: &RenderSnapshot) -> Result<(), MdLabelError> {
        self.render(&snapshot.data, &snapshot.options).await
    }

    /// Paint `data` with `options`, fully replacing the surface contents.
    #[tracing::instrument(skip_all, fields(template = %options.template.id, dpi = options.dpi.0))]
    pub async fn render(&mut self, data: &LabelData, options: &RenderOptions) -> Result<(), MdLabelError> {
        self.configure_surface(&options.template, options.dpi)?;
        let plan = layout::plan(&options.template, data, options);

        self.surface.fill(plan.background);

        if let Some(banner) = &plan.banner {
            self.draw_banner(banner, &options.font_family);
        }

        self.draw_artwork(data.artwork(), plan.artwork, options).await;

        self.draw_text(&plan, &options.font_family);

        for rule in &plan.rules {
            self.surface.hline(rule.x0, rule.x1, rule.y, rule.width, rule.color, None);
        }

        guides::draw_guides(&mut self.surface, plan.printable, plan.layout, options);
        Ok(())
    }

    fn draw_banner(&mut self, banner: &BannerPlan, family: &str) {
        self.surface.fill_rect(banner.rect, WHITE);
        self.surface.fill_triangle(banner.arrow_points, BLACK);

        let face = self.fonts.face(family, true, false);
        let fitted = truncate_to_width(&face, banner.text, banner.font_px, banner.text_max_width);
        if fitted.truncated {
            tracing::debug!(text = %fitted.text, "banner text truncated");
        }
        face.draw(&mut self.surface, &fitted.text, banner.text_x, banner.text_top, banner.font_px, BLACK);
    }

    async fn draw_artwork(&mut self, reference: Option<&str>, region: Rect, options: &RenderOptions) {
        self.surface.fill_rect(region, PLACEHOLDER);
        let Some(reference) = reference else {
            return;
        };
        if region.is_empty() {
            return;
        }

        let image = match tokio::time::timeout(self.artwork_timeout, self.artwork.load(reference)).await {
            Ok(Ok(image)) => image,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "artwork unavailable, using placeholder");
                return;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.artwork_timeout.as_millis() as u64,
                    "artwork load timed out, using placeholder"
                );
                return;
            }
        };

        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            tracing::warn!("artwork has no pixels, using placeholder");
            return;
        }

        let placement = fit_artwork(region, w, h, options.artwork_position, options.dpi);
        let visible = self.surface.draw_image_clipped(&image, placement, region);

        let drawn_area = placement.width as f64 * placement.height as f64;
        if drawn_area > 0.0 && (visible.area() as f64) < drawn_area * (1.0 - CLIP_REPORT_THRESHOLD) {
            tracing::debug!(
                visible = visible.area(),
                scaled = drawn_area,
                "most of the artwork is clipped by its region"
            );
        }
    }

    fn draw_text(&mut self, plan: &DrawPlan, family: &str) {
        self.surface.fill_rect(plan.text_region, plan.text_background);

        for line in &plan.lines {
            if line.text.is_empty() || line.px <= 0.0 {
                continue;
            }
            let face = self.fonts.face(family, line.bold, line.italic);
            let fitted = truncate_to_width(&face, &line.text, line.px, line.max_width);
            if fitted.truncated {
                tracing::debug!(
                    role = ?line.role,
                    original = %line.text,
                    shown = %fitted.text,
                    "text truncated to fit"
                );
            }
            face.draw(&mut self.surface, &fitted.text, line.x, line.y, line.px, plan.text_color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::artwork::ArtworkSource;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};

    struct Solid(Rgba<u8>, u32, u32);

    #[async_trait]
    impl ArtworkSource for Solid {
        async fn load(&self, _reference: &str) -> Result<Arc<RgbaImage>, MdLabelError> {
            Ok(Arc::new(RgbaImage::from_pixel(self.1, self.2, self.0)))
        }
    }

    struct Broken;

    #[async_trait]
    impl ArtworkSource for Broken {
        async fn load(&self, reference: &str) -> Result<Arc<RgbaImage>, MdLabelError> {
            Err(MdLabelError::Artwork(format!("cannot load {}", reference)))
        }
    }

    fn renderer(source: Arc<dyn ArtworkSource>) -> LabelRenderer {
        LabelRenderer::new(Arc::new(FontBook::bitmap_only()), source)
    }

    #[test]
    fn test_configure_rejects_bad_geometry() {
        let mut r = renderer(Arc::new(Broken));
        let bad = Template::new("bad", 0.0, 53.0, 3.0, true);
        assert!(matches!(
            r.configure_surface(&bad, Dpi::PRINT),
            Err(MdLabelError::Template(_))
        ));
        let ok = Template::new("ok", 37.0, 53.0, 3.0, true);
        assert!(matches!(r.configure_surface(&ok, Dpi(0)), Err(MdLabelError::Surface(_))));
        assert!(r.configure_surface(&ok, Dpi::PRINT).is_ok());
    }

    #[test]
    fn test_configure_rejects_oversized_surface() {
        let mut r = renderer(Arc::new(Broken));
        let booklet = Template::new("cd-booklet", 120.0, 120.0, 3.0, false);
        assert!(r.configure_surface(&booklet, Dpi(1200)).is_ok());

        for (w, h) in [(1e9, 1e9), (1e6, 53.0), (2000.0, 2000.0)] {
            let huge = Template::new("huge", w, h, 3.0, true);
            assert!(matches!(
                r.configure_surface(&huge, Dpi::PRINT),
                Err(MdLabelError::Surface(_))
            ));
        }
        // the previous surface is kept
        assert_eq!(r.surface().width(), Dpi(1200).mm(126.0) as u32);
    }

    #[tokio::test]
    async fn test_render_oversized_template_is_an_error() {
        let mut r = renderer(Arc::new(Broken));
        let options = RenderOptions::for_template(Template::new("huge", 1e6, 1e6, 3.0, false));
        let result = r.render(&LabelData::default(), &options).await;
        assert!(matches!(result, Err(MdLabelError::Surface(_))));
    }

    #[tokio::test]
    async fn test_render_fails_only_on_configuration() {
        let mut r = renderer(Arc::new(Broken));
        let mut opts = RenderOptions::default();
        opts.template.height_mm = -1.0;
        assert!(r.render(&LabelData::default(), &opts).await.is_err());
    }

    #[tokio::test]
    async fn test_broken_artwork_leaves_placeholder() {
        let mut r = renderer(Arc::new(Broken));
        let opts = RenderOptions::default();
        let data = LabelData::new("a", "b", "c").with_artwork("https://example.invalid/x.jpg");
        r.render(&data, &opts).await.unwrap();

        let plan = layout::plan(&opts.template, &data, &opts);
        let c = plan.artwork;
        assert_eq!(r.surface().pixel(c.x + c.width / 2, c.y + c.height / 2), Some(PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_artwork_drawn_inside_region_only() {
        let red = Rgba([250, 0, 0, 255]);
        let mut r = renderer(Arc::new(Solid(red, 10, 10)));
        let opts = RenderOptions {
            show_trim_line: false,
            show_safe_zone: false,
            ..RenderOptions::default()
        };
        let data = LabelData::default().with_artwork("solid");
        r.render(&data, &opts).await.unwrap();

        let plan = layout::plan(&opts.template, &data, &opts);
        let region = plan.artwork;
        let banner = plan.banner.unwrap().rect;
        assert_eq!(r.surface().pixel(region.x + 1, region.y + 1), Some(image::Rgb([250, 0, 0])));
        // Over-scaled artwork must not leak into the banner
        assert_eq!(r.surface().pixel(banner.x + banner.width - 2, banner.y + 1), Some(WHITE));
    }
}
