//! # Artwork
//!
//! Artwork is referenced by an opaque string and resolved through an
//! [`ArtworkSource`]. The renderer bounds every resolution with a timeout and
//! treats failure and expiry the same way: the region keeps its placeholder
//! fill.
//!
//! ## Fit
//!
//! The image keeps its aspect ratio. A wider-than-region image is fitted to
//! the region height, anything else to the region width. The fitted size is
//! multiplied by the user scale, centered, then shifted by the millimeter
//! offsets:
//!
//! ```text
//! region 100×50, image 400×100 (aspect 4 > 2), scale 1.0
//!   → 200×50 at x = -50, y = 0 (clipped to the region)
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::surface::{Placement, Rect};
use crate::error::MdLabelError;
use crate::label::ArtworkPosition;
use crate::units::Dpi;

/// User agent for artwork downloads.
pub const USER_AGENT: &str = concat!("mdlabel/", env!("CARGO_PKG_VERSION"));

/// Decoded images kept by [`DefaultArtworkSource`].
const CACHE_CAPACITY: usize = 16;

/// Resolves an artwork reference to pixels.
///
/// Implementations must either return decoded pixels or fail; they must not
/// retry. The caller applies the timeout.
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    async fn load(&self, reference: &str) -> Result<Arc<RgbaImage>, MdLabelError>;
}

/// Loads `http(s)://` URLs, `data:` URLs (base64), `file://` URLs and plain
/// filesystem paths. Recently decoded images are cached by reference.
///
/// A [`remote_only`](Self::remote_only) source refuses `file://` URLs and
/// paths; the server uses one so requests cannot read the host's files.
pub struct DefaultArtworkSource {
    client: reqwest::Client,
    cache: RwLock<HashMap<String, Arc<RgbaImage>>>,
    allow_local: bool,
}

impl DefaultArtworkSource {
    pub fn new() -> Result<Self, MdLabelError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MdLabelError::Artwork(format!("HTTP client error: {}", e)))?;
        Ok(Self::with_client(client))
    }

    /// Only `http(s)://` and `data:` references.
    pub fn remote_only() -> Result<Self, MdLabelError> {
        Ok(Self::new()?.with_local_files(false))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
            allow_local: true,
        }
    }

    pub fn with_local_files(mut self, allow: bool) -> Self {
        self.allow_local = allow;
        self
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MdLabelError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MdLabelError::Artwork(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(MdLabelError::Artwork(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MdLabelError::Artwork(format!("Failed to read image data: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ArtworkSource for DefaultArtworkSource {
    async fn load(&self, reference: &str) -> Result<Arc<RgbaImage>, MdLabelError> {
        if let Some(image) = self.cache.read().await.get(reference) {
            return Ok(image.clone());
        }

        let bytes = if reference.starts_with("http://") || reference.starts_with("https://") {
            self.fetch(reference).await?
        } else if reference.starts_with("data:") {
            decode_data_url(reference)?
        } else if self.allow_local {
            let path = reference.strip_prefix("file://").unwrap_or(reference);
            read_file(Path::new(path)).await?
        } else {
            return Err(MdLabelError::Artwork(
                "Only http(s) and data: artwork URLs are accepted".to_string(),
            ));
        };

        let image = Arc::new(decode(&bytes)?);
        let mut cache = self.cache.write().await;
        if cache.len() >= CACHE_CAPACITY {
            cache.clear();
        }
        cache.insert(reference.to_string(), image.clone());
        Ok(image)
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, MdLabelError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| MdLabelError::Artwork(format!("Failed to read {}: {}", path.display(), e)))
}

/// Decode image bytes (any format the `image` crate recognizes) to RGBA.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, MdLabelError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| MdLabelError::Artwork(format!("Failed to decode image: {}", e)))?;
    Ok(image.to_rgba8())
}

/// Extract the payload of a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, MdLabelError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| MdLabelError::Artwork("not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| MdLabelError::Artwork("data URL has no payload".to_string()))?;
    if !meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        return Err(MdLabelError::Artwork(
            "only base64 data URLs are supported".to_string(),
        ));
    }
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact)
        .map_err(|e| MdLabelError::Artwork(format!("Invalid base64 in data URL: {}", e)))
}

/// Destination rectangle for an `image_width × image_height` image in
/// `region` with the user pan/zoom applied.
pub fn fit_artwork(
    region: Rect,
    image_width: u32,
    image_height: u32,
    position: ArtworkPosition,
    dpi: Dpi,
) -> Placement {
    let (w, h) = (region.width as f32, region.height as f32);
    let image_aspect = image_width as f32 / image_height.max(1) as f32;
    let region_aspect = w / h;

    let (draw_w, draw_h) = if image_aspect > region_aspect {
        let draw_h = h * position.scale;
        (draw_h * image_aspect, draw_h)
    } else {
        let draw_w = w * position.scale;
        (draw_w, draw_w / image_aspect)
    };

    Placement {
        x: region.x as f32 + (w - draw_w) / 2.0 + dpi.mm(position.x) as f32,
        y: region.y as f32 + (h - draw_h) / 2.0 + dpi.mm(position.y) as f32,
        width: draw_w,
        height: draw_h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([1, 2, 3, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    fn centered(scale: f32) -> ArtworkPosition {
        ArtworkPosition { x: 0.0, y: 0.0, scale }
    }

    #[test]
    fn test_fit_wide_image_to_height() {
        let p = fit_artwork(Rect::new(0, 0, 100, 50), 400, 100, centered(1.0), Dpi::PRINT);
        assert_eq!(p, Placement { x: -50.0, y: 0.0, width: 200.0, height: 50.0 });
    }

    #[test]
    fn test_fit_tall_image_to_width() {
        let p = fit_artwork(Rect::new(10, 10, 100, 100), 100, 200, centered(1.0), Dpi::PRINT);
        assert_eq!(p, Placement { x: 10.0, y: -40.0, width: 100.0, height: 200.0 });
    }

    #[test]
    fn test_fit_exact_aspect() {
        let region = Rect::new(35, 82, 437, 437);
        let p = fit_artwork(region, 1000, 1000, centered(1.0), Dpi::PRINT);
        assert_eq!(p, Placement { x: 35.0, y: 82.0, width: 437.0, height: 437.0 });
    }

    #[test]
    fn test_scale_and_offset() {
        let region = Rect::new(0, 0, 100, 100);
        let p = fit_artwork(region, 10, 10, ArtworkPosition { x: 1.0, y: -1.0, scale: 2.0 }, Dpi::PRINT);
        assert_eq!(p.width, 200.0);
        // centered at -50, shifted by ±12px (1mm at 300 DPI)
        assert_eq!(p.x, -50.0 + 12.0);
        assert_eq!(p.y, -50.0 - 12.0);
    }

    #[test]
    fn test_decode_data_url() {
        let png = png_bytes(3, 2);
        let url = format!("data:image/png;base64,{}", BASE64.encode(&png));
        assert_eq!(decode_data_url(&url).unwrap(), png);
        assert!(decode_data_url("data:text/plain,hello").is_err());
        assert!(decode_data_url("data:image/png;base64").is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"definitely not an image").is_err());
        assert_eq!(decode(&png_bytes(3, 2)).unwrap().dimensions(), (3, 2));
    }

    #[tokio::test]
    async fn test_load_data_url_and_cache() {
        let source = DefaultArtworkSource::new().unwrap();
        let url = format!("data:image/png;base64,{}", BASE64.encode(png_bytes(4, 4)));
        let a = source.load(&url).await.unwrap();
        let b = source.load(&url).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let source = DefaultArtworkSource::new().unwrap();
        assert!(source.load("/nonexistent/cover.jpg").await.is_err());
        assert!(source.load("file:///nonexistent/cover.jpg").await.is_err());
    }

    #[tokio::test]
    async fn test_remote_only_refuses_local_files() {
        let path = std::env::temp_dir().join(format!("mdlabel-cover-{}.png", std::process::id()));
        std::fs::write(&path, png_bytes(8, 8)).unwrap();
        let reference = path.to_string_lossy().into_owned();

        let local = DefaultArtworkSource::new().unwrap();
        assert_eq!(local.load(&reference).await.unwrap().dimensions(), (8, 8));

        let remote = DefaultArtworkSource::remote_only().unwrap();
        assert!(remote.load(&reference).await.is_err());
        assert!(remote.load(&format!("file://{}", reference)).await.is_err());

        let url = format!("data:image/png;base64,{}", BASE64.encode(png_bytes(2, 2)));
        assert!(remote.load(&url).await.is_ok());

        std::fs::remove_file(&path).unwrap();
    }
}
