//! Server state and configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{CatalogClient, CatalogConfig};
use crate::error::MdLabelError;
use crate::feedback::FeedbackRelay;
use crate::render::{ArtworkSource, DefaultArtworkSource, FontBook, DEFAULT_ARTWORK_TIMEOUT};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Catalog credentials; sources without them are skipped
    pub catalog: CatalogConfig,
    /// Discord webhook for feedback; `None` disables the relay
    pub webhook_url: Option<String>,
    /// Extra font directories searched before the system ones
    pub font_dirs: Vec<PathBuf>,
    /// Upper bound on one artwork load
    pub artwork_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            catalog: CatalogConfig::default(),
            webhook_url: None,
            font_dirs: Vec::new(),
            artwork_timeout: DEFAULT_ARTWORK_TIMEOUT,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub fonts: Arc<FontBook>,
    pub artwork: Arc<dyn ArtworkSource>,
    pub catalog: CatalogClient,
    pub feedback: FeedbackRelay,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, MdLabelError> {
        let fonts = if config.font_dirs.is_empty() {
            FontBook::system()
        } else {
            let mut dirs = config.font_dirs.clone();
            dirs.extend(crate::render::font::default_font_dirs());
            FontBook::with_dirs(&dirs)
        };
        let artwork: Arc<dyn ArtworkSource> = Arc::new(DefaultArtworkSource::remote_only()?);
        let catalog = CatalogClient::new(config.catalog.clone())?;
        let feedback = FeedbackRelay::new(config.webhook_url.clone())?;

        Ok(Self::with_parts(config, Arc::new(fonts), artwork, catalog, feedback))
    }

    pub fn with_parts(
        config: ServerConfig,
        fonts: Arc<FontBook>,
        artwork: Arc<dyn ArtworkSource>,
        catalog: CatalogClient,
        feedback: FeedbackRelay,
    ) -> Self {
        Self {
            config,
            fonts,
            artwork,
            catalog,
            feedback,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_state() -> Arc<AppState> {
    use async_trait::async_trait;
    use image::RgbaImage;

    struct NoArtwork;

    #[async_trait]
    impl ArtworkSource for NoArtwork {
        async fn load(&self, reference: &str) -> Result<Arc<RgbaImage>, MdLabelError> {
            Err(MdLabelError::Artwork(format!("not available in tests: {}", reference)))
        }
    }

    Arc::new(AppState::with_parts(
        ServerConfig::default(),
        Arc::new(FontBook::bitmap_only()),
        Arc::new(NoArtwork),
        CatalogClient::with_client(reqwest::Client::new(), CatalogConfig::default()),
        FeedbackRelay::with_client(reqwest::Client::new(), None),
    ))
}
