//! # Album Catalog
//!
//! Looks up album artwork in public music catalogs and normalizes every hit
//! to one [`AlbumHit`] shape.
//!
//! | Source  | Credentials | Year | Artwork |
//! |---------|-------------|------|---------|
//! | Deezer  | none | release date | `cover_xl` (1000px) |
//! | Spotify | client id + secret | release date | largest image (640px) |
//! | Last.fm | API key | none | `extralarge` (300px) |
//! | Discogs | key (+ secret) | year | `cover_image` |
//! | iTunes  | none | release date | 3000px rendition |
//!
//! Every source filters its raw results through the same fuzzy
//! [`AlbumQuery`] match, so a search for "Radiohead / Kid A" does not return
//! unrelated albums that merely share a word.
//!
//! A source without credentials is unavailable: [`CatalogClient::search`]
//! fails for it and [`CatalogClient::search_all`] skips it.

pub mod deezer;
pub mod discogs;
pub mod itunes;
pub mod lastfm;
pub mod matching;
pub mod spotify;
pub mod token;

pub use discogs::DiscogsCredentials;
pub use matching::AlbumQuery;
pub use spotify::SpotifyCredentials;
pub use token::TokenCache;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::MdLabelError;
use crate::render::artwork::USER_AGENT;

/// Content type reported when an upstream image response carries none.
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Which catalog a hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Deezer,
    Spotify,
    LastFm,
    Discogs,
    Itunes,
}

impl CatalogSource {
    /// Every source, in the order `search_all` reports them.
    pub const ALL: [CatalogSource; 5] = [
        CatalogSource::Deezer,
        CatalogSource::Spotify,
        CatalogSource::LastFm,
        CatalogSource::Discogs,
        CatalogSource::Itunes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CatalogSource::Deezer => "deezer",
            CatalogSource::Spotify => "spotify",
            CatalogSource::LastFm => "lastfm",
            CatalogSource::Discogs => "discogs",
            CatalogSource::Itunes => "itunes",
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogSource {
    type Err = MdLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MdLabelError::Catalog(format!("Unknown catalog source: '{}'", s)))
    }
}

/// One album found in a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumHit {
    /// `"{source}-{source id}"`, unique across sources.
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Four-digit year, or empty when the catalog does not say.
    pub year: String,
    /// `"Album"` or `"Release"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub thumbnail_url: Option<String>,
    pub artwork_url: Option<String>,
    pub source: CatalogSource,
}

/// Catalog credentials. Sources left as `None` are unavailable.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub spotify: Option<SpotifyCredentials>,
    pub discogs: Option<DiscogsCredentials>,
    pub lastfm_api_key: Option<String>,
}

impl CatalogConfig {
    pub fn is_available(&self, source: CatalogSource) -> bool {
        match source {
            CatalogSource::Deezer | CatalogSource::Itunes => true,
            CatalogSource::Spotify => self.spotify.is_some(),
            CatalogSource::LastFm => self.lastfm_api_key.is_some(),
            CatalogSource::Discogs => self.discogs.is_some(),
        }
    }

    pub fn available(&self) -> Vec<CatalogSource> {
        CatalogSource::ALL
            .into_iter()
            .filter(|source| self.is_available(*source))
            .collect()
    }
}

/// Upstream image bytes passed through unchanged.
#[derive(Debug, Clone)]
pub struct ImagePassthrough {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Searches the configured catalogs. Holds the Spotify token cache, so one
/// client should be shared for the lifetime of the process.
pub struct CatalogClient {
    http: reqwest::Client,
    config: CatalogConfig,
    spotify_tokens: TokenCache,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Result<Self, MdLabelError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MdLabelError::Catalog(format!("HTTP client error: {}", e)))?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: reqwest::Client, config: CatalogConfig) -> Self {
        Self {
            http,
            config,
            spotify_tokens: TokenCache::new(),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Hits from a single catalog.
    #[tracing::instrument(skip(self))]
    pub async fn search(
        &self,
        source: CatalogSource,
        artist: &str,
        album: &str,
    ) -> Result<Vec<AlbumHit>, MdLabelError> {
        if artist.trim().is_empty() || album.trim().is_empty() {
            return Err(MdLabelError::Catalog(
                "Both artist and album are required".to_string(),
            ));
        }

        let query = AlbumQuery::new(artist, album);
        let unavailable =
            || MdLabelError::Catalog(format!("{} is not configured", source.as_str()));

        let hits = match source {
            CatalogSource::Deezer => deezer::search(&self.http, &query).await?,
            CatalogSource::Itunes => itunes::search(&self.http, &query).await?,
            CatalogSource::Spotify => {
                let credentials = self.config.spotify.as_ref().ok_or_else(unavailable)?;
                spotify::search(&self.http, credentials, &self.spotify_tokens, &query).await?
            }
            CatalogSource::LastFm => {
                let key = self.config.lastfm_api_key.as_deref().ok_or_else(unavailable)?;
                lastfm::search(&self.http, key, &query).await?
            }
            CatalogSource::Discogs => {
                let credentials = self.config.discogs.as_ref().ok_or_else(unavailable)?;
                discogs::search(&self.http, credentials, &query).await?
            }
        };

        tracing::debug!(count = hits.len(), "catalog search complete");
        Ok(hits)
    }

    /// Hits from every available catalog, queried concurrently and
    /// concatenated in [`CatalogSource::ALL`] order. Failing catalogs are
    /// logged and skipped.
    pub async fn search_all(&self, artist: &str, album: &str) -> Vec<AlbumHit> {
        let run = move |source: CatalogSource| async move {
            if !self.config.is_available(source) {
                return (source, Ok(Vec::new()));
            }
            (source, self.search(source, artist, album).await)
        };

        let results = tokio::join!(
            run(CatalogSource::Deezer),
            run(CatalogSource::Spotify),
            run(CatalogSource::LastFm),
            run(CatalogSource::Discogs),
            run(CatalogSource::Itunes),
        );

        let mut hits = Vec::new();
        for (source, result) in [results.0, results.1, results.2, results.3, results.4] {
            match result {
                Ok(found) => hits.extend(found),
                Err(e) => tracing::warn!(source = %source, error = %e, "catalog search failed"),
            }
        }
        hits
    }

    /// Fetch an image from an `http(s)` URL and return its bytes with the
    /// upstream content type (`image/jpeg` when absent).
    pub async fn fetch_image_passthrough(&self, url: &str) -> Result<ImagePassthrough, MdLabelError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(MdLabelError::Catalog(format!(
                "Only http(s) image URLs can be proxied: '{}'",
                url
            )));
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MdLabelError::Catalog(format!("Image request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(MdLabelError::Catalog(format!(
                "Image request returned HTTP {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_IMAGE_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MdLabelError::Catalog(format!("Image read failed: {}", e)))?;

        Ok(ImagePassthrough {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

/// First candidate that is present and not empty.
pub(crate) fn first_nonempty<const N: usize>(candidates: [&Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .cloned()
}

/// Leading four characters of a release date (`"1997-05-21"` → `"1997"`).
pub(crate) fn year_prefix(date: Option<&str>) -> String {
    date.map(|d| d.chars().take(4).collect::<String>())
        .unwrap_or_default()
}
