//! Album search and image proxy handlers.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::{AlbumHit, CatalogSource};

use super::super::state::AppState;
use super::error_status;

/// Cache policy for proxied artwork. Catalog image URLs are content-addressed.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub artist: Option<String>,
    pub album: Option<String>,
    /// One catalog; all available catalogs when absent
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub results: Vec<AlbumHit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Handle GET /api/search - normalized album hits.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, (StatusCode, String)> {
    let (Some(artist), Some(album)) = (required(params.artist), required(params.album)) else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Both artist and album are required".to_string(),
        ));
    };

    let results = match params.source.as_deref() {
        None | Some("") | Some("all") => state.catalog.search_all(&artist, &album).await,
        Some(name) => {
            let source: CatalogSource = name
                .parse()
                .map_err(|e: crate::error::MdLabelError| (StatusCode::BAD_REQUEST, e.to_string()))?;
            if !state.catalog.config().is_available(source) {
                return Err((
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("{} is not configured", source),
                ));
            }
            state
                .catalog
                .search(source, &artist, &album)
                .await
                .map_err(|e| (error_status(&e), e.to_string()))?
        }
    };

    Ok(Json(SearchResults { results }))
}

/// Handle GET /api/proxy/image - pass an upstream image through so the
/// browser can draw it without CORS restrictions.
pub async fn proxy_image(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProxyParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Some(url) = required(params.url) else {
        return Err((StatusCode::BAD_REQUEST, "Missing URL parameter".to_string()));
    };
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Only http(s) URLs can be proxied".to_string(),
        ));
    }

    let image = state
        .catalog
        .fetch_image_passthrough(&url)
        .await
        .map_err(|e| {
            tracing::warn!(url = %url, error = %e, "image proxy failed");
            (StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
        ],
        image.bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::state::test_state;

    #[tokio::test]
    async fn test_search_requires_both_fields() {
        let params = SearchParams {
            artist: Some("Radiohead".into()),
            album: Some("  ".into()),
            source: None,
        };
        let (status, _) = search(State(test_state()), Query(params)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_source_is_bad_request() {
        let params = SearchParams {
            artist: Some("Radiohead".into()),
            album: Some("Kid A".into()),
            source: Some("napster".into()),
        };
        let (status, _) = search(State(test_state()), Query(params)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unconfigured_source_is_unavailable() {
        let params = SearchParams {
            artist: Some("Radiohead".into()),
            album: Some("Kid A".into()),
            source: Some("spotify".into()),
        };
        let (status, message) = search(State(test_state()), Query(params)).await.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(message, "spotify is not configured");
    }

    #[tokio::test]
    async fn test_proxy_requires_http_url() {
        let missing = proxy_image(State(test_state()), Query(ProxyParams::default())).await;
        assert_eq!(missing.err().map(|(s, _)| s), Some(StatusCode::BAD_REQUEST));

        let params = ProxyParams {
            url: Some("file:///etc/hosts".into()),
        };
        let local = proxy_image(State(test_state()), Query(params)).await;
        assert_eq!(local.err().map(|(s, _)| s), Some(StatusCode::BAD_REQUEST));
    }
}
