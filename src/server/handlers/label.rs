//! Label preview and PDF export handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::MdLabelError;
use crate::export;
use crate::label::{LabelData, RenderOptions, RenderSnapshot};
use crate::render::LabelRenderer;
use crate::template::registry;

use super::super::state::AppState;
use super::error_status;

/// Highest DPI a request may ask for.
pub const MAX_DPI: u32 = 1200;

/// Longest side, bleed included, of a template supplied in a request.
pub const MAX_TEMPLATE_MM: f32 = 500.0;

/// Body of the preview and export endpoints.
///
/// `templateId`, when present, selects a built-in template and overrides
/// `options.template`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelRequest {
    pub data: LabelData,
    pub template_id: Option<String>,
    pub options: RenderOptions,
}

impl LabelRequest {
    pub fn into_snapshot(self) -> Result<RenderSnapshot, MdLabelError> {
        let mut options = self.options;
        if let Some(id) = self.template_id {
            options.template = registry::by_id(&id)
                .cloned()
                .ok_or_else(|| MdLabelError::Template(format!("Unknown template: '{}'", id)))?;
        }
        options.template.validate()?;
        let t = &options.template;
        if t.total_width_mm() > MAX_TEMPLATE_MM || t.total_height_mm() > MAX_TEMPLATE_MM {
            return Err(MdLabelError::Template(format!(
                "template '{}' is {}×{}mm, larger than {}mm",
                t.id,
                t.total_width_mm(),
                t.total_height_mm(),
                MAX_TEMPLATE_MM
            )));
        }
        if options.dpi.0 == 0 || options.dpi.0 > MAX_DPI {
            return Err(MdLabelError::Surface(format!(
                "DPI must be between 1 and {}, got {}",
                MAX_DPI, options.dpi.0
            )));
        }
        Ok(RenderSnapshot::new(self.data, options))
    }
}

fn reject(e: MdLabelError) -> (StatusCode, String) {
    (error_status(&e), e.to_string())
}

fn renderer_for(state: &AppState) -> LabelRenderer {
    LabelRenderer::new(state.fonts.clone(), state.artwork.clone())
        .with_artwork_timeout(state.config.artwork_timeout)
}

/// Handle POST /api/label/preview - render the label as PNG.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LabelRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let snapshot = request.into_snapshot().map_err(reject)?;
    let mut renderer = renderer_for(&state);
    let png = export::render_png(&mut renderer, &snapshot)
        .await
        .map_err(reject)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// Handle POST /api/label/export - render at print resolution and return
/// the PDF as an attachment.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LabelRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let snapshot = request.into_snapshot().map_err(reject)?;
    let mut renderer = renderer_for(&state);
    let pdf = export::render_pdf(&mut renderer, &snapshot, Utc::now().date_naive())
        .await
        .map_err(reject)?;

    let disposition = format!("attachment; filename=\"{}\"", pdf.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf.bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::state::test_state;
    use crate::units::Dpi;

    fn request(json: &str) -> LabelRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_template_id_selects_builtin() {
        let snapshot = request(r#"{"templateId": "disc-surface"}"#)
            .into_snapshot()
            .unwrap();
        assert_eq!(snapshot.options.template.id, "disc-surface");
        assert_eq!(snapshot.options.dpi, Dpi::SCREEN);
    }

    #[test]
    fn test_unknown_template_is_rejected() {
        let err = request(r#"{"templateId": "eight-track"}"#)
            .into_snapshot()
            .unwrap_err();
        assert_eq!(error_status(&err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_dpi_is_bounded() {
        assert!(request(r#"{"options": {"dpi": 0}}"#).into_snapshot().is_err());
        assert!(request(r#"{"options": {"dpi": 4800}}"#).into_snapshot().is_err());
        assert!(request(r#"{"options": {"dpi": 300}}"#).into_snapshot().is_ok());
    }

    #[test]
    fn test_request_template_is_bounded() {
        let huge = request(
            r#"{"options": {"template": {"id": "huge", "name": "", "displayName": "",
                "category": "", "widthMM": 1e6, "heightMM": 53, "bleedMM": 3,
                "hasBanner": false}}}"#,
        );
        let err = huge.into_snapshot().unwrap_err();
        assert_eq!(error_status(&err), StatusCode::BAD_REQUEST);

        let negative = request(
            r#"{"options": {"template": {"id": "neg", "name": "", "displayName": "",
                "category": "", "widthMM": -5, "heightMM": 53, "bleedMM": 3,
                "hasBanner": false}}}"#,
        );
        assert!(negative.into_snapshot().is_err());

        let poster = request(
            r#"{"options": {"dpi": 300, "template": {"id": "poster", "name": "", "displayName": "",
                "category": "", "widthMM": 300, "heightMM": 420, "bleedMM": 3,
                "hasBanner": false}}}"#,
        );
        assert!(poster.into_snapshot().is_ok());
    }

    #[tokio::test]
    async fn test_oversized_template_preview_is_rejected() {
        let req = request(
            r#"{"options": {"template": {"id": "huge", "name": "", "displayName": "",
                "category": "", "widthMM": 1e6, "heightMM": 1e6, "bleedMM": 3,
                "hasBanner": false}}}"#,
        );
        let (status, _) = preview(State(test_state()), Json(req)).await.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_preview_returns_png() {
        let req = request(
            r#"{"data": {"title": "Discovery", "artist": "Daft Punk", "year": "2001"},
                "templateId": "jewel-case"}"#,
        );
        let response = preview(State(test_state()), Json(req))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn test_export_is_a_pdf_attachment() {
        let req = request(r#"{"data": {"title": "Discovery", "artist": "Daft Punk"}}"#);
        let response = export(State(test_state()), Json(req))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap();
        assert!(disposition.starts_with("attachment; filename=\"daft_punk-discovery-jewel-case-"));
        assert!(disposition.ends_with(".pdf\""));
    }

    #[tokio::test]
    async fn test_preview_does_not_read_host_files() {
        use crate::catalog::{CatalogClient, CatalogConfig};
        use crate::feedback::FeedbackRelay;
        use crate::render::surface::PLACEHOLDER;
        use crate::render::{layout, DefaultArtworkSource, FontBook};
        use crate::server::state::{AppState, ServerConfig};
        use image::{ImageFormat, Rgba, RgbaImage};

        let path = std::env::temp_dir().join(format!("mdlabel-host-{}.png", std::process::id()));
        RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let state = Arc::new(AppState::with_parts(
            ServerConfig::default(),
            Arc::new(FontBook::bitmap_only()),
            Arc::new(DefaultArtworkSource::remote_only().unwrap()),
            CatalogClient::with_client(reqwest::Client::new(), CatalogConfig::default()),
            FeedbackRelay::with_client(reqwest::Client::new(), None),
        ));

        let mut req = LabelRequest::default();
        req.data.artwork_url = Some(path.to_string_lossy().into_owned());
        let snapshot = req.clone().into_snapshot().unwrap();

        let response = preview(State(state), Json(req)).await.unwrap().into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let png = image::load_from_memory(&body).unwrap().to_rgb8();

        let options = &snapshot.options;
        let region = layout::plan(&options.template, &snapshot.data, options).artwork;
        let center = png.get_pixel(
            (region.x + region.width / 2) as u32,
            (region.y + region.height / 2) as u32,
        );
        assert_eq!(*center, PLACEHOLDER);

        std::fs::remove_file(&path).unwrap();
    }
}
