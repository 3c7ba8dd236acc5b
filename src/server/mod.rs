//! # HTTP Server for Label Rendering
//!
//! JSON API for previewing and exporting labels, searching album catalogs
//! and relaying feedback.
//!
//! ## Usage
//!
//! ```bash
//! mdlabel serve --listen 0.0.0.0:8080
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | GET  | `/api/templates` | templates grouped by category |
//! | GET  | `/api/fonts` | selectable font families |
//! | POST | `/api/label/preview` | PNG |
//! | POST | `/api/label/export` | PDF attachment |
//! | GET  | `/api/search?artist=&album=[&source=]` | album hits |
//! | GET  | `/api/proxy/image?url=` | upstream image bytes |
//! | POST | `/api/feedback` | `{"success": true}` |
//! | GET  | `/api/feedback/status` | `{"configured": bool}` |

mod handlers;
mod state;

pub use handlers::client_ip;
pub use handlers::label::LabelRequest;
pub use state::{AppState, ServerConfig};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::MdLabelError;

/// Label requests may carry artwork inline as a `data:` URL.
const LABEL_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/templates", get(handlers::templates::list))
        .route("/api/fonts", get(handlers::templates::fonts))
        .route(
            "/api/label/preview",
            post(handlers::label::preview).layer(DefaultBodyLimit::max(LABEL_BODY_LIMIT)),
        )
        .route(
            "/api/label/export",
            post(handlers::label::export).layer(DefaultBodyLimit::max(LABEL_BODY_LIMIT)),
        )
        .route("/api/search", get(handlers::catalog::search))
        .route("/api/proxy/image", get(handlers::catalog::proxy_image))
        .route("/api/feedback", post(handlers::feedback::submit))
        .route("/api/feedback/status", get(handlers::feedback::status))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use mdlabel::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), mdlabel::error::MdLabelError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     ..ServerConfig::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), MdLabelError> {
    let listen_addr = config.listen_addr.clone();
    let state = Arc::new(AppState::new(config)?);

    let sources: Vec<&str> = state
        .catalog
        .config()
        .available()
        .into_iter()
        .map(|s| s.as_str())
        .collect();
    tracing::info!(
        listen = %listen_addr,
        catalogs = ?sources,
        feedback = state.feedback.is_configured(),
        "mdlabel HTTP server starting"
    );

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| MdLabelError::Server(format!("Failed to bind to {}: {}", listen_addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| MdLabelError::Server(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_builds() {
        let _app: Router = router(state::test_state());
    }
}
