//! Feedback relay handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::feedback::{FeedbackError, FeedbackRequest};

use super::super::state::AppState;
use super::client_ip;

fn status_for(error: &FeedbackError) -> StatusCode {
    match error {
        FeedbackError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        FeedbackError::Invalid(_) => StatusCode::BAD_REQUEST,
        FeedbackError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FeedbackError::NotConfigured | FeedbackError::Upstream(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn reject(error: FeedbackError) -> (StatusCode, Json<Value>) {
    (status_for(&error), Json(json!({ "error": error.to_string() })))
}

/// Handle POST /api/feedback - rate-limit, validate and forward.
///
/// The rate limit is checked before the body is looked at, so malformed
/// submissions count too.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let ip = client_ip(&headers);
    tracing::debug!(client_ip = %ip, "feedback received");

    state.feedback.admit(&ip).map_err(reject)?;

    let Json(request) = body.map_err(|e| reject(FeedbackError::Invalid(e.body_text())))?;
    state.feedback.deliver(&ip, &request).await.map_err(reject)?;

    Ok(Json(json!({ "success": true })))
}

/// Handle GET /api/feedback/status - whether a webhook is configured.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "configured": state.feedback.is_configured() }))
}
