//! HTTP handlers for the server.

pub mod catalog;
pub mod feedback;
pub mod label;
pub mod templates;

use axum::http::{HeaderMap, StatusCode};

use crate::error::MdLabelError;

/// Client address for rate limiting: the first `x-forwarded-for` entry,
/// else `x-real-ip`, else `"unknown"`.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or("unknown")
        .to_string()
}

/// Map a library error to an HTTP status. Bad input is the caller's fault,
/// everything else is ours.
pub fn error_status(error: &MdLabelError) -> StatusCode {
    match error {
        MdLabelError::Template(_) | MdLabelError::Surface(_) => StatusCode::BAD_REQUEST,
        MdLabelError::Catalog(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
