//! # Error Types
//!
//! This module defines error types used throughout the mdlabel library.

use thiserror::Error;

/// Main error type for mdlabel operations
#[derive(Debug, Error)]
pub enum MdLabelError {
    /// Invalid template geometry or unknown template id
    #[error("Template error: {0}")]
    Template(String),

    /// Drawing surface could not be configured
    #[error("Surface error: {0}")]
    Surface(String),

    /// Artwork could not be resolved or decoded
    #[error("Artwork error: {0}")]
    Artwork(String),

    /// Font discovery or loading failure
    #[error("Font error: {0}")]
    Font(String),

    /// PNG or PDF serialization failure
    #[error("Export error: {0}")]
    Export(String),

    /// Album catalog lookup failure
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// HTTP server failure (bind, serve)
    #[error("Server error: {0}")]
    Server(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
