//! Error types shared by the archive readers, lookup clients and document store

use std::time::Duration;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Error types for catalog operations
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Lookup service returned {status}: {body}")]
    LookupStatus { status: u16, body: String },

    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("Archive unavailable: {0}")]
    ArchiveUnavailable(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}
