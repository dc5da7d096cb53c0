//! Request handlers, independent of the HTTP framework

use std::path::Path;
use tracing::debug;

use super::models::HealthResponse;
use crate::catalog::{document, CatalogEntry};
use crate::error::Result;

/// Health check
pub async fn health_check() -> HealthResponse {
    HealthResponse {
        status: "healthy".to_string(),
        service: "flix-catalog".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Normalized entries of the catalog document; a missing document is empty
pub async fn list_items(document_path: &Path) -> Result<Vec<CatalogEntry>> {
    if !document_path.exists() {
        debug!("No catalog document at {}", document_path.display());
        return Ok(Vec::new());
    }
    document::read_document(document_path).await
}
