//! Metadata resolution against a remote catalog service
//!
//! The lookup service is abstracted behind [`CatalogLookup`] so the resolver's
//! fallback chain can run against TMDB in production and a mock in tests.

pub mod cache;
pub mod resolver;
pub mod tmdb;

pub use cache::LookupCacheManager;
pub use resolver::{MetadataResolver, QueryStrategy};
pub use tmdb::TmdbClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of a metadata lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Full poster image URL
    pub poster_url: Option<String>,
    /// Synopsis
    pub overview: Option<String>,
    /// Average rating, 0-10
    pub rating: Option<f64>,
}

impl MetadataRecord {
    /// The record produced when every strategy came back empty
    pub fn unmatched() -> Self {
        Self {
            poster_url: None,
            overview: None,
            rating: Some(0.0),
        }
    }

    /// Whether this record carries anything from the catalog service
    pub fn is_match(&self) -> bool {
        self.poster_url.is_some() || self.overview.is_some() || self.rating.is_some_and(|r| r > 0.0)
    }
}

/// Keyword search request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query: String,
    pub year: Option<String>,
    pub include_adult: bool,
    pub language: String,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, year: Option<String>) -> Self {
        Self {
            query: query.into(),
            year,
            include_adult: false,
            language: "en-US".to_string(),
        }
    }
}

/// One ranked search result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogCandidate {
    #[serde(alias = "name")]
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
}

/// Trait for catalog lookup services
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Keyword search returning candidates in ranked order
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CatalogCandidate>>;

    /// Absolute poster URL for a candidate's poster path
    fn poster_url(&self, poster_path: &str) -> String;

    /// Service name for logs
    fn name(&self) -> &str;
}
