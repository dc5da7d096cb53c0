//! TMDB keyword search client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{CatalogCandidate, CatalogLookup, SearchQuery};
use crate::config::LookupConfig;
use crate::error::{CatalogError, Result};

/// TMDB search client
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    image_base_url: String,
    credential: String,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbItem>,
}

#[derive(Debug, Deserialize)]
struct TmdbItem {
    media_type: Option<String>,
    #[serde(flatten)]
    candidate: CatalogCandidate,
}

impl TmdbClient {
    /// Create a client from lookup settings; fails when no credential is configured
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let credential = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CatalogError::MissingCredentials("TMDB_API_KEY is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("flix-catalog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// v4 read access tokens are JWTs and go in the Authorization header;
    /// v3 API keys go in the query string
    fn is_access_token(&self) -> bool {
        self.credential.starts_with("eyJ")
    }

    fn query_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", query.query.clone()),
            ("include_adult", query.include_adult.to_string()),
            ("language", query.language.clone()),
        ];
        if let Some(year) = &query.year {
            params.push(("year", year.clone()));
        }
        if !self.is_access_token() {
            params.push(("api_key", self.credential.clone()));
        }
        params
    }
}

#[async_trait]
impl CatalogLookup for TmdbClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CatalogCandidate>> {
        let url = format!("{}/search/multi", self.base_url);
        debug!("Searching TMDB for {:?} (year {:?})", query.query, query.year);

        let mut request = self.client.get(&url).query(&self.query_params(query));
        if self.is_access_token() {
            request = request.bearer_auth(&self.credential);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::LookupStatus { status, body });
        }

        let search: TmdbSearchResponse = response.json().await?;
        Ok(parse_results(search))
    }

    fn poster_url(&self, poster_path: &str) -> String {
        format!("{}/{}", self.image_base_url, poster_path.trim_start_matches('/'))
    }

    fn name(&self) -> &str {
        "TMDB"
    }
}

fn parse_results(search: TmdbSearchResponse) -> Vec<CatalogCandidate> {
    search
        .results
        .into_iter()
        .filter(|item| item.media_type.as_deref() != Some("person"))
        .map(|item| item.candidate)
        .collect()
}
