//! Manually curated fields carried across re-runs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::{document, CatalogEntry};

/// Custom fields for one identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSet {
    pub custom_title: Option<String>,
    pub custom_poster: Option<String>,
    pub custom_overview: Option<String>,
}

impl OverrideSet {
    /// Drop blank values
    pub fn non_empty(self) -> Self {
        let keep = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            custom_title: keep(self.custom_title),
            custom_poster: keep(self.custom_poster),
            custom_overview: keep(self.custom_overview),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.custom_title.is_none() && self.custom_poster.is_none() && self.custom_overview.is_none()
    }
}

/// Key-value source of overrides, read once per run
#[async_trait]
pub trait OverrideStore: Send + Sync {
    /// Overrides by identifier; failures degrade to an empty map
    async fn load(&self) -> HashMap<String, OverrideSet>;
}

/// Overrides read from a previously written catalog document
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    path: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl OverrideStore for JsonDocumentStore {
    async fn load(&self) -> HashMap<String, OverrideSet> {
        if !self.path.exists() {
            debug!("No prior document at {}", self.path.display());
            return HashMap::new();
        }

        let entries = match document::read_document(&self.path).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring unreadable prior document {}: {}", self.path.display(), e);
                return HashMap::new();
            }
        };

        let overrides = collect(&entries);
        if !overrides.is_empty() {
            info!("✏️ Loaded overrides for {} entries from {}", overrides.len(), self.path.display());
        }
        overrides
    }
}

#[async_trait]
impl OverrideStore for HashMap<String, OverrideSet> {
    async fn load(&self) -> HashMap<String, OverrideSet> {
        self.clone()
    }
}

/// Non-empty overrides of each entry, keyed by id
pub fn collect(entries: &[CatalogEntry]) -> HashMap<String, OverrideSet> {
    entries
        .iter()
        .map(|entry| (entry.id().to_string(), entry.overrides().non_empty()))
        .filter(|(_, set)| !set.is_empty())
        .collect()
}

/// Attach the overrides recorded for this entry's id; only fills custom fields
pub fn apply(mut entry: CatalogEntry, overrides: &HashMap<String, OverrideSet>) -> CatalogEntry {
    let Some(set) = overrides.get(entry.id()) else {
        return entry;
    };

    let (title, poster, overview) = entry.override_slots();
    for (slot, value) in [
        (title, &set.custom_title),
        (poster, &set.custom_poster),
        (overview, &set.custom_overview),
    ] {
        if let Some(value) = value.as_ref().filter(|v| !v.trim().is_empty()) {
            *slot = Some(value.clone());
        }
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MovieEntry;
    use tempfile::TempDir;

    fn movie(id: &str, custom_title: Option<&str>) -> CatalogEntry {
        CatalogEntry::Movie(MovieEntry {
            id: id.to_string(),
            title: "Heat".to_string(),
            size: "1.0 GB".to_string(),
            link: "https://t.me/c/1/1".to_string(),
            poster: Some("fresh.jpg".to_string()),
            overview: None,
            rating: Some(8.0),
            custom_title: custom_title.map(str::to_string),
            custom_poster: None,
            custom_overview: Some("   ".to_string()),
        })
    }

    #[test]
    fn test_collect_keeps_non_empty_fields() {
        let overrides = collect(&[movie("a", Some("Heat (1995)")), movie("b", None)]);

        assert_eq!(overrides.len(), 1);
        let set = &overrides["a"];
        assert_eq!(set.custom_title.as_deref(), Some("Heat (1995)"));
        assert_eq!(set.custom_overview, None);
    }

    #[test]
    fn test_apply_is_additive() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "a".to_string(),
            OverrideSet {
                custom_title: Some("Heat (1995)".to_string()),
                custom_poster: Some(String::new()),
                custom_overview: None,
            },
        );

        let applied = apply(movie("a", None), &overrides);
        match applied {
            CatalogEntry::Movie(m) => {
                assert_eq!(m.custom_title.as_deref(), Some("Heat (1995)"));
                assert_eq!(m.custom_poster, None);
                assert_eq!(m.poster.as_deref(), Some("fresh.jpg"));
                assert_eq!(m.rating, Some(8.0));
            }
            other => panic!("expected a movie, got {:?}", other),
        }

        let untouched = apply(movie("b", None), &overrides);
        assert_eq!(untouched, movie("b", None));
    }

    #[test]
    fn test_in_memory_store() {
        let mut store = HashMap::new();
        store.insert("a".to_string(), OverrideSet::default());

        let loaded = tokio_test::block_on(store.load());
        assert_eq!(loaded, store);
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_document_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(JsonDocumentStore::new(dir.path().join("absent.json")).load().await.is_empty());

        let corrupt = dir.path().join("movies.json");
        std::fs::write(&corrupt, "{ not json").unwrap();
        assert!(JsonDocumentStore::new(&corrupt).load().await.is_empty());
    }

    #[tokio::test]
    async fn test_document_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("movies.json");
        document::write_document(&path, &[movie("a", Some("Custom"))]).await.unwrap();

        let overrides = JsonDocumentStore::new(&path).load().await;
        assert_eq!(overrides["a"].custom_title.as_deref(), Some("Custom"));
    }
}
