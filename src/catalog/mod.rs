//! Catalog data model: entries, episodes and the persisted document shape

pub mod aggregator;
pub mod document;
pub mod identity;
pub mod overrides;

pub use aggregator::Aggregator;
pub use overrides::{JsonDocumentStore, OverrideSet, OverrideStore};

use serde::{Deserialize, Serialize};

use crate::metadata::MetadataRecord;

/// One media file observed in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttachment {
    pub filename: String,
    /// Size in bytes; unknown sizes are 0
    pub byte_size: i64,
    pub source_link: String,
}

/// One file inside a series entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub title: String,
    pub episode_id: String,
    pub size: String,
    pub link: String,
}

/// A single-file entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieEntry {
    pub id: String,
    pub title: String,
    pub size: String,
    pub link: String,
    pub poster: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub custom_title: Option<String>,
    #[serde(default)]
    pub custom_poster: Option<String>,
    #[serde(default)]
    pub custom_overview: Option<String>,
}

/// Several files grouped under one title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesEntry {
    pub id: String,
    pub title: String,
    pub episode_count: usize,
    pub poster: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<f64>,
    pub episodes: Vec<Episode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_overview: Option<String>,
}

/// The unit of output, tagged on `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogEntry {
    Movie(MovieEntry),
    Series(SeriesEntry),
}

impl CatalogEntry {
    pub fn id(&self) -> &str {
        match self {
            CatalogEntry::Movie(movie) => &movie.id,
            CatalogEntry::Series(series) => &series.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            CatalogEntry::Movie(movie) => &movie.title,
            CatalogEntry::Series(series) => &series.title,
        }
    }

    pub fn is_series(&self) -> bool {
        matches!(self, CatalogEntry::Series(_))
    }

    /// Manually curated fields currently on the entry
    pub fn overrides(&self) -> OverrideSet {
        let (title, poster, overview) = match self {
            CatalogEntry::Movie(m) => (&m.custom_title, &m.custom_poster, &m.custom_overview),
            CatalogEntry::Series(s) => (&s.custom_title, &s.custom_poster, &s.custom_overview),
        };
        OverrideSet {
            custom_title: title.clone(),
            custom_poster: poster.clone(),
            custom_overview: overview.clone(),
        }
    }

    pub(crate) fn override_slots(
        &mut self,
    ) -> (&mut Option<String>, &mut Option<String>, &mut Option<String>) {
        match self {
            CatalogEntry::Movie(m) => (&mut m.custom_title, &mut m.custom_poster, &mut m.custom_overview),
            CatalogEntry::Series(s) => (&mut s.custom_title, &mut s.custom_poster, &mut s.custom_overview),
        }
    }

    /// Attach metadata fields
    pub(crate) fn with_metadata(mut self, record: &MetadataRecord) -> Self {
        let (poster, overview, rating) = match &mut self {
            CatalogEntry::Movie(m) => (&mut m.poster, &mut m.overview, &mut m.rating),
            CatalogEntry::Series(s) => (&mut s.poster, &mut s.overview, &mut s.rating),
        };
        *poster = record.poster_url.clone();
        *overview = record.overview.clone();
        *rating = record.rating;
        self
    }
}

/// Human-readable size using binary thresholds
pub fn format_size(bytes: i64) -> String {
    const MB: f64 = 1024.0 * 1024.0;
    const GB: f64 = MB * 1024.0;

    if bytes < 0 {
        return "Unknown".to_string();
    }

    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else {
        format!("{:.1} MB", bytes / MB)
    }
}
