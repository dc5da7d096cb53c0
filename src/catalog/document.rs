//! Reading and writing the catalog document

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{CatalogEntry, MovieEntry};
use crate::error::Result;

/// Untyped element shape written by older releases
#[derive(Debug, Deserialize)]
struct LegacyItem {
    id: Option<Value>,
    title: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    link: Option<String>,
    poster: Option<String>,
    overview: Option<String>,
    rating: Option<f64>,
}

impl LegacyItem {
    fn into_movie(self, index: usize) -> MovieEntry {
        let id = match self.id {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => format!("movie-{}", index),
        };

        MovieEntry {
            id,
            title: self.title,
            size: self.size.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            poster: self.poster.filter(|p| !p.is_empty()),
            overview: self.overview.filter(|o| !o.is_empty()),
            rating: self.rating.filter(|r| *r != 0.0),
            custom_title: None,
            custom_poster: None,
            custom_overview: None,
        }
    }
}

/// Read a document, normalizing legacy elements and skipping bad ones
pub async fn read_document(path: &Path) -> Result<Vec<CatalogEntry>> {
    let content = tokio::fs::read_to_string(path).await?;
    let value: Value = serde_json::from_str(&content)?;
    Ok(parse_entries(value))
}

/// Normalize a parsed document; a non-array document reads as empty
pub fn parse_entries(value: Value) -> Vec<CatalogEntry> {
    let Value::Array(items) = value else {
        warn!("Catalog document is not an array, treating it as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match parse_entry(index, item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping catalog element {}: {}", index, e);
                None
            }
        })
        .collect()
}

fn parse_entry(index: usize, item: Value) -> serde_json::Result<CatalogEntry> {
    let typed = matches!(item.get("type").and_then(Value::as_str), Some("movie" | "series"));
    if typed {
        serde_json::from_value(item)
    } else {
        debug!("Reading legacy element {} as a movie", index);
        let legacy: LegacyItem = serde_json::from_value(item)?;
        Ok(CatalogEntry::Movie(legacy.into_movie(index)))
    }
}

/// Write the document pretty-printed, replacing the file atomically
pub async fn write_document(path: &Path, entries: &[CatalogEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json_content = serde_json::to_string_pretty(entries)?;
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = Path::new(&temp_name);

    tokio::fs::write(temp_path, json_content).await?;
    tokio::fs::rename(temp_path, path).await?;

    info!("💾 Wrote {} entries to {}", entries.len(), path.display());
    Ok(())
}
