//! Flix Catalog
//!
//! Scans a message archive for video files, infers canonical titles from noisy
//! release filenames, enriches them with metadata from a remote catalog
//! service, and emits a deduplicated, stably identified JSON document.

pub mod archive;
pub mod catalog;
pub mod config;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod title;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::archive::{ArchiveSource, DirectoryArchive, ExportArchive, MemoryArchive, MessageRecord};
pub use crate::catalog::{CatalogEntry, Episode, MovieEntry, OverrideSet, SeriesEntry};
pub use crate::config::Config;
pub use crate::error::{CatalogError, Result};
pub use crate::metadata::{CatalogLookup, MetadataRecord, MetadataResolver, TmdbClient};
pub use crate::pipeline::{CatalogPipeline, ScanReport, ScanStats};
pub use crate::title::{extract, ParsedTitle};
