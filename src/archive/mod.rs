//! Message archive readers
//!
//! The pipeline consumes any [`ArchiveSource`] one record at a time. Three
//! readers ship with the crate: a JSON message export, a local directory walk,
//! and an in-memory list.

pub mod directory;
pub mod export;

pub use directory::DirectoryArchive;
pub use export::ExportArchive;

use async_trait::async_trait;
use std::collections::VecDeque;

use crate::catalog::RawAttachment;
use crate::error::{CatalogError, Result};
use crate::title::has_video_extension;

/// How a message carries its file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Native video upload
    Video,
    /// Generic document; accepted only with a video extension
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub filename: Option<String>,
    pub byte_size: Option<i64>,
}

/// One record of the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: i64,
    /// Permalink to the message
    pub link: String,
    pub attachment: Option<MediaAttachment>,
}

/// Ordered, lazily consumed sequence of message records
#[async_trait]
pub trait ArchiveSource: Send {
    /// Next record, `None` once exhausted
    async fn next_record(&mut self) -> Result<Option<MessageRecord>>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// The attachment worth cataloging, if any
pub fn accept(record: &MessageRecord, video_extensions: &[String]) -> Option<RawAttachment> {
    let attachment = record.attachment.as_ref()?;
    let filename = attachment.filename.as_deref().filter(|name| !name.is_empty())?;

    if attachment.kind == MediaKind::Document && !has_video_extension(filename, video_extensions) {
        return None;
    }

    Some(RawAttachment {
        filename: filename.to_string(),
        byte_size: attachment.byte_size.unwrap_or(0),
        source_link: record.link.clone(),
    })
}

/// Channel id as used in message links, without the `-100` prefix
pub fn link_channel_id(channel_id: i64) -> String {
    let id = channel_id.to_string();
    match id.strip_prefix("-100") {
        Some(stripped) => stripped.to_string(),
        None => id.trim_start_matches('-').to_string(),
    }
}

/// Permalink for a message in a private channel
pub fn message_link(channel_id: i64, message_id: i64) -> String {
    format!("https://t.me/c/{}/{}", link_channel_id(channel_id), message_id)
}

/// Archive backed by an in-memory list of records
#[derive(Debug, Default)]
pub struct MemoryArchive {
    records: VecDeque<MessageRecord>,
    fail_after: Option<usize>,
    yielded: usize,
}

impl MemoryArchive {
    pub fn new(records: Vec<MessageRecord>) -> Self {
        Self {
            records: records.into(),
            ..Self::default()
        }
    }

    /// Video messages for `(filename, byte size)` pairs, numbered from 1
    pub fn from_files(channel_id: i64, files: &[(&str, i64)]) -> Self {
        let records = files
            .iter()
            .zip(1..)
            .map(|((filename, size), id)| MessageRecord {
                id,
                link: message_link(channel_id, id),
                attachment: Some(MediaAttachment {
                    kind: MediaKind::Video,
                    filename: Some(filename.to_string()),
                    byte_size: Some(*size),
                }),
            })
            .collect();
        Self::new(records)
    }

    /// Fail with a read error once `count` records have been yielded
    pub fn fail_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }
}

#[async_trait]
impl ArchiveSource for MemoryArchive {
    async fn next_record(&mut self) -> Result<Option<MessageRecord>> {
        if self.fail_after.is_some_and(|limit| self.yielded >= limit) {
            return Err(CatalogError::ArchiveUnavailable("connection lost".to_string()));
        }
        let record = self.records.pop_front();
        if record.is_some() {
            self.yielded += 1;
        }
        Ok(record)
    }

    fn describe(&self) -> String {
        format!("in-memory archive ({} records)", self.records.len())
    }
}
