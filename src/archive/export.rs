//! Reader for JSON message exports

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{message_link, ArchiveSource, MediaAttachment, MediaKind, MessageRecord};
use crate::error::{CatalogError, Result};

#[derive(Debug, Deserialize)]
struct ExportDocument {
    id: Option<i64>,
    name: Option<String>,
    #[serde(default)]
    messages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ExportMessage {
    id: i64,
    media_type: Option<String>,
    file: Option<String>,
    file_name: Option<String>,
    file_size: Option<i64>,
}

impl ExportMessage {
    fn attachment(&self) -> Option<MediaAttachment> {
        if self.file.is_none() && self.file_name.is_none() {
            return None;
        }

        let kind = match self.media_type.as_deref() {
            Some("video_file") => MediaKind::Video,
            _ => MediaKind::Document,
        };

        // Older exports only carry the stored path
        let filename = self.file_name.clone().or_else(|| {
            self.file
                .as_deref()
                .and_then(|file| Path::new(file).file_name())
                .map(|name| name.to_string_lossy().into_owned())
        });

        Some(MediaAttachment {
            kind,
            filename,
            byte_size: self.file_size,
        })
    }
}

/// Archive read from a channel export file
#[derive(Debug)]
pub struct ExportArchive {
    path: PathBuf,
    channel_id: i64,
    messages: VecDeque<Value>,
}

impl ExportArchive {
    /// Open an export; `channel_id` overrides the id recorded in the file
    pub async fn open(path: impl AsRef<Path>, channel_id: Option<i64>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogError::ArchiveUnavailable(format!("{}: {}", path.display(), e)))?;
        let document: ExportDocument = serde_json::from_str(&content)
            .map_err(|e| CatalogError::ArchiveUnavailable(format!("{}: {}", path.display(), e)))?;

        let channel_id = channel_id.or(document.id).ok_or_else(|| {
            CatalogError::ArchiveUnavailable(format!("{}: no channel id in export or configuration", path.display()))
        })?;

        info!(
            "📂 Opened export {} ({}, {} messages)",
            path.display(),
            document.name.as_deref().unwrap_or("unnamed channel"),
            document.messages.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            channel_id,
            messages: document.messages.into(),
        })
    }
}

#[async_trait]
impl ArchiveSource for ExportArchive {
    async fn next_record(&mut self) -> Result<Option<MessageRecord>> {
        let Some(raw) = self.messages.pop_front() else {
            return Ok(None);
        };

        let record = match serde_json::from_value::<ExportMessage>(raw) {
            Ok(message) => MessageRecord {
                id: message.id,
                link: message_link(self.channel_id, message.id),
                attachment: message.attachment(),
            },
            Err(e) => {
                warn!("Unreadable message in {}: {}", self.path.display(), e);
                MessageRecord {
                    id: 0,
                    link: String::new(),
                    attachment: None,
                }
            }
        };
        Ok(Some(record))
    }

    fn describe(&self) -> String {
        format!("export {} (channel {})", self.path.display(), self.channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EXPORT: &str = r#"{
        "name": "Flix",
        "type": "private_channel",
        "id": 3686417406,
        "messages": [
            {"id": 1, "type": "service", "action": "create_channel"},
            {"id": 2, "type": "message", "media_type": "video_file",
             "file": "video_files/Heat.1995.mkv", "file_name": "Heat.1995.mkv", "file_size": 1073741824},
            {"id": 3, "type": "message", "file": "files/Alien.1979.mp4"},
            {"id": "bad"}
        ]
    }"#;

    async fn drain(archive: &mut ExportArchive) -> Vec<MessageRecord> {
        let mut records = Vec::new();
        while let Some(record) = archive.next_record().await.unwrap() {
            records.push(record);
        }
        records
    }

    #[tokio::test]
    async fn test_reads_export_messages() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.json");
        std::fs::write(&path, EXPORT).unwrap();

        let mut archive = ExportArchive::open(&path, None).await.unwrap();
        let records = drain(&mut archive).await;

        assert_eq!(records.len(), 4);
        assert!(records[0].attachment.is_none());

        let heat = records[1].attachment.as_ref().unwrap();
        assert_eq!(heat.kind, MediaKind::Video);
        assert_eq!(heat.byte_size, Some(1073741824));
        assert_eq!(records[1].link, "https://t.me/c/3686417406/2");

        let alien = records[2].attachment.as_ref().unwrap();
        assert_eq!(alien.kind, MediaKind::Document);
        assert_eq!(alien.filename.as_deref(), Some("Alien.1979.mp4"));
        assert_eq!(alien.byte_size, None);

        assert!(records[3].attachment.is_none());
    }

    #[tokio::test]
    async fn test_channel_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.json");
        std::fs::write(&path, EXPORT).unwrap();

        let mut archive = ExportArchive::open(&path, Some(-1005550001)).await.unwrap();
        let records = drain(&mut archive).await;
        assert_eq!(records[1].link, "https://t.me/c/5550001/2");
    }

    #[tokio::test]
    async fn test_missing_export_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let result = ExportArchive::open(dir.path().join("absent.json"), Some(1)).await;
        assert!(matches!(result, Err(CatalogError::ArchiveUnavailable(_))));
    }
}
