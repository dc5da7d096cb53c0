//! Reader treating a local directory tree as an archive

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;
use walkdir::WalkDir;

use super::{ArchiveSource, MediaAttachment, MediaKind, MessageRecord};
use crate::error::{CatalogError, Result};

/// Every regular file under `root`, sorted by path, as a document message
#[derive(Debug)]
pub struct DirectoryArchive {
    root: PathBuf,
    files: VecDeque<PathBuf>,
    next_id: i64,
}

impl DirectoryArchive {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CatalogError::ArchiveUnavailable(format!(
                "Directory does not exist: {}",
                root.display()
            )));
        }

        let mut files = VecDeque::new();
        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push_back(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry under {}: {}", root.display(), e),
            }
        }

        info!("📂 Found {} files under {}", files.len(), root.display());
        Ok(Self {
            root: root.to_path_buf(),
            files,
            next_id: 1,
        })
    }
}

fn file_link(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    Url::from_file_path(&absolute)
        .map(String::from)
        .unwrap_or_else(|_| absolute.display().to_string())
}

#[async_trait]
impl ArchiveSource for DirectoryArchive {
    async fn next_record(&mut self) -> Result<Option<MessageRecord>> {
        let Some(path) = self.files.pop_front() else {
            return Ok(None);
        };

        let id = self.next_id;
        self.next_id += 1;

        let byte_size = match tokio::fs::metadata(&path).await {
            Ok(metadata) => Some(metadata.len() as i64),
            Err(e) => {
                warn!("Cannot stat {}: {}", path.display(), e);
                None
            }
        };

        Ok(Some(MessageRecord {
            id,
            link: file_link(&path),
            attachment: Some(MediaAttachment {
                kind: MediaKind::Document,
                filename: path.file_name().map(|name| name.to_string_lossy().into_owned()),
                byte_size,
            }),
        }))
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}
