//! Persistent cache of successful metadata lookups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::MetadataRecord;
use crate::catalog::identity;
use crate::error::Result;

/// One cached lookup result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupCacheEntry {
    /// When the lookup was made
    pub timestamp: DateTime<Utc>,
    /// File stem the entry is stored under
    pub cache_key: String,
    /// Normalized title the record was resolved for
    pub title: String,
    pub record: MetadataRecord,
}

/// Manages lookup cache files, one JSON file per title
#[derive(Debug, Clone)]
pub struct LookupCacheManager {
    cache_dir: PathBuf,
    cache_ttl_hours: u64,
}

impl LookupCacheManager {
    /// Create a new cache manager
    pub fn new(cache_dir: PathBuf, cache_ttl_hours: u64) -> Self {
        Self {
            cache_dir,
            cache_ttl_hours,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Initialize cache directory
    pub async fn initialize(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        info!("📁 Lookup cache directory initialized: {}", self.cache_dir.display());
        Ok(())
    }

    /// Cache key for a normalized title
    pub fn cache_key(&self, title: &str) -> String {
        identity::assign(title)
    }

    fn entry_path(&self, cache_key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", cache_key))
    }

    /// Load the cached record for a title if present and fresh
    pub async fn load_cached(&self, title: &str) -> Option<MetadataRecord> {
        let cache_key = self.cache_key(title);
        let cache_path = self.entry_path(&cache_key);

        if !cache_path.exists() {
            debug!("Cache miss: no file found for key {}", cache_key);
            return None;
        }

        let entry = match read_entry(&cache_path).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", cache_path.display(), e);
                return None;
            }
        };

        if !self.is_valid(&entry) {
            info!("⏰ Cache expired for key: {}", cache_key);
            let _ = tokio::fs::remove_file(&cache_path).await;
            return None;
        }

        debug!("📚 Cache hit for {:?}", title);
        Some(entry.record)
    }

    /// Store a record; unmatched records are never cached
    pub async fn save_cached(&self, title: &str, record: &MetadataRecord) -> Result<()> {
        if !record.is_match() {
            return Ok(());
        }

        let cache_key = self.cache_key(title);
        let entry = LookupCacheEntry {
            timestamp: Utc::now(),
            cache_key: cache_key.clone(),
            title: title.to_string(),
            record: record.clone(),
        };

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let json_content = serde_json::to_string_pretty(&entry)?;
        tokio::fs::write(self.entry_path(&cache_key), json_content).await?;
        debug!("💾 Cached metadata for {:?} as {}", title, cache_key);

        Ok(())
    }

    fn is_valid(&self, entry: &LookupCacheEntry) -> bool {
        age_hours(entry) < self.cache_ttl_hours
    }

    /// Remove expired cache files
    pub async fn cleanup_expired(&self) -> Result<usize> {
        let mut cleaned_count = 0;
        for (path, entry) in self.entries().await? {
            if !self.is_valid(&entry) && tokio::fs::remove_file(&path).await.is_ok() {
                cleaned_count += 1;
                debug!("🗑️ Removed expired cache: {}", path.display());
            }
        }

        if cleaned_count > 0 {
            info!("🧹 Cleaned up {} expired cache files", cleaned_count);
        }
        Ok(cleaned_count)
    }

    /// Cache statistics
    pub async fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        for (_, entry) in self.entries().await? {
            stats.total_files += 1;
            if self.is_valid(&entry) {
                stats.valid_files += 1;
            } else {
                stats.expired_files += 1;
            }
        }
        Ok(stats)
    }

    /// Drop the cached record for a title
    pub async fn invalidate(&self, title: &str) -> Result<bool> {
        let cache_key = self.cache_key(title);
        let cache_path = self.entry_path(&cache_key);

        if cache_path.exists() {
            tokio::fs::remove_file(&cache_path).await?;
            info!("🗑️ Invalidated cache for {:?}", title);
            Ok(true)
        } else {
            debug!("Cache file not found for key: {}", cache_key);
            Ok(false)
        }
    }

    /// Remove every cache file
    pub async fn clear_all(&self) -> Result<usize> {
        let mut cleared_count = 0;
        for path in self.json_files().await? {
            if tokio::fs::remove_file(&path).await.is_ok() {
                cleared_count += 1;
            }
        }

        if cleared_count > 0 {
            info!("🧹 Cleared {} cache files", cleared_count);
        }
        Ok(cleared_count)
    }

    /// All cached titles, newest first
    pub async fn list(&self) -> Result<Vec<CachedTitleInfo>> {
        let mut titles: Vec<CachedTitleInfo> = self
            .entries()
            .await?
            .into_iter()
            .map(|(_, entry)| CachedTitleInfo {
                is_valid: self.is_valid(&entry),
                age_hours: age_hours(&entry),
                cache_key: entry.cache_key,
                title: entry.title,
                has_poster: entry.record.poster_url.is_some(),
                timestamp: entry.timestamp,
            })
            .collect();

        titles.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(titles)
    }

    async fn json_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if !self.cache_dir.exists() {
            return Ok(files);
        }

        let mut dir = tokio::fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Readable cache entries; unparseable files are skipped
    async fn entries(&self) -> Result<Vec<(PathBuf, LookupCacheEntry)>> {
        let mut entries = Vec::new();
        for path in self.json_files().await? {
            match read_entry(&path).await {
                Ok(entry) => entries.push((path, entry)),
                Err(e) => debug!("Skipping cache file {}: {}", path.display(), e),
            }
        }
        Ok(entries)
    }
}

async fn read_entry(path: &Path) -> Result<LookupCacheEntry> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

fn age_hours(entry: &LookupCacheEntry) -> u64 {
    (Utc::now() - entry.timestamp).num_hours().max(0) as u64
}

/// Cache statistics
#[derive(Debug, Default)]
pub struct CacheStats {
    pub total_files: usize,
    pub valid_files: usize,
    pub expired_files: usize,
}

/// Information about a cached title
#[derive(Debug, Clone)]
pub struct CachedTitleInfo {
    pub cache_key: String,
    pub title: String,
    pub has_poster: bool,
    pub is_valid: bool,
    pub age_hours: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn matched() -> MetadataRecord {
        MetadataRecord {
            poster_url: Some("https://image.tmdb.org/t/p/w500/p.jpg".to_string()),
            overview: Some("A film".to_string()),
            rating: Some(7.1),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let cache = LookupCacheManager::new(dir.path().to_path_buf(), 24);
        cache.initialize().await.unwrap();

        cache.save_cached("Your Name", &matched()).await.unwrap();

        assert_eq!(cache.load_cached("Your Name").await, Some(matched()));
        assert_eq!(cache.load_cached("Other").await, None);
    }

    #[tokio::test]
    async fn test_unmatched_not_cached() {
        let dir = TempDir::new().unwrap();
        let cache = LookupCacheManager::new(dir.path().to_path_buf(), 24);

        cache.save_cached("Nothing", &MetadataRecord::unmatched()).await.unwrap();

        assert_eq!(cache.load_cached("Nothing").await, None);
        assert_eq!(cache.stats().await.unwrap().total_files, 0);
    }

    #[tokio::test]
    async fn test_expired_entries() {
        let dir = TempDir::new().unwrap();
        let cache = LookupCacheManager::new(dir.path().to_path_buf(), 24);
        cache.save_cached("Fresh", &matched()).await.unwrap();

        let stale = LookupCacheEntry {
            timestamp: Utc::now() - Duration::hours(48),
            cache_key: cache.cache_key("Stale"),
            title: "Stale".to_string(),
            record: matched(),
        };
        let path = dir.path().join(format!("{}.json", stale.cache_key));
        std::fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.expired_files, 1);

        assert_eq!(cache.cleanup_expired().await.unwrap(), 1);
        assert!(!path.exists());
        assert!(cache.load_cached("Fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_list_and_clear() {
        let dir = TempDir::new().unwrap();
        let cache = LookupCacheManager::new(dir.path().to_path_buf(), 24);
        cache.save_cached("Heat", &matched()).await.unwrap();
        cache.save_cached("Alien", &matched()).await.unwrap();

        let listed = cache.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|info| info.is_valid && info.has_poster));

        assert!(cache.invalidate("Heat").await.unwrap());
        assert!(!cache.invalidate("Heat").await.unwrap());
        assert_eq!(cache.clear_all().await.unwrap(), 1);
        assert!(cache.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = LookupCacheManager::new(dir.path().join("absent"), 24);
        assert_eq!(cache.stats().await.unwrap().total_files, 0);
        assert!(cache.list().await.unwrap().is_empty());
    }
}
