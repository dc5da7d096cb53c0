//! Pipeline driver: archive records in, ordered catalog entries out

use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::archive::{self, ArchiveSource, MessageRecord};
use crate::catalog::{overrides, Aggregator, CatalogEntry, JsonDocumentStore, OverrideStore};
use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::metadata::{CatalogLookup, LookupCacheManager, MetadataResolver, TmdbClient};
use crate::title::{self, VIDEO_EXTENSIONS};

/// How often progress is logged, in messages
const PROGRESS_INTERVAL: usize = 100;

/// Counters for one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub messages_scanned: usize,
    pub media_accepted: usize,
    pub records_skipped: usize,
    pub lookups_issued: usize,
    pub cache_hits: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub entries: usize,
    pub series: usize,
    /// Stopped early by a shutdown signal or an archive read error
    pub interrupted: bool,
}

/// Output of one scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub entries: Vec<CatalogEntry>,
    pub stats: ScanStats,
}

impl ScanReport {
    pub fn summary(&self) -> String {
        let s = &self.stats;
        format!(
            "Scan Summary:\n\
            - Messages Scanned: {}\n\
            - Media Files: {} ({} records skipped)\n\
            - Entries: {} ({} series)\n\
            - Titles Matched: {} / Unmatched: {}\n\
            - Lookups Issued: {} (cache hits {})\n\
            - Interrupted: {}",
            s.messages_scanned,
            s.media_accepted,
            s.records_skipped,
            s.entries,
            s.series,
            s.matched,
            s.unmatched,
            s.lookups_issued,
            s.cache_hits,
            s.interrupted,
        )
    }
}

/// Drives extraction, resolution, grouping and override merging for one run
pub struct CatalogPipeline {
    resolver: MetadataResolver,
    override_store: Box<dyn OverrideStore>,
    category: Option<String>,
    video_extensions: Vec<String>,
}

impl CatalogPipeline {
    pub fn new(resolver: MetadataResolver, override_store: Box<dyn OverrideStore>) -> Self {
        Self {
            resolver,
            override_store,
            category: None,
            video_extensions: VIDEO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category.filter(|c| !c.is_empty());
        self
    }

    pub fn with_video_extensions(mut self, extensions: Vec<String>) -> Self {
        self.video_extensions = extensions;
        self
    }

    /// Wire up the lookup service, cache and prior document from configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let lookup: Option<Box<dyn CatalogLookup>> = if !config.lookup.enabled {
            info!("⏭️ Metadata lookups disabled");
            None
        } else {
            match TmdbClient::new(&config.lookup) {
                Ok(client) => Some(Box::new(client)),
                Err(CatalogError::MissingCredentials(reason)) => {
                    warn!("{}; metadata lookups skipped for this run", reason);
                    None
                }
                Err(e) => return Err(e),
            }
        };

        let mut resolver = MetadataResolver::new(lookup, &config.lookup);
        if config.cache.enabled && resolver.is_enabled() {
            let cache = LookupCacheManager::new(config.cache.dir.clone(), config.cache.ttl_hours);
            cache.initialize().await?;
            resolver = resolver.with_disk_cache(cache);
        }

        let store = JsonDocumentStore::new(config.output.prior_path());
        Ok(Self::new(resolver, Box::new(store))
            .with_category(config.archive.category.clone())
            .with_video_extensions(config.archive.video_extensions.clone()))
    }

    /// Scan the whole archive
    pub async fn run(&mut self, archive: &mut dyn ArchiveSource) -> ScanReport {
        self.run_until(archive, std::future::pending::<()>()).await
    }

    /// Scan until the archive is exhausted or `shutdown` resolves; either way
    /// the entries aggregated so far are finalized
    pub async fn run_until<F>(&mut self, archive: &mut dyn ArchiveSource, shutdown: F) -> ScanReport
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        info!("🔍 Scanning {}", archive.describe());

        let override_map = self.override_store.load().await;
        let mut aggregator = Aggregator::new(self.category.clone());
        let mut stats = ScanStats::default();

        tokio::pin!(shutdown);
        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!("🛑 Scan interrupted, keeping {} groups aggregated so far", aggregator.len());
                    stats.interrupted = true;
                    break;
                }
                next = archive.next_record() => next,
            };

            match next {
                Ok(Some(record)) => self.process(record, &mut aggregator, &mut stats).await,
                Ok(None) => break,
                Err(e) => {
                    warn!("Archive read failed after {} messages: {}", stats.messages_scanned, e);
                    stats.interrupted = true;
                    break;
                }
            }
        }

        let entries: Vec<CatalogEntry> = aggregator
            .finalize()
            .into_iter()
            .map(|entry| overrides::apply(entry, &override_map))
            .collect();

        let resolver_stats = self.resolver.stats();
        stats.lookups_issued = resolver_stats.queries_issued;
        stats.cache_hits = resolver_stats.cache_hits;
        stats.matched = resolver_stats.matched;
        stats.unmatched = resolver_stats.unmatched;
        stats.entries = entries.len();
        stats.series = entries.iter().filter(|entry| entry.is_series()).count();

        info!(
            "✅ Scan finished in {:.2}s: {} messages, {} media files, {} entries",
            started.elapsed().as_secs_f64(),
            stats.messages_scanned,
            stats.media_accepted,
            stats.entries
        );

        ScanReport { entries, stats }
    }

    async fn process(&mut self, record: MessageRecord, aggregator: &mut Aggregator, stats: &mut ScanStats) {
        stats.messages_scanned += 1;

        match archive::accept(&record, &self.video_extensions) {
            Some(attachment) => {
                stats.media_accepted += 1;
                let parsed = title::extract(&attachment.filename);
                debug!("Message {}: {} -> {:?}", record.id, attachment.filename, parsed.normalized_title);

                let metadata = self
                    .resolver
                    .resolve(&parsed.normalized_title, parsed.year.as_deref())
                    .await;
                aggregator.add(attachment, &parsed, &metadata);
            }
            None => stats.records_skipped += 1,
        }

        if stats.messages_scanned % PROGRESS_INTERVAL == 0 {
            info!(
                "📊 Processed {} messages, found {} media files...",
                stats.messages_scanned, stats.media_accepted
            );
        }
    }
}
