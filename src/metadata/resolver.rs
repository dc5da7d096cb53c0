//! Metadata resolution with an ordered chain of query strategies

use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{CatalogCandidate, CatalogLookup, LookupCacheManager, MetadataRecord, SearchQuery};
use crate::config::LookupConfig;
use crate::error::CatalogError;
use crate::title::rules::strip_technical_suffix;

/// One way of turning a title into a search query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStrategy {
    /// Title plus year, most specific
    TitleWithYear,
    /// Title alone
    TitleOnly,
    /// Title with trailing technical tokens stripped
    CleanedTitle,
    /// Title without its first word
    DropFirstWord,
    /// Title without its last word
    DropLastWord,
}

impl QueryStrategy {
    /// Every strategy, in the order they are tried
    pub const ORDER: [QueryStrategy; 5] = [
        QueryStrategy::TitleWithYear,
        QueryStrategy::TitleOnly,
        QueryStrategy::CleanedTitle,
        QueryStrategy::DropFirstWord,
        QueryStrategy::DropLastWord,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QueryStrategy::TitleWithYear => "title+year",
            QueryStrategy::TitleOnly => "title",
            QueryStrategy::CleanedTitle => "cleaned-title",
            QueryStrategy::DropFirstWord => "drop-first-word",
            QueryStrategy::DropLastWord => "drop-last-word",
        }
    }

    fn is_word_dropping(&self) -> bool {
        matches!(self, QueryStrategy::DropFirstWord | QueryStrategy::DropLastWord)
    }

    /// The query text and year for this strategy, or `None` when it does not apply
    pub fn build(&self, title: &str, year: Option<&str>) -> Option<(String, Option<String>)> {
        let words: Vec<&str> = title.split_whitespace().collect();
        match self {
            QueryStrategy::TitleWithYear => year.map(|year| (title.to_string(), Some(year.to_string()))),
            QueryStrategy::TitleOnly => Some((title.to_string(), None)),
            QueryStrategy::CleanedTitle => {
                let cleaned = strip_technical_suffix(title);
                (cleaned != title && !cleaned.is_empty()).then_some((cleaned, None))
            }
            QueryStrategy::DropFirstWord if words.len() > 1 => Some((words[1..].join(" "), None)),
            QueryStrategy::DropLastWord if words.len() > 1 => Some((words[..words.len() - 1].join(" "), None)),
            _ => None,
        }
    }
}

/// Counters kept over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Distinct titles resolved
    pub titles: usize,
    /// Queries sent to the lookup service
    pub queries_issued: usize,
    /// Repeated titles answered from the in-run memo
    pub memo_hits: usize,
    /// Titles answered from the persistent cache
    pub cache_hits: usize,
    pub matched: usize,
    pub unmatched: usize,
}

/// Resolves titles to metadata, memoized per normalized title for one run
pub struct MetadataResolver {
    lookup: Option<Box<dyn CatalogLookup>>,
    disk_cache: Option<LookupCacheManager>,
    memo: HashMap<String, MetadataRecord>,
    query_timeout: Duration,
    word_dropping: bool,
    language: String,
    include_adult: bool,
    stats: ResolverStats,
}

impl MetadataResolver {
    /// Create a resolver; `None` disables lookups for the whole run
    pub fn new(lookup: Option<Box<dyn CatalogLookup>>, config: &LookupConfig) -> Self {
        if let Some(ref lookup) = lookup {
            info!("🔎 Metadata lookups enabled via {}", lookup.name());
        }

        Self {
            lookup,
            disk_cache: None,
            memo: HashMap::new(),
            query_timeout: Duration::from_secs(config.timeout_seconds),
            word_dropping: config.word_dropping,
            language: config.language.clone(),
            include_adult: config.include_adult,
            stats: ResolverStats::default(),
        }
    }

    /// A resolver that never queries and yields unmatched records
    pub fn disabled() -> Self {
        Self::new(None, &LookupConfig::default())
    }

    /// Attach a persistent cache consulted before querying
    pub fn with_disk_cache(mut self, cache: LookupCacheManager) -> Self {
        self.disk_cache = Some(cache);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.lookup.is_some()
    }

    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// Resolve a title, querying at most once per distinct title per run
    pub async fn resolve(&mut self, title: &str, year: Option<&str>) -> MetadataRecord {
        if let Some(record) = self.memo.get(title) {
            self.stats.memo_hits += 1;
            return record.clone();
        }

        let record = self.resolve_uncached(title, year).await;
        self.stats.titles += 1;
        if record.is_match() {
            self.stats.matched += 1;
        } else {
            self.stats.unmatched += 1;
        }
        self.memo.insert(title.to_string(), record.clone());
        record
    }

    async fn resolve_uncached(&mut self, title: &str, year: Option<&str>) -> MetadataRecord {
        let Some(lookup) = self.lookup.as_deref() else {
            return MetadataRecord::unmatched();
        };

        if let Some(cache) = &self.disk_cache {
            if let Some(record) = cache.load_cached(title).await {
                self.stats.cache_hits += 1;
                return record;
            }
        }

        let mut tried: Vec<(String, Option<String>)> = Vec::new();
        for strategy in QueryStrategy::ORDER {
            if strategy.is_word_dropping() && !self.word_dropping {
                continue;
            }
            let Some(built) = strategy.build(title, year) else {
                continue;
            };
            if tried.contains(&built) {
                continue;
            }
            tried.push(built.clone());

            let query = SearchQuery {
                query: built.0,
                year: built.1,
                include_adult: self.include_adult,
                language: self.language.clone(),
            };

            self.stats.queries_issued += 1;
            let outcome = tokio::time::timeout(self.query_timeout, lookup.search(&query))
                .await
                .unwrap_or(Err(CatalogError::Timeout(self.query_timeout)));
            let candidates = match outcome {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("Lookup '{}' for {:?} failed: {}", strategy.label(), query.query, e);
                    continue;
                }
            };

            let Some(first) = candidates.into_iter().next() else {
                debug!("No results for '{}' query {:?}", strategy.label(), query.query);
                continue;
            };

            let record = to_record(lookup, first);
            info!("🎬 Matched {:?} via '{}' query {:?}", title, strategy.label(), query.query);

            if let Some(cache) = &self.disk_cache {
                if let Err(e) = cache.save_cached(title, &record).await {
                    warn!("Failed to cache metadata for {}: {}", title, e);
                }
            }
            return record;
        }

        debug!("No metadata found for {:?} after {} queries", title, tried.len());
        MetadataRecord::unmatched()
    }
}

fn to_record(lookup: &dyn CatalogLookup, candidate: CatalogCandidate) -> MetadataRecord {
    MetadataRecord {
        poster_url: candidate
            .poster_path
            .filter(|path| !path.is_empty())
            .map(|path| lookup.poster_url(&path)),
        overview: candidate.overview.filter(|overview| !overview.trim().is_empty()),
        rating: candidate.vote_average,
    }
}
