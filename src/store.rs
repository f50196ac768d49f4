//! The corpus loader: owns the in-memory [`CorpusIndex`] and its snapshot.
//!
//! # Load Order
//!
//! 1. In-memory index present (and not older than `cache.max_age_secs`) → return it.
//! 2. Cache Snapshot readable and fresh → adopt it, aged by its file mtime.
//! 3. Otherwise fetch the source page, extract, append configured extra
//!    entries, persist the snapshot (failures only logged), adopt.
//! 4. If that fetch fails, fall back to the expired in-memory index or the
//!    expired snapshot before giving up.
//!
//! A single async mutex guards steps 2–3, so concurrent first callers share
//! one fetch: late arrivals wait on the lock and then find the index
//! populated. Readers of a populated index only clone an `Arc` under a short
//! read lock; refreshes swap the whole `Arc`, never mutate in place.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache;
use crate::config::{Config, ExtraEntry, ExtractionConfig};
use crate::error::FetchError;
use crate::extract::{extract_entries, strategies_from_config, ExtractionStrategy};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::models::{CorpusIndex, FaqEntry};

pub struct CorpusStore {
    source_url: String,
    cache_path: PathBuf,
    max_age: Option<Duration>,
    extraction: ExtractionConfig,
    extra_entries: Vec<ExtraEntry>,
    fetcher: Arc<dyn PageFetcher>,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    index: RwLock<Option<Arc<CorpusIndex>>>,
    load_lock: Mutex<()>,
}

impl CorpusStore {
    /// Build a store with an explicit fetcher.
    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            source_url: config.source.url.clone(),
            cache_path: config.cache.path.clone(),
            max_age: config.cache.max_age(),
            extraction: config.extraction.clone(),
            extra_entries: config.extra_entries.clone(),
            fetcher,
            strategies: strategies_from_config(&config.extraction),
            index: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    /// Build a store that fetches over HTTP.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(&config.source)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Whether an unexpired index is currently held in memory.
    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// Return the corpus index, populating it at most once.
    ///
    /// When an expired index or snapshot exists and the refetch fails, the
    /// stale corpus keeps being served and its expiry clock restarts, so
    /// the source is retried at most once per `max_age`. `FetchError` is
    /// returned only when there is nothing to fall back to.
    pub async fn load(&self) -> Result<Arc<CorpusIndex>, FetchError> {
        if let Some(index) = self.current() {
            return Ok(index);
        }

        let _guard = self.load_lock.lock().await;
        // Another caller may have populated the index while we waited.
        if let Some(index) = self.current() {
            return Ok(index);
        }

        let snapshot = match cache::read_snapshot(&self.cache_path) {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => {
                debug!(path = %self.cache_path.display(), "cache miss");
                None
            }
            Err(e) => {
                warn!(
                    path = %self.cache_path.display(),
                    error = %e,
                    "ignoring unreadable cache snapshot"
                );
                None
            }
        };

        let snapshot = match snapshot {
            Some(snapshot) if !snapshot.is_expired(self.max_age) => {
                let index = Arc::new(CorpusIndex::with_age(snapshot.entries, snapshot.age));
                info!(
                    path = %self.cache_path.display(),
                    entries = index.len(),
                    "loaded FAQ corpus from cache"
                );
                self.swap(Some(index.clone()));
                return Ok(index);
            }
            Some(snapshot) => {
                debug!(path = %self.cache_path.display(), "cache snapshot expired");
                Some(snapshot)
            }
            None => None,
        };

        let err = match self.fetch_and_persist().await {
            Ok(index) => return Ok(index),
            Err(e) => e,
        };

        let stale = self
            .held()
            .map(|index| index.entries().to_vec())
            .or_else(|| snapshot.map(|s| s.entries));
        match stale {
            Some(entries) => {
                let index = Arc::new(CorpusIndex::new(entries));
                warn!(
                    error = %err,
                    entries = index.len(),
                    "FAQ source unreachable, serving stale corpus"
                );
                self.swap(Some(index.clone()));
                Ok(index)
            }
            None => Err(err),
        }
    }

    /// Fetch from the source regardless of cache state and replace the index.
    pub async fn refresh(&self) -> Result<Arc<CorpusIndex>, FetchError> {
        let _guard = self.load_lock.lock().await;
        self.fetch_and_persist().await
    }

    /// Drop the in-memory index; the next [`load`](Self::load) re-reads cache or network.
    pub fn invalidate(&self) {
        self.swap(None);
        debug!("FAQ corpus invalidated");
    }

    fn current(&self) -> Option<Arc<CorpusIndex>> {
        let guard = self.index.read().unwrap_or_else(PoisonError::into_inner);
        let index = guard.as_ref()?;
        match self.max_age {
            Some(max_age) if index.age() > max_age => None,
            _ => Some(index.clone()),
        }
    }

    /// The in-memory index regardless of age.
    fn held(&self) -> Option<Arc<CorpusIndex>> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn swap(&self, index: Option<Arc<CorpusIndex>>) {
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = index;
    }

    async fn fetch_and_persist(&self) -> Result<Arc<CorpusIndex>, FetchError> {
        info!(url = %self.source_url, "fetching FAQ source page");
        let page = self.fetcher.fetch(&self.source_url).await?;

        let mut entries = extract_entries(&page.body, &page.url, &self.strategies, &self.extraction);
        entries.extend(self.extra_entries.iter().map(|extra| FaqEntry {
            id: 0,
            question: extra.question.clone(),
            answer: extra.answer.clone(),
            source_url: extra.url.clone().unwrap_or_else(|| self.source_url.clone()),
        }));

        let index = Arc::new(CorpusIndex::new(entries));

        if let Err(e) = cache::write_snapshot(&self.cache_path, index.entries()) {
            warn!(
                path = %self.cache_path.display(),
                error = %e,
                "failed to persist FAQ cache snapshot"
            );
        }

        info!(entries = index.len(), "FAQ corpus ready");
        self.swap(Some(index.clone()));
        Ok(index)
    }
}
