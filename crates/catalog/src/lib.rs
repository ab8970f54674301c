mod builtin;
pub mod index;
pub mod matcher;
mod similarity;
mod source;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use snowtrip_core::{CatalogData, Clock, Settings};
use thiserror::Error;
use tracing::{info, warn};

pub use builtin::builtin_catalog;
pub use index::{normalize_key, CatalogIndex};
pub use matcher::{EntityMatcher, MatchResult};
pub use similarity::similarity;
pub use source::{JsonDirCatalogSource, StaticCatalogSource};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("catalog directory has no entities: {}", .0.display())]
    Empty(PathBuf),
    #[error("failed reading catalog file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog source unavailable: {0}")]
    Unavailable(String),
}

/// Where entity data comes from. Implementations may block.
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &str;
    fn fetch(&self) -> Result<CatalogData, CatalogError>;
}

/// The configured source: a JSON directory when one is set, the builtin
/// list otherwise.
pub fn source_from_settings(settings: &Settings) -> Arc<dyn CatalogSource> {
    match &settings.catalog_dir {
        Some(dir) => Arc::new(JsonDirCatalogSource::new(dir.clone())),
        None => Arc::new(StaticCatalogSource::builtin()),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub source: String,
    pub entities: usize,
    pub groups: usize,
    pub loaded_at: Option<DateTime<Utc>>,
    pub refreshes: u64,
    pub fetch_failures: u64,
}

struct CachedIndex {
    index: Arc<CatalogIndex>,
    loaded_at: DateTime<Utc>,
}

/// Time-expiring catalog index.
///
/// Readers get an `Arc` snapshot and never see a partially built index. One
/// caller at a time fetches and rebuilds; the others wait on `refresh` and
/// then re-check freshness before fetching again.
pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
    current: RwLock<Option<CachedIndex>>,
    refresh: Mutex<()>,
    invalidated: AtomicBool,
    refreshes: AtomicU64,
    fetch_failures: AtomicU64,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl: TimeDelta::from_std(ttl).unwrap_or_else(|_| TimeDelta::days(36_500)),
            current: RwLock::new(None),
            refresh: Mutex::new(()),
            invalidated: AtomicBool::new(false),
            refreshes: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn snapshot(&self) -> Arc<CatalogIndex> {
        if let Some(index) = self.fresh() {
            return index;
        }

        let _guard = self.refresh.lock();
        if let Some(index) = self.fresh() {
            return index;
        }

        match self.source.fetch() {
            Ok(data) => {
                let index = Arc::new(CatalogIndex::build(data));
                let loaded_at = self.clock.now();
                *self.current.write() = Some(CachedIndex {
                    index: Arc::clone(&index),
                    loaded_at,
                });
                self.invalidated.store(false, Ordering::Release);
                self.refreshes.fetch_add(1, Ordering::Relaxed);
                info!(
                    source = self.source.name(),
                    entities = index.len(),
                    groups = index.groups().len(),
                    "catalog index rebuilt"
                );
                index
            }
            Err(err) => {
                self.fetch_failures.fetch_add(1, Ordering::Relaxed);
                let fallback = self
                    .current
                    .read()
                    .as_ref()
                    .map(|cached| Arc::clone(&cached.index));
                warn!(
                    source = self.source.name(),
                    error = %err,
                    serving_stale = fallback.is_some(),
                    "catalog fetch failed"
                );
                fallback.unwrap_or_else(|| Arc::new(CatalogIndex::empty()))
            }
        }
    }

    /// Forces the next `snapshot` to refetch. The current index keeps being
    /// served to anyone who already holds it.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }

    /// The current index if it is still fresh. Never fetches.
    pub fn cached(&self) -> Option<Arc<CatalogIndex>> {
        self.fresh()
    }

    /// Whatever was loaded last, fresh or not; an empty index before the
    /// first successful fetch.
    pub fn last_known(&self) -> Arc<CatalogIndex> {
        self.current
            .read()
            .as_ref()
            .map(|cached| Arc::clone(&cached.index))
            .unwrap_or_else(|| Arc::new(CatalogIndex::empty()))
    }

    pub fn stats(&self) -> CatalogStats {
        let current = self.current.read();
        CatalogStats {
            source: self.source.name().to_string(),
            entities: current.as_ref().map_or(0, |cached| cached.index.len()),
            groups: current.as_ref().map_or(0, |cached| cached.index.groups().len()),
            loaded_at: current.as_ref().map(|cached| cached.loaded_at),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
        }
    }

    fn fresh(&self) -> Option<Arc<CatalogIndex>> {
        if self.invalidated.load(Ordering::Acquire) {
            return None;
        }
        let current = self.current.read();
        let cached = current.as_ref()?;
        (self.clock.now() - cached.loaded_at < self.ttl).then(|| Arc::clone(&cached.index))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use chrono::NaiveDate;
    use snowtrip_core::FixedClock;

    use super::*;

    struct FlakySource {
        fetches: AtomicUsize,
        failing: AtomicBool,
        delay: Duration,
    }

    impl FlakySource {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
                delay: Duration::ZERO,
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl CatalogSource for FlakySource {
        fn name(&self) -> &str {
            "flaky"
        }

        fn fetch(&self) -> Result<CatalogData, CatalogError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            if self.failing.load(Ordering::SeqCst) {
                Err(CatalogError::Unavailable("offline".to_string()))
            } else {
                Ok(builtin_catalog())
            }
        }
    }

    fn cache_with(source: Arc<FlakySource>) -> (CatalogCache, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()));
        let cache = CatalogCache::new(source, clock.clone(), Duration::from_secs(60));
        (cache, clock)
    }

    #[test]
    fn serves_cached_index_until_expiry() {
        let source = Arc::new(FlakySource::new());
        let (cache, clock) = cache_with(source.clone());

        let first = cache.snapshot();
        let second = cache.snapshot();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.fetches(), 1);

        clock.advance(TimeDelta::seconds(61));
        let third = cache.snapshot();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(source.fetches(), 2);
    }

    #[test]
    fn invalidate_forces_reload() {
        let source = Arc::new(FlakySource::new());
        let (cache, _clock) = cache_with(source.clone());
        cache.snapshot();
        cache.invalidate();
        cache.snapshot();
        cache.snapshot();
        assert_eq!(source.fetches(), 2);
    }

    #[test]
    fn failure_serves_last_good_index() {
        let source = Arc::new(FlakySource::new());
        let (cache, clock) = cache_with(source.clone());
        let good = cache.snapshot();

        source.failing.store(true, Ordering::SeqCst);
        clock.advance(TimeDelta::seconds(120));
        let served = cache.snapshot();
        assert!(Arc::ptr_eq(&good, &served));
        assert_eq!(cache.stats().fetch_failures, 1);
    }

    #[test]
    fn failure_without_history_serves_empty_and_retries() {
        let source = Arc::new(FlakySource::new());
        source.failing.store(true, Ordering::SeqCst);
        let (cache, _clock) = cache_with(source.clone());

        assert!(cache.snapshot().is_empty());
        assert!(cache.stats().loaded_at.is_none());

        source.failing.store(false, Ordering::SeqCst);
        assert!(!cache.snapshot().is_empty());
        assert_eq!(source.fetches(), 2);
    }

    #[test]
    fn concurrent_readers_share_one_fetch() {
        let source = Arc::new(FlakySource {
            delay: Duration::from_millis(50),
            ..FlakySource::new()
        });
        let (cache, _clock) = cache_with(source.clone());

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    assert!(!cache.snapshot().is_empty());
                });
            }
        });
        assert_eq!(source.fetches(), 1);
    }
}
