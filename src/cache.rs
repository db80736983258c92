use crate::aggregator::ContestProvider;
use crate::constants::CACHE_KEY;
use crate::error::Result;
use crate::metrics::CacheMetrics;
use crate::normalize;
use crate::types::ContestRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

/// Source of "now" for freshness checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Persisted cache record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Vec<ContestRecord>,
    /// Epoch milliseconds of the write
    pub timestamp: i64,
}

/// Key/value text storage for cache records. Writes replace the whole value.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>>;
    async fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store
#[derive(Default)]
pub struct InMemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        Ok(values.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key under `dir`
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        // Write then rename so readers never see a partial record
        let tmp = path.with_extension("json.tmp");
        let written = match tokio::fs::write(&tmp, value).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                debug!("Leftover {} not removed: {}", tmp.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// Merged contest list, refreshed at most once per TTL.
///
/// Concurrent misses are not deduplicated; the last refresh to finish wins.
pub struct ContestCache {
    provider: Arc<dyn ContestProvider>,
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
}

impl ContestCache {
    pub fn new(
        provider: Arc<dyn ContestProvider>,
        store: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        ttl_minutes: i64,
    ) -> Self {
        Self {
            provider,
            store,
            clock,
            ttl_ms: ttl_minutes * 60 * 1000,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() - entry.timestamp < self.ttl_ms
    }

    /// Current cache record. Unreadable or corrupt records count as absent.
    pub async fn entry(&self) -> Option<CacheEntry> {
        let raw = match self.store.load(CACHE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed, treating as empty: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Cache record is corrupt, treating as empty: {}", e);
                None
            }
        }
    }

    /// Cached list if fresh, otherwise a full refresh.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Vec<ContestRecord>> {
        let now = self.clock.now();
        if let Some(entry) = self.entry().await {
            if self.is_fresh(&entry, now) {
                CacheMetrics::record_hit();
                debug!(age_ms = now.timestamp_millis() - entry.timestamp, "Serving cached contests");
                // Records written before the list filter existed may still be in there
                return Ok(normalize::retain_listed(entry.data));
            }
            debug!("Cache entry is stale");
        }
        CacheMetrics::record_miss();
        self.refresh().await
    }

    /// Refresh unconditionally and replace the record, even with an empty list.
    ///
    /// Store write failures are logged; the fresh list is still returned.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Vec<ContestRecord>> {
        let data = self.provider.refresh(self.clock.now()).await?;
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now().timestamp_millis(),
        };
        let serialized = serde_json::to_string(&entry)?;
        if let Err(e) = self.store.save(CACHE_KEY, &serialized).await {
            warn!("Cache write failed, serving uncached contests: {}", e);
        }

        CacheMetrics::record_refresh(entry.data.len());
        info!("Cached {} contests", entry.data.len());
        Ok(entry.data)
    }
}
