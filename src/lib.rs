//! Upcoming competitive-programming contests from AtCoder, Codeforces and CodeChef.
//!
//! Sources are fetched and normalized per platform ([`pipeline`]), merged by
//! start time ([`aggregator`]), cached with a TTL ([`cache`]) and served as
//! JSON ([`server`]) or announcement text ([`announce`]).

pub mod aggregator;
pub mod announce;
pub mod apis;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod infra;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod server;
pub mod types;

use crate::aggregator::Aggregator;
use crate::cache::{CacheStore, ContestCache, FileStore, InMemoryStore, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::infra::{HttpClientPort, ReqwestHttp};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use crate::types::{ContestRecord, ContestSource, Site};

/// Wire the configured sources, aggregator, store and clock into a cache.
pub fn build_cache(config: &Config) -> Result<ContestCache> {
    let http: Arc<dyn HttpClientPort> =
        Arc::new(ReqwestHttp::new(Duration::from_secs(config.http.timeout_seconds))?);
    let sources = apis::create_sources(config, http)?;
    let aggregator = Aggregator::new(sources, config.aggregator.failure_policy);

    let store: Arc<dyn CacheStore> = match &config.cache.dir {
        Some(dir) => {
            info!("Caching contests under {}", dir.display());
            Arc::new(FileStore::new(dir.clone()))
        }
        None => Arc::new(InMemoryStore::new()),
    };

    Ok(ContestCache::new(
        Arc::new(aggregator),
        store,
        Arc::new(SystemClock),
        config.cache.ttl_minutes,
    ))
}
