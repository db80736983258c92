//! Prometheus metrics for fetches, dropped rows and cache behaviour.
//!
//! Recording is a no-op until [`init_metrics`] installs the recorder.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

/// Install the Prometheus recorder; the handle renders the `/metrics` body.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            info!("Prometheus recorder installed");
            Some(handle)
        }
        Err(e) => {
            warn!("Prometheus recorder install failed (possibly already installed): {}", e);
            None
        }
    }
}

pub struct SourceMetrics;

impl SourceMetrics {
    pub fn record_fetch_success(source: &'static str, duration_secs: f64, rows: usize) {
        ::metrics::counter!("contest_source_fetch_success_total", "source" => source).increment(1);
        ::metrics::histogram!("contest_source_fetch_duration_seconds", "source" => source)
            .record(duration_secs);
        ::metrics::gauge!("contest_source_rows", "source" => source).set(rows as f64);
    }

    pub fn record_fetch_error(source: &'static str) {
        ::metrics::counter!("contest_source_fetch_error_total", "source" => source).increment(1);
    }

    pub fn record_row_dropped(source: &'static str, reason: &'static str) {
        ::metrics::counter!("contest_rows_dropped_total", "source" => source, "reason" => reason)
            .increment(1);
    }
}

pub struct CacheMetrics;

impl CacheMetrics {
    pub fn record_hit() {
        ::metrics::counter!("contest_cache_hits_total").increment(1);
    }

    pub fn record_miss() {
        ::metrics::counter!("contest_cache_misses_total").increment(1);
    }

    pub fn record_refresh(contests: usize) {
        ::metrics::counter!("contest_cache_refreshes_total").increment(1);
        ::metrics::gauge!("contest_cache_entries").set(contests as f64);
    }
}
