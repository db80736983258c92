use crate::error::Result;
use crate::metrics::SourceMetrics;
use crate::normalize;
use crate::types::{ContestRecord, ContestSource, Site};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Result of one source run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub source: String,
    pub site: Site,
    pub total_rows: usize,
    pub processed_rows: usize,
    /// Rows dropped by the contest-list title filter
    pub filtered_rows: usize,
    /// One message per row dropped for malformed fields
    pub errors: Vec<String>,
    pub contests: Vec<ContestRecord>,
}

pub struct Pipeline;

impl Pipeline {
    /// Fetch, extract and normalize one source.
    ///
    /// Fetch and whole-document failures propagate. Row-level problems are
    /// logged, counted and skipped.
    #[instrument(skip(source), fields(source = source.source_name()))]
    pub async fn run_source(source: &dyn ContestSource, now: DateTime<Utc>) -> Result<PipelineResult> {
        let name = source.source_name();
        let started = Instant::now();

        let raw = match source.fetch_raw().await {
            Ok(raw) => raw,
            Err(e) => {
                SourceMetrics::record_fetch_error(name);
                warn!("Fetch failed: {}", e);
                return Err(e);
            }
        };
        debug!("Fetched {} bytes", raw.len());

        let rows = source.extract_rows(&raw).map_err(|e| {
            SourceMetrics::record_fetch_error(name);
            e
        })?;

        let mut result = PipelineResult {
            source: name.to_string(),
            site: source.site(),
            total_rows: rows.len(),
            processed_rows: 0,
            filtered_rows: 0,
            errors: Vec::new(),
            contests: Vec::with_capacity(rows.len()),
        };

        for row in &rows {
            match source.normalize_row(row, now) {
                Ok(record) if normalize::is_listed(&record) => {
                    result.processed_rows += 1;
                    result.contests.push(record);
                }
                Ok(record) => {
                    debug!(title = %record.title, "Skipping contest outside the list filter");
                    SourceMetrics::record_row_dropped(name, "filtered");
                    result.filtered_rows += 1;
                }
                Err(e) => {
                    warn!(title = %row.title, "Dropping row: {}", e);
                    SourceMetrics::record_row_dropped(name, "malformed");
                    result.errors.push(format!("{}: {}", row.title, e));
                }
            }
        }

        SourceMetrics::record_fetch_success(name, started.elapsed().as_secs_f64(), result.processed_rows);
        info!(
            total = result.total_rows,
            processed = result.processed_rows,
            filtered = result.filtered_rows,
            errors = result.errors.len(),
            "Source finished"
        );
        Ok(result)
    }
}
