use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::types::{ContestRecord, ContestSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

/// What a refresh does when one platform cannot be fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole refresh
    #[default]
    FailFast,
    /// Log the failing platform and contribute nothing for it
    SkipFailed,
}

/// Anything that can produce a full, merged contest list
#[async_trait]
pub trait ContestProvider: Send + Sync {
    async fn refresh(&self, now: DateTime<Utc>) -> Result<Vec<ContestRecord>>;
}

/// Concatenate per-platform lists and stable-sort by start time.
pub fn merge(lists: Vec<Vec<ContestRecord>>) -> Vec<ContestRecord> {
    let mut merged: Vec<ContestRecord> = lists.into_iter().flatten().collect();
    merged.sort_by_key(|c| c.start_time);
    merged
}

pub struct Aggregator {
    sources: Vec<Box<dyn ContestSource>>,
    policy: FailurePolicy,
}

impl Aggregator {
    pub fn new(sources: Vec<Box<dyn ContestSource>>, policy: FailurePolicy) -> Self {
        Self { sources, policy }
    }

    /// Run every source concurrently and merge what they return.
    #[instrument(skip(self), fields(sources = self.sources.len(), policy = ?self.policy))]
    pub async fn collect(&self, now: DateTime<Utc>) -> Result<Vec<ContestRecord>> {
        let runs = self
            .sources
            .iter()
            .map(|source| Pipeline::run_source(source.as_ref(), now));
        let results = join_all(runs).await;

        let mut lists = Vec::with_capacity(results.len());
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(run) => lists.push(run.contests),
                Err(e) => match self.policy {
                    FailurePolicy::FailFast => {
                        error!(source = source.source_name(), "Refresh aborted: {}", e);
                        return Err(e.for_site(source.site()));
                    }
                    FailurePolicy::SkipFailed => {
                        warn!(source = source.source_name(), "Skipping failed source: {}", e);
                        lists.push(Vec::new());
                    }
                },
            }
        }

        let merged = merge(lists);
        info!("Aggregated {} contests", merged.len());
        Ok(merged)
    }
}

#[async_trait]
impl ContestProvider for Aggregator {
    async fn refresh(&self, now: DateTime<Utc>) -> Result<Vec<ContestRecord>> {
        self.collect(now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Site;

    fn contest(site: Site, title: &str, start_time: i64) -> ContestRecord {
        ContestRecord {
            site,
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            start_time,
            duration: 0,
        }
    }

    #[test]
    fn merge_sorts_by_start_time_for_any_list_order() {
        let a = vec![contest(Site::AtCoder, "abc", 30), contest(Site::AtCoder, "abc2", 10)];
        let b = vec![contest(Site::Codeforces, "cf", 20)];
        let c = vec![contest(Site::CodeChef, "cc", 5)];

        let orders = [
            vec![a.clone(), b.clone(), c.clone()],
            vec![c.clone(), a.clone(), b.clone()],
            vec![b.clone(), c.clone(), a.clone()],
        ];
        for lists in orders {
            let merged = merge(lists);
            assert_eq!(merged.len(), 4);
            assert!(merged.windows(2).all(|w| w[0].start_time <= w[1].start_time));
        }
    }

    #[test]
    fn merge_keeps_input_order_for_ties() {
        let merged = merge(vec![
            vec![contest(Site::AtCoder, "first", 100)],
            vec![contest(Site::Codeforces, "second", 100)],
            vec![contest(Site::CodeChef, "third", 100)],
        ]);
        let titles: Vec<&str> = merged.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }
}
