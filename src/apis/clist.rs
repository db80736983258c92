use crate::constants::{
    CLIST_ATCODER_RESOURCE_ID, CLIST_CODECHEF_RESOURCE_ID, CLIST_CODEFORCES_RESOURCE_ID,
    CLIST_CONTEST_PATH, CODECHEF_ORIGIN, CODEFORCES_ORIGIN, ATCODER_ORIGIN,
};
use crate::error::{Result, ScraperError};
use crate::infra::HttpClientPort;
use crate::normalize;
use crate::types::{ContestRecord, ContestSource, RawContestRow, RawDuration, RawStart, Site};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

#[derive(Debug, Deserialize)]
struct ContestPage {
    objects: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ClistContest {
    event: String,
    href: String,
    start: String,
    duration: i64,
}

/// Credentials and endpoint for the clist.by v1 API
#[derive(Debug, Clone)]
pub struct ClistAccount {
    pub base_url: String,
    pub username: String,
    pub api_key: String,
}

pub fn resource_id(site: Site) -> u32 {
    match site {
        Site::AtCoder => CLIST_ATCODER_RESOURCE_ID,
        Site::Codeforces => CLIST_CODEFORCES_RESOURCE_ID,
        Site::CodeChef => CLIST_CODECHEF_RESOURCE_ID,
    }
}

fn origin(site: Site) -> &'static str {
    match site {
        Site::AtCoder => ATCODER_ORIGIN,
        Site::Codeforces => CODEFORCES_ORIGIN,
        Site::CodeChef => CODECHEF_ORIGIN,
    }
}

/// Upcoming contests of one platform, via the clist.by aggregator
pub struct ClistCrawler {
    http: Arc<dyn HttpClientPort>,
    account: ClistAccount,
    site: Site,
}

impl ClistCrawler {
    pub fn new(http: Arc<dyn HttpClientPort>, account: ClistAccount, site: Site) -> Self {
        Self { http, account, site }
    }

    /// Contests that have not ended by `now`
    pub fn query_url(&self, now: DateTime<Utc>) -> Result<String> {
        let end_gt = now.format("%Y-%m-%dT%H:%M:%S").to_string();
        let resource = resource_id(self.site).to_string();
        let endpoint = format!("{}{}", self.account.base_url.trim_end_matches('/'), CLIST_CONTEST_PATH);

        let url = Url::parse_with_params(
            &endpoint,
            &[
                ("username", self.account.username.as_str()),
                ("api_key", self.account.api_key.as_str()),
                ("resource__id", resource.as_str()),
                ("end__gt", end_gt.as_str()),
            ],
        )
        .map_err(|e| ScraperError::Config(format!("invalid clist base url '{endpoint}': {e}")))?;
        Ok(url.to_string())
    }
}

#[async_trait::async_trait]
impl ContestSource for ClistCrawler {
    fn site(&self) -> Site {
        self.site
    }

    fn source_name(&self) -> &'static str {
        match self.site {
            Site::AtCoder => "clist_atcoder",
            Site::Codeforces => "clist_codeforces",
            Site::CodeChef => "clist_codechef",
        }
    }

    #[instrument(skip(self), fields(site = %self.site))]
    async fn fetch_raw(&self) -> Result<String> {
        let url = self.query_url(Utc::now())?;
        self.http.get_text(&url).await
    }

    fn extract_rows(&self, raw: &str) -> Result<Vec<RawContestRow>> {
        let page: ContestPage = serde_json::from_str(raw)?;
        let total = page.objects.len();

        let rows: Vec<RawContestRow> = page
            .objects
            .into_iter()
            .filter_map(|obj| match serde_json::from_value::<ClistContest>(obj) {
                Ok(c) => Some(RawContestRow {
                    title: c.event,
                    href: c.href,
                    start: RawStart::Iso(c.start),
                    duration: RawDuration::Seconds(c.duration),
                }),
                Err(e) => {
                    debug!("Skipping clist object: {}", e);
                    None
                }
            })
            .collect();

        info!("Extracted {} of {} clist objects for {}", rows.len(), total, self.site);
        Ok(rows)
    }

    fn normalize_row(&self, row: &RawContestRow, now: DateTime<Utc>) -> Result<ContestRecord> {
        normalize::normalize_row(self.site, origin(self.site), row, now)
    }
}
