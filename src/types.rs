use crate::error::{Result, ScraperError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platforms we track contests for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Site {
    AtCoder,
    Codeforces,
    CodeChef,
}

impl Site {
    pub const ALL: [Site; 3] = [Site::AtCoder, Site::Codeforces, Site::CodeChef];

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::AtCoder => "atcoder",
            Site::Codeforces => "codeforces",
            Site::CodeChef => "codechef",
        }
    }

    /// Human label, as the platforms spell themselves
    pub fn label(&self) -> &'static str {
        match self {
            Site::AtCoder => "AtCoder",
            Site::Codeforces => "Codeforces",
            Site::CodeChef => "CodeChef",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "atcoder" => Ok(Site::AtCoder),
            "codeforces" => Ok(Site::Codeforces),
            "codechef" => Ok(Site::CodeChef),
            other => Err(ScraperError::Parse(format!("unknown site '{other}'"))),
        }
    }
}

impl TryFrom<String> for Site {
    type Error = ScraperError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Canonical contest record handed to the cache, server and announcer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestRecord {
    pub site: Site,
    pub title: String,
    pub url: String,
    /// Epoch milliseconds, UTC
    pub start_time: i64,
    /// Milliseconds
    pub duration: i64,
}

/// Start time exactly as the upstream rendered it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawStart {
    /// Listing text such as "2025-02-01 21:00:00+0900" or "2/1(Sat) 21:00"
    Listing(String),
    /// Naive ISO-8601 timestamp in UTC, e.g. "2025-02-01T12:00:00"
    Iso(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDuration {
    /// "H:MM"
    Clock(String),
    Seconds(i64),
}

/// One row pulled out of a listing before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContestRow {
    pub title: String,
    pub href: String,
    pub start: RawStart,
    pub duration: RawDuration,
}

/// Core trait every contest source implements.
///
/// A refresh of one source is `fetch_raw` then `extract_rows` then
/// `normalize_row` per row; see [`crate::pipeline::Pipeline`].
#[async_trait::async_trait]
pub trait ContestSource: Send + Sync {
    /// Platform whose contests this source yields
    fn site(&self) -> Site;

    /// Unique identifier for this source, used in logs and metrics
    fn source_name(&self) -> &'static str;

    /// Fetch the raw listing (HTML or JSON text)
    async fn fetch_raw(&self) -> Result<String>;

    /// Pull raw rows out of a fetched listing. Rows missing a field are skipped,
    /// a listing without an upcoming section yields an empty vector.
    fn extract_rows(&self, raw: &str) -> Result<Vec<RawContestRow>>;

    /// Convert one raw row into a canonical record
    fn normalize_row(&self, row: &RawContestRow, now: DateTime<Utc>) -> Result<ContestRecord>;
}
