//! Conversion of raw listing fields into canonical values.
//!
//! Every parser returns [`ScraperError::Parse`] on malformed input; the
//! pipeline drops the offending row and keeps going.

use crate::constants::{BEGINNER_MARKER, JST_OFFSET_SECS};
use crate::error::{Result, ScraperError};
use crate::types::{ContestRecord, RawContestRow, RawDuration, RawStart, Site};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

static LEGACY_LISTING_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})\([A-Za-z]{3}\)\s+(\d{1,2}):(\d{2})$")
        .expect("legacy listing time pattern")
});

/// "H:MM" to milliseconds: `(H * 60 + M) * 60 * 1000`.
pub fn parse_clock_duration(text: &str) -> Result<i64> {
    let malformed = || ScraperError::Parse(format!("malformed duration '{text}'"));

    let (hours, minutes) = text.trim().split_once(':').ok_or_else(malformed)?;
    if hours.is_empty() || minutes.len() != 2 {
        return Err(malformed());
    }
    let hours: i64 = hours.parse().map_err(|_| malformed())?;
    let minutes: i64 = minutes.parse().map_err(|_| malformed())?;
    if hours < 0 || !(0..60).contains(&minutes) {
        return Err(malformed());
    }

    hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60 * 1000))
        .ok_or_else(|| ScraperError::Parse(format!("duration '{text}' out of range")))
}

pub fn seconds_to_millis(seconds: i64) -> Result<i64> {
    if seconds < 0 {
        return Err(ScraperError::Parse(format!("negative duration {seconds}s")));
    }
    seconds
        .checked_mul(1000)
        .ok_or_else(|| ScraperError::Parse(format!("duration {seconds}s out of range")))
}

/// Resolve a contest link against the platform origin. Absolute links pass through.
pub fn absolute_url(origin: &str, href: &str) -> Result<String> {
    let href = href.trim();
    if href.is_empty() {
        return Err(ScraperError::Parse("missing contest link".into()));
    }
    let base = Url::parse(origin)
        .map_err(|e| ScraperError::Parse(format!("invalid origin '{origin}': {e}")))?;
    let joined = base
        .join(href)
        .map_err(|e| ScraperError::Parse(format!("invalid contest link '{href}': {e}")))?;
    Ok(joined.to_string())
}

fn jst() -> Result<FixedOffset> {
    FixedOffset::east_opt(JST_OFFSET_SECS)
        .ok_or_else(|| ScraperError::Config(format!("invalid JST offset {JST_OFFSET_SECS}s")))
}

/// Parse an AtCoder listing start time into epoch milliseconds.
///
/// Accepts the full form rendered inside `<time class="fixtime">`
/// (`2025-02-01 21:00:00+0900`) and the short client-side form
/// (`2/1(Sat) 21:00`). The short form carries no year, so the current
/// calendar year in JST is assumed.
pub fn parse_listing_start(text: &str, now: DateTime<Utc>) -> Result<i64> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(dt.timestamp_millis());
    }

    let caps = LEGACY_LISTING_TIME
        .captures(text)
        .ok_or_else(|| ScraperError::Parse(format!("unrecognized start time '{text}'")))?;
    let field = |i: usize| -> Result<u32> {
        caps[i]
            .parse()
            .map_err(|_| ScraperError::Parse(format!("unrecognized start time '{text}'")))
    };
    let (month, day, hour, minute) = (field(1)?, field(2)?, field(3)?, field(4)?);

    let jst = jst()?;
    let year = now.with_timezone(&jst).year();
    let local = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| ScraperError::Parse(format!("start time '{text}' is not a valid date")))?;

    jst.from_local_datetime(&local)
        .single()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| ScraperError::Parse(format!("start time '{text}' is ambiguous")))
}

/// Parse an aggregator timestamp. Naive values are UTC.
pub fn parse_iso_start(text: &str) -> Result<i64> {
    let text = text.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive).timestamp_millis());
    }
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| ScraperError::Parse(format!("invalid timestamp '{text}': {e}")))
}

pub fn is_beginner_title(title: &str) -> bool {
    title.to_lowercase().contains(BEGINNER_MARKER)
}

/// Contest-list filter: AtCoder only keeps beginner contests.
pub fn is_listed(record: &ContestRecord) -> bool {
    record.site != Site::AtCoder || is_beginner_title(&record.title)
}

pub fn retain_listed(records: Vec<ContestRecord>) -> Vec<ContestRecord> {
    let before = records.len();
    let kept: Vec<ContestRecord> = records.into_iter().filter(is_listed).collect();
    if kept.len() != before {
        debug!("Filtered out {} non-beginner AtCoder contests", before - kept.len());
    }
    kept
}

/// Shared row normalization used by every source adapter.
pub fn normalize_row(
    site: Site,
    origin: &str,
    row: &RawContestRow,
    now: DateTime<Utc>,
) -> Result<ContestRecord> {
    let title = row.title.trim();
    if title.is_empty() {
        return Err(ScraperError::Parse("missing contest title".into()));
    }

    let start_time = match &row.start {
        RawStart::Listing(text) => parse_listing_start(text, now)?,
        RawStart::Iso(text) => parse_iso_start(text)?,
    };
    let duration = match &row.duration {
        RawDuration::Clock(text) => parse_clock_duration(text)?,
        RawDuration::Seconds(secs) => seconds_to_millis(*secs)?,
    };
    let url = absolute_url(origin, &row.href)?;

    Ok(ContestRecord {
        site,
        title: title.to_string(),
        url,
        start_time,
        duration,
    })
}
