use crate::constants::{ATCODER_CONTESTS_URL, ATCODER_ORIGIN};
use crate::error::Result;
use crate::infra::HttpClientPort;
use crate::normalize;
use crate::types::{ContestRecord, ContestSource, RawContestRow, RawDuration, RawStart, Site};
use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const ATCODER_HTML_SOURCE: &str = "atcoder_html";

/// How rows are pulled out of the contest-list page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractStrategy {
    /// DOM walk of `#contest-table-upcoming` with fixed column positions
    #[default]
    Structural,
    /// Anchored regexes over the raw markup
    Pattern,
}

static UPCOMING_ROWS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#contest-table-upcoming tbody tr").expect("rows selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("cell selector"));
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").expect("time selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("link selector"));

static UPCOMING_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div id="contest-table-upcoming".*?</table>"#).expect("upcoming block pattern")
});
static TIME_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<time class="fixtime fixtime-full">([^<]+)</time>"#).expect("time tag pattern")
});
static TITLE_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<td class="text-left">\s*(?:<span[^>]*>[^<]*</span>\s*)*<a href="([^"]+)"[^>]*>([^<]+)</a>"#,
    )
    .expect("title cell pattern")
});
static DURATION_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<td class="text-center">\s*(\d{1,3}:\d{2})\s*</td>"#).expect("duration cell pattern")
});

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Scrapes the public AtCoder contest list
pub struct AtCoderCrawler {
    http: Arc<dyn HttpClientPort>,
    url: String,
    strategy: ExtractStrategy,
}

impl AtCoderCrawler {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self::with_url(http, ATCODER_CONTESTS_URL, ExtractStrategy::default())
    }

    pub fn with_url(http: Arc<dyn HttpClientPort>, url: impl Into<String>, strategy: ExtractStrategy) -> Self {
        Self {
            http,
            url: url.into(),
            strategy,
        }
    }

    fn extract_structural(html: &str) -> Vec<RawContestRow> {
        let document = Html::parse_document(html);
        let mut rows = Vec::new();

        for (index, tr) in document.select(&UPCOMING_ROWS).enumerate() {
            let cells: Vec<ElementRef> = tr.select(&CELL).collect();
            if cells.len() < 3 {
                debug!(row = index, "Skipping row with {} cells", cells.len());
                continue;
            }

            let start = cells[0]
                .select(&TIME)
                .next()
                .map(|t| element_text(&t))
                .filter(|s| !s.is_empty());
            let link = cells[1].select(&LINK).next();
            let title = link.map(|a| element_text(&a)).filter(|s| !s.is_empty());
            let href = link.and_then(|a| a.value().attr("href")).map(str::to_string);
            let duration = Some(element_text(&cells[2])).filter(|s| !s.is_empty());

            match (start, title, href, duration) {
                (Some(start), Some(title), Some(href), Some(duration)) => rows.push(RawContestRow {
                    title,
                    href,
                    start: RawStart::Listing(start),
                    duration: RawDuration::Clock(duration),
                }),
                _ => debug!(row = index, "Skipping row with missing fields"),
            }
        }

        rows
    }

    fn extract_pattern(html: &str) -> Vec<RawContestRow> {
        let Some(block) = UPCOMING_BLOCK.find(html) else {
            info!("No upcoming contests table found");
            return Vec::new();
        };

        // First piece precedes any row, second is the header row
        block
            .as_str()
            .split("<tr")
            .skip(2)
            .enumerate()
            .filter_map(|(index, row)| {
                let start = TIME_TAG.captures(row).map(|c| c[1].trim().to_string());
                let link = TITLE_CELL.captures(row);
                let duration = DURATION_CELL.captures(row).map(|c| c[1].to_string());

                match (start, link, duration) {
                    (Some(start), Some(link), Some(duration)) => Some(RawContestRow {
                        title: decode_html_entities(link[2].trim()).into_owned(),
                        href: decode_html_entities(&link[1]).into_owned(),
                        start: RawStart::Listing(start),
                        duration: RawDuration::Clock(duration),
                    }),
                    _ => {
                        debug!(row = index, "Skipping row with missing fields");
                        None
                    }
                }
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ContestSource for AtCoderCrawler {
    fn site(&self) -> Site {
        Site::AtCoder
    }

    fn source_name(&self) -> &'static str {
        ATCODER_HTML_SOURCE
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_raw(&self) -> Result<String> {
        self.http.get_text(&self.url).await
    }

    fn extract_rows(&self, raw: &str) -> Result<Vec<RawContestRow>> {
        let rows = match self.strategy {
            ExtractStrategy::Structural => Self::extract_structural(raw),
            ExtractStrategy::Pattern => Self::extract_pattern(raw),
        };
        if rows.is_empty() {
            warn!("No upcoming AtCoder contests found - the page structure may have changed");
        }
        Ok(rows)
    }

    fn normalize_row(&self, row: &RawContestRow, now: DateTime<Utc>) -> Result<ContestRecord> {
        normalize::normalize_row(Site::AtCoder, ATCODER_ORIGIN, row, now)
    }
}
