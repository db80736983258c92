use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use contest_scraper::aggregator::{Aggregator, FailurePolicy};
use contest_scraper::apis::{AtCoderCrawler, ClistAccount, ClistCrawler, ExtractStrategy};
use contest_scraper::error::{Result, ScraperError};
use contest_scraper::infra::HttpClientPort;
use contest_scraper::pipeline::Pipeline;
use contest_scraper::{ContestSource, Site};
use std::collections::HashMap;
use std::sync::Arc;

/// Serves canned bodies keyed by URL prefix; anything else is a 503.
struct StubHttp {
    bodies: HashMap<&'static str, &'static str>,
}

impl StubHttp {
    fn new(bodies: &[(&'static str, &'static str)]) -> Arc<Self> {
        Arc::new(Self {
            bodies: bodies.iter().copied().collect(),
        })
    }
}

#[async_trait]
impl HttpClientPort for StubHttp {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.bodies
            .iter()
            .find(|(prefix, _)| url.starts_with(*prefix))
            .map(|(_, body)| body.to_string())
            .ok_or_else(|| ScraperError::Status {
                url: url.to_string(),
                status: 503,
            })
    }
}

const ATCODER_URL: &str = "https://atcoder.jp/contests";
const CLIST_URL: &str = "https://clist.by/api/v1/contest/";

const ATCODER_PAGE: &str = r##"<!DOCTYPE html><html><body>
<div id="contest-table-upcoming">
<table class="table">
<thead><tr><th>Start Time</th><th>Contest Name</th><th>Duration</th><th>Rated Range</th></tr></thead>
<tbody>
<tr>
<td class="text-center"><a href="#"><time class="fixtime fixtime-full">2025-02-08 21:00:00+0900</time></a></td>
<td class="text-left"><a href="/contests/abc392">AtCoder Beginner Contest 392</a></td>
<td class="text-center">1:40</td>
<td class="text-center"> - 1999</td>
</tr>
<tr>
<td class="text-center"><a href="#"><time class="fixtime fixtime-full">2025-02-01 21:00:00+0900</time></a></td>
<td class="text-left"><a href="/contests/abc391">AtCoder Beginner Contest 391</a></td>
<td class="text-center">1:40</td>
<td class="text-center"> - 1999</td>
</tr>
<tr>
<td class="text-center"><a href="#"><time class="fixtime fixtime-full">2025-02-02 21:00:00+0900</time></a></td>
<td class="text-left"><a href="/contests/arc192">AtCoder Regular Contest 192</a></td>
<td class="text-center">2:00</td>
<td class="text-center">1200 - 2399</td>
</tr>
<tr>
<td class="text-center"><a href="#"><time class="fixtime fixtime-full">2025-02-03 21:00:00+0900</time></a></td>
<td class="text-left"><a href="/contests/abc999">AtCoder Beginner Contest 999</a></td>
<td class="text-center">1:40</td>
<td class="text-center"> - 1999</td>
</tr>
</tbody>
</table>
</div>
</body></html>"##;

const CLIST_CODEFORCES: &str = r#"{"objects":[
    {"event":"Codeforces Round 1002 (Div. 2)","href":"https://codeforces.com/contests/2059","start":"2025-02-01T12:00:00","duration":7200},
    {"event":"Codeforces Round 1003 (Div. 4)","href":"https://codeforces.com/contests/2060","start":"2025-02-04T14:35:00","duration":8400}
]}"#;

fn account() -> ClistAccount {
    ClistAccount {
        base_url: "https://clist.by".into(),
        username: "tester".into(),
        api_key: "key".into(),
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 25, 0, 0, 0).unwrap()
}

#[tokio::test]
async fn atcoder_pipeline_filters_and_normalizes() -> Result<()> {
    let http = StubHttp::new(&[(ATCODER_URL, ATCODER_PAGE)]);

    for strategy in [ExtractStrategy::Structural, ExtractStrategy::Pattern] {
        let crawler = AtCoderCrawler::with_url(http.clone(), ATCODER_URL, strategy);
        let result = Pipeline::run_source(&crawler, now()).await?;

        assert_eq!(result.total_rows, 4);
        assert_eq!(result.filtered_rows, 1, "regular contest is filtered");
        assert_eq!(result.processed_rows, 3);
        assert!(result.errors.is_empty());
        assert!(result
            .contests
            .iter()
            .all(|c| c.site == Site::AtCoder && c.title.contains("Beginner")));
        assert_eq!(result.contests[1].url, "https://atcoder.jp/contests/abc391");
        assert_eq!(result.contests[1].duration, 6_000_000);
    }
    Ok(())
}

#[tokio::test]
async fn malformed_rows_are_dropped_not_fatal() -> Result<()> {
    let body = r#"{"objects":[
        {"event":"Good","href":"https://codeforces.com/contests/1","start":"2025-02-01T12:00:00","duration":7200},
        {"event":"Bad start","href":"https://codeforces.com/contests/2","start":"soon","duration":7200},
        {"event":"Negative","href":"https://codeforces.com/contests/3","start":"2025-02-01T12:00:00","duration":-5}
    ]}"#;
    let http = StubHttp::new(&[(CLIST_URL, body)]);
    let crawler = ClistCrawler::new(http, account(), Site::Codeforces);

    let result = Pipeline::run_source(&crawler, now()).await?;
    assert_eq!(result.processed_rows, 1);
    assert_eq!(result.errors.len(), 2);
    Ok(())
}

#[tokio::test]
async fn aggregate_is_sorted_across_platforms() -> Result<()> {
    let http = StubHttp::new(&[(ATCODER_URL, ATCODER_PAGE), (CLIST_URL, CLIST_CODEFORCES)]);
    let sources: Vec<Box<dyn ContestSource>> = vec![
        Box::new(AtCoderCrawler::with_url(http.clone(), ATCODER_URL, ExtractStrategy::Structural)),
        Box::new(ClistCrawler::new(http.clone(), account(), Site::Codeforces)),
    ];
    let aggregator = Aggregator::new(sources, FailurePolicy::FailFast);

    let merged = aggregator.collect(now()).await?;
    assert_eq!(merged.len(), 5);
    assert!(merged.windows(2).all(|w| w[0].start_time <= w[1].start_time));

    // abc391 and the Codeforces round both start 2025-02-01 12:00 UTC; AtCoder was listed first
    assert_eq!(merged[0].title, "AtCoder Beginner Contest 391");
    assert_eq!(merged[1].title, "Codeforces Round 1002 (Div. 2)");
    Ok(())
}

#[tokio::test]
async fn fail_fast_fails_the_whole_refresh() {
    // No clist body registered: the Codeforces source gets a 503
    let http = StubHttp::new(&[(ATCODER_URL, ATCODER_PAGE)]);
    let sources: Vec<Box<dyn ContestSource>> = vec![
        Box::new(AtCoderCrawler::new(http.clone())),
        Box::new(ClistCrawler::new(http.clone(), account(), Site::Codeforces)),
    ];

    let err = Aggregator::new(sources, FailurePolicy::FailFast)
        .collect(now())
        .await
        .unwrap_err();
    assert!(err.is_network());
    assert!(matches!(err, ScraperError::Source { site: Site::Codeforces, .. }));
}

#[tokio::test]
async fn skip_failed_returns_the_other_platforms() -> Result<()> {
    let http = StubHttp::new(&[(ATCODER_URL, ATCODER_PAGE)]);
    let sources: Vec<Box<dyn ContestSource>> = vec![
        Box::new(AtCoderCrawler::new(http.clone())),
        Box::new(ClistCrawler::new(http.clone(), account(), Site::CodeChef)),
    ];

    let merged = Aggregator::new(sources, FailurePolicy::SkipFailed).collect(now()).await?;
    assert_eq!(merged.len(), 3);
    assert!(merged.iter().all(|c| c.site == Site::AtCoder));
    Ok(())
}

#[tokio::test]
async fn page_without_upcoming_section_is_empty() -> Result<()> {
    let http = StubHttp::new(&[(ATCODER_URL, "<html><body><p>maintenance</p></body></html>")]);
    let crawler = AtCoderCrawler::new(http);
    let result = Pipeline::run_source(&crawler, now()).await?;
    assert_eq!(result.total_rows, 0);
    assert!(result.contests.is_empty());
    Ok(())
}
