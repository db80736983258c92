use crate::error::{Result, ScraperError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use url::Url;

const SECRET_PARAMS: &[&str] = &["api_key"];

/// `url` with credential query parameters masked, safe for logs and error text.
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        // Unparsable: keep only what precedes the query
        return url.split('?').next().unwrap_or_default().to_string();
    };
    if parsed.query().is_none() {
        return parsed.to_string();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if SECRET_PARAMS.contains(&k.as_ref()) {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

/// Fetch port used by every source; swapped for a stub in tests.
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    /// GET `url` and return the body as text. Non-2xx responses are errors.
    async fn get_text(&self, url: &str) -> Result<String>;
}

pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .deflate(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    #[instrument(skip(self, url), fields(url = %redact_url(url)))]
    async fn get_text(&self, url: &str) -> Result<String> {
        let started = Instant::now();
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, concat!("contest_scraper/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "text/html,application/json;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| ScraperError::Http(e.without_url()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScraperError::Status {
                url: redact_url(url),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ScraperError::Http(e.without_url()))?;
        debug!(
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched listing"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "SUPERSECRETKEY";

    #[test]
    fn api_key_is_masked() {
        let url = format!("https://clist.by/api/v1/contest/?username=u&api_key={KEY}&resource__id=1");
        let redacted = redact_url(&url);
        assert!(!redacted.contains(KEY));
        assert!(redacted.contains("username=u"));
        assert!(redacted.contains("api_key=***"));
        assert!(redacted.contains("resource__id=1"));
    }

    #[test]
    fn urls_without_credentials_are_unchanged() {
        assert_eq!(redact_url("https://atcoder.jp/contests"), "https://atcoder.jp/contests");
        assert_eq!(redact_url("not a url?api_key=x"), "not a url");
    }

    #[tokio::test]
    async fn transport_error_does_not_carry_the_query() {
        let http = ReqwestHttp::new(Duration::from_secs(5)).unwrap();
        let err = http
            .get_text(&format!("http://127.0.0.1:1/api/v1/contest/?username=u&api_key={KEY}"))
            .await
            .unwrap_err();
        assert!(err.is_network());
        assert!(!err.to_string().contains(KEY), "{err}");
    }
}
