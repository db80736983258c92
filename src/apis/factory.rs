use crate::apis::atcoder::AtCoderCrawler;
use crate::apis::clist::{ClistAccount, ClistCrawler};
use crate::config::Config;
use crate::error::{Result, ScraperError};
use crate::infra::HttpClientPort;
use crate::types::{ContestSource, Site};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Which adapters feed the aggregator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Scrape AtCoder directly, Codeforces and CodeChef through clist
    #[default]
    Html,
    /// Every platform through clist
    Clist,
}

impl std::str::FromStr for SourceMode {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(SourceMode::Html),
            "clist" => Ok(SourceMode::Clist),
            other => Err(ScraperError::Config(format!("unknown source mode '{other}'"))),
        }
    }
}

fn clist_account(config: &Config) -> Option<ClistAccount> {
    match (&config.clist.username, &config.clist.api_key) {
        (Some(username), Some(api_key)) => Some(ClistAccount {
            base_url: config.clist.base_url.clone(),
            username: username.clone(),
            api_key: api_key.clone(),
        }),
        _ => None,
    }
}

/// Build the per-platform sources, in AtCoder, Codeforces, CodeChef order.
pub fn create_sources(config: &Config, http: Arc<dyn HttpClientPort>) -> Result<Vec<Box<dyn ContestSource>>> {
    let account = clist_account(config);
    let mut sources: Vec<Box<dyn ContestSource>> = Vec::new();

    match config.aggregator.mode {
        SourceMode::Html => {
            sources.push(Box::new(AtCoderCrawler::with_url(
                http.clone(),
                config.atcoder.url.clone(),
                config.atcoder.strategy,
            )));
            match account {
                Some(account) => {
                    for site in [Site::Codeforces, Site::CodeChef] {
                        sources.push(Box::new(ClistCrawler::new(http.clone(), account.clone(), site)));
                    }
                }
                None => warn!("clist credentials not configured; only AtCoder will be tracked"),
            }
        }
        SourceMode::Clist => {
            let account = account.ok_or_else(|| {
                ScraperError::Config("clist mode requires CLIST_USERNAME and CLIST_API_KEY".into())
            })?;
            for site in Site::ALL {
                sources.push(Box::new(ClistCrawler::new(http.clone(), account.clone(), site)));
            }
        }
    }

    info!(
        "Configured sources: {}",
        sources.iter().map(|s| s.source_name()).collect::<Vec<_>>().join(", ")
    );
    Ok(sources)
}
