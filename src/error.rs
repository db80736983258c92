use crate::types::Site;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{site} source failed: {source}")]
    Source {
        site: Site,
        #[source]
        source: Box<ScraperError>,
    },
}

impl ScraperError {
    /// True for transport-level failures (timeouts, DNS, non-2xx status).
    pub fn is_network(&self) -> bool {
        match self {
            ScraperError::Http(_) | ScraperError::Status { .. } => true,
            ScraperError::Source { source, .. } => source.is_network(),
            _ => false,
        }
    }

    pub fn for_site(self, site: Site) -> Self {
        ScraperError::Source {
            site,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
