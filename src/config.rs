use crate::aggregator::FailurePolicy;
use crate::apis::atcoder::ExtractStrategy;
use crate::apis::factory::SourceMode;
use crate::constants::{
    ATCODER_CONTESTS_URL, CLIST_BASE_URL, DEFAULT_CACHE_TTL_MINUTES, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_PORT,
};
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub atcoder: AtCoderConfig,
    pub clist: ClistConfig,
    pub aggregator: AggregatorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_minutes: i64,
    /// Directory for the on-disk cache record; in-memory when unset
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: DEFAULT_CACHE_TTL_MINUTES,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AtCoderConfig {
    pub url: String,
    pub strategy: ExtractStrategy,
}

impl Default for AtCoderConfig {
    fn default() -> Self {
        Self {
            url: ATCODER_CONTESTS_URL.to_string(),
            strategy: ExtractStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClistConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub api_key: Option<String>,
}

impl Default for ClistConfig {
    fn default() -> Self {
        Self {
            base_url: CLIST_BASE_URL.to_string(),
            username: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub mode: SourceMode,
    pub failure_policy: FailurePolicy,
}

impl Config {
    /// Load `path` (or `config.toml` if present), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Environment wins over the file. `lookup` is injected so tests need not touch the process env.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ScraperError::Config(format!("PORT '{port}' is not a valid port")))?;
        }
        if let Some(username) = lookup("CLIST_USERNAME") {
            self.clist.username = Some(username);
        }
        if let Some(key) = lookup("CLIST_API_KEY") {
            self.clist.api_key = Some(key);
        }
        if let Some(dir) = lookup("CONTEST_CACHE_DIR") {
            self.cache.dir = Some(PathBuf::from(dir));
        }
        if let Some(ttl) = lookup("CONTEST_CACHE_TTL_MINUTES") {
            self.cache.ttl_minutes = ttl.parse().map_err(|_| {
                ScraperError::Config(format!("CONTEST_CACHE_TTL_MINUTES '{ttl}' is not a number"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_minutes <= 0 {
            return Err(ScraperError::Config("cache.ttl_minutes must be positive".into()));
        }
        if self.http.timeout_seconds == 0 {
            return Err(ScraperError::Config("http.timeout_seconds must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.cache.ttl_minutes, 30);
        assert_eq!(config.atcoder.strategy, ExtractStrategy::Structural);
        assert_eq!(config.aggregator.failure_policy, FailurePolicy::FailFast);
        assert_eq!(config.aggregator.mode, SourceMode::Html);
    }

    #[test]
    fn file_sections_are_read() {
        let config = Config::from_toml_str(
            r#"
            [atcoder]
            strategy = "pattern"

            [aggregator]
            mode = "clist"
            failure_policy = "skip_failed"

            [cache]
            ttl_minutes = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.atcoder.strategy, ExtractStrategy::Pattern);
        assert_eq!(config.aggregator.mode, SourceMode::Clist);
        assert_eq!(config.aggregator.failure_policy, FailurePolicy::SkipFailed);
        assert_eq!(config.cache.ttl_minutes, 10);
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = [("PORT", "8080"), ("CLIST_API_KEY", "secret")].into();
        let mut config = Config::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.clist.api_key.as_deref(), Some("secret"));

        let bad: HashMap<&str, &str> = [("PORT", "eighty")].into();
        assert!(config.apply_env(|k| bad.get(k).map(|v| v.to_string())).is_err());
    }

    #[test]
    fn malformed_env_values_are_config_errors() {
        for (key, value) in [("PORT", "eighty"), ("CONTEST_CACHE_TTL_MINUTES", "soon")] {
            let env: HashMap<&str, &str> = [(key, value)].into();
            let err = Config::default()
                .apply_env(|k| env.get(k).map(|v| v.to_string()))
                .unwrap_err();
            assert!(matches!(err, ScraperError::Config(_)), "{key}: {err}");
        }
    }
}
