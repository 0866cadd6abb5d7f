//! Configuration.
//!
//! Every setting has a named-constant default, so rankfeed runs with no
//! config file at all. A TOML file may override any subset:
//!
//! ```toml
//! [source]
//! url = "https://news.ycombinator.com/news"
//! timeout_secs = 30
//!
//! [refresh]
//! interval_secs = 900
//!
//! [ranking]
//! score_threshold = 100
//!
//! [pages]
//! page_size = 10
//!
//! [server]
//! bind = "127.0.0.1:5000"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::paginate::PAGE_SIZE;
use crate::rank::SCORE_THRESHOLD;

/// Time between scheduled refreshes.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// Upper bound on a single fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SOURCE_URL: &str = "https://news.ycombinator.com/news";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    FETCH_TIMEOUT.as_secs()
}
fn default_user_agent() -> String {
    format!("rankfeed/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    REFRESH_INTERVAL.as_secs()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RankingConfig {
    #[serde(default = "default_score_threshold")]
    pub score_threshold: u32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
        }
    }
}

fn default_score_threshold() -> u32 {
    SCORE_THRESHOLD
}

#[derive(Debug, Deserialize, Clone)]
pub struct PagesConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    PAGE_SIZE
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.refresh.interval_secs == 0 {
            anyhow::bail!("refresh.interval_secs must be > 0");
        }
        if self.pages.page_size == 0 {
            anyhow::bail!("pages.page_size must be > 0");
        }
        if self.source.timeout_secs == 0 {
            anyhow::bail!("source.timeout_secs must be > 0");
        }
        if !(self.source.url.starts_with("http://") || self.source.url.starts_with("https://")) {
            anyhow::bail!(
                "source.url must be an http(s) URL, got '{}'",
                self.source.url
            );
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

/// Like [`load_config`], but falls back to defaults when `path` does not exist.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}
