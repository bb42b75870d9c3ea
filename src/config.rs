//! Configuration loading.
//!
//! Settings come from an optional TOML file; every section has defaults so a
//! missing file is not an error. A few environment variables are applied on
//! top of the file (see [`apply_env_overrides`]).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_START_URL: &str =
    "https://api.val.town/v1/search/vals?query=%20&offset=0&limit=100";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./valsearch.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// First page of the remote collection. Each later page is whatever the
    /// previous page's `links.next` says.
    #[serde(default = "default_start_url")]
    pub start_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_start_url() -> String {
    DEFAULT_START_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SyncConfig {
    /// Minimum age of the last completed pass before `/sync` may start another.
    #[serde(default = "default_staleness_minutes")]
    pub staleness_minutes: i64,
    /// Pause before re-fetching a page that failed. Zero retries immediately.
    #[serde(default)]
    pub retry_delay_ms: u64,
    /// Failed fetches tolerated on a single page before the pass is abandoned.
    /// Zero means retry forever.
    #[serde(default)]
    pub max_page_attempts: u32,
    /// Delete rows that a completed pass did not see.
    #[serde(default)]
    pub prune_missing: bool,
    /// Request a sync as soon as the server starts.
    #[serde(default)]
    pub on_startup: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            staleness_minutes: default_staleness_minutes(),
            retry_delay_ms: 0,
            max_page_attempts: 0,
            prune_missing: false,
            on_startup: false,
        }
    }
}

fn default_staleness_minutes() -> i64 {
    60
}

impl SyncConfig {
    /// Saturates at `chrono::Duration::MAX`; [`validate`] rejects values
    /// that would need it.
    pub fn staleness(&self) -> chrono::Duration {
        chrono::Duration::try_minutes(self.staleness_minutes).unwrap_or(chrono::Duration::MAX)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn max_page_attempts(&self) -> Option<u32> {
        (self.max_page_attempts > 0).then_some(self.max_page_attempts)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SearchConfig {
    /// Cap on returned matches. Zero returns every match.
    #[serde(default)]
    pub limit: u32,
}

impl SearchConfig {
    pub fn limit(&self) -> Option<u32> {
        (self.limit > 0).then_some(self.limit)
    }
}

/// Loads the config file at `path` (defaults if it does not exist), applies
/// environment overrides and validates the result.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

/// Applies `VALSEARCH_DB`, `PORT` and `VALSEARCH_START_URL`.
///
/// `lookup` is injected so tests don't have to touch the process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("VALSEARCH_DB").filter(|v| !v.is_empty()) {
        config.db.path = PathBuf::from(path);
    }
    if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
        config.server.port = port
            .trim()
            .parse()
            .with_context(|| format!("PORT is not a valid port number: '{}'", port))?;
    }
    if let Some(url) = lookup("VALSEARCH_START_URL").filter(|v| !v.is_empty()) {
        config.remote.start_url = url;
    }
    Ok(())
}

pub fn validate(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        bail!("server.port must be > 0");
    }

    if config.sync.staleness_minutes < 0 {
        bail!("sync.staleness_minutes must be >= 0");
    }
    if chrono::Duration::try_minutes(config.sync.staleness_minutes).is_none() {
        bail!(
            "sync.staleness_minutes is out of range: {}",
            config.sync.staleness_minutes
        );
    }

    if config.remote.timeout_secs == 0 {
        bail!("remote.timeout_secs must be > 0");
    }

    let url = &config.remote.start_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!(
            "remote.start_url must be an absolute http(s) URL, got '{}'",
            url
        );
    }

    Ok(())
}
