//! TOML configuration.
//!
//! Every key has a default, so an empty file (or no file at all, see
//! [`Config::minimal`]) yields a working server. The remote host, base URL
//! and user agent are deliberately not configurable; see [`crate::fetch`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Upper bound on results per search, regardless of configuration.
pub const MAX_RESULTS_CAP: usize = 10;

/// Hard ceiling for `fetch.max_response_bytes`.
const MAX_RESPONSE_BYTES_CEILING: usize = 20 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Directory holding Markdown pages and the JSON catalogs.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_snippet_length")]
    pub snippet_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            snippet_length: default_snippet_length(),
        }
    }
}

fn default_max_results() -> usize {
    MAX_RESULTS_CAP
}
fn default_snippet_length() -> usize {
    400
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_max_response_bytes() -> usize {
    5 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// `tracing` filter directive; `RUST_LOG` overrides it.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "grok_docs=info".to_string()
}

impl Config {
    /// All defaults. Used when no config file is present.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Same as [`Config::minimal`] but reading documents from `dir`.
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::minimal();
        config.data.dir = dir.into();
        config
    }
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !(1..=MAX_RESULTS_CAP).contains(&config.search.max_results) {
        anyhow::bail!("search.max_results must be in [1, {}]", MAX_RESULTS_CAP);
    }

    if config.search.snippet_length < 50 {
        anyhow::bail!("search.snippet_length must be >= 50");
    }

    if !(1..=60).contains(&config.fetch.timeout_secs) {
        anyhow::bail!("fetch.timeout_secs must be in [1, 60]");
    }

    if config.fetch.max_response_bytes == 0
        || config.fetch.max_response_bytes > MAX_RESPONSE_BYTES_CEILING
    {
        anyhow::bail!(
            "fetch.max_response_bytes must be in [1, {}]",
            MAX_RESPONSE_BYTES_CEILING
        );
    }

    if config.log.filter.trim().is_empty() {
        anyhow::bail!("log.filter must not be empty");
    }

    Ok(())
}
