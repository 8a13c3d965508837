//! Configuration file handling for the content harvester.
//!
//! Layering, low to high precedence:
//! 1. [`Config::default`]
//! 2. `.harvester.toml` in the working directory (or an ancestor, via
//!    [`find_config`])
//! 3. `HARVESTER_DATA_ROOT` environment variable (data root only)
//! 4. an explicit CLI flag, applied by the caller after [`load_config`]
//!    returns
//!
//! ```
//! use harvester_config::{Config, load_config};
//! use std::path::Path;
//!
//! let config = load_config(Path::new(".")).expect("load config");
//! assert!(config.http_timeout_secs() > 0);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use harvester_retry::RetryStrategyConfig;
use serde::{Deserialize, Serialize};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".harvester.toml";

/// Environment variable that overrides [`Config::data_root`].
pub const DATA_ROOT_ENV: &str = "HARVESTER_DATA_ROOT";

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Complete harvester configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data_root: Option<PathBuf>,
    #[serde(default)]
    pub disabled_sources: Vec<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_comment_fetch_limit")]
    pub comment_fetch_limit: usize,
    #[serde(default = "default_comment_fetch_budget_secs")]
    pub comment_fetch_budget_secs: u64,
    #[serde(default)]
    pub retry: RetryStrategyConfig,
}

fn default_http_timeout_secs() -> u64 {
    20
}

fn default_comment_fetch_limit() -> usize {
    20
}

fn default_comment_fetch_budget_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: None,
            disabled_sources: Vec::new(),
            http_timeout_secs: default_http_timeout_secs(),
            comment_fetch_limit: default_comment_fetch_limit(),
            comment_fetch_budget_secs: default_comment_fetch_budget_secs(),
            retry: RetryStrategyConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the data root, honoring the `HARVESTER_DATA_ROOT`
    /// environment override, and falling back to `./data` relative to
    /// `fallback_dir` when neither the config file nor the environment
    /// name one.
    pub fn resolve_data_root(&self, fallback_dir: &Path) -> PathBuf {
        if let Ok(env_root) = std::env::var(DATA_ROOT_ENV) {
            if !env_root.trim().is_empty() {
                return PathBuf::from(env_root);
            }
        }
        self.data_root
            .clone()
            .unwrap_or_else(|| fallback_dir.join("data"))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn http_timeout_secs(&self) -> u64 {
        self.http_timeout_secs
    }

    pub fn comment_fetch_budget(&self) -> Duration {
        Duration::from_secs(self.comment_fetch_budget_secs)
    }

    pub fn is_source_disabled(&self, source_id: &str) -> bool {
        self.disabled_sources.iter().any(|id| id == source_id)
    }
}

/// Loads configuration from `<dir>/.harvester.toml`, or the defaults if the
/// file doesn't exist.
pub fn load_config(dir: &Path) -> Result<Config> {
    load_config_from_file(&config_path(dir))
}

/// Loads configuration from a specific file path, or the defaults if the
/// file doesn't exist.
pub fn load_config_from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Finds a `.harvester.toml` by walking up from `start_dir`.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}
