//! Runner configuration loaded from TOML.
//!
//! Resolution order for directories: TOML file (or defaults), then the
//! `LOCAL_DATA_DIR` / `STRATEGIES_DIR` environment variables, then whatever
//! the caller overrides explicitly (CLI flags).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DATA_DIR_ENV: &str = "LOCAL_DATA_DIR";
pub const STRATEGIES_DIR_ENV: &str = "STRATEGIES_DIR";

/// Errors loading a runner config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown log format '{0}' (expected 'pretty' or 'json')")]
    LogFormat(String),
}

/// Settings for the snapshot store, strategy store and simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Directory holding `betfair-live_7_*.ndjson` snapshot files.
    pub data_dir: PathBuf,
    /// Directory of saved strategy documents (`{id}.json`).
    pub strategies_dir: PathBuf,
    /// Where `simulate --save` writes report directories.
    pub output_dir: PathBuf,
    /// Evaluate markets on the rayon pool.
    pub parallel: bool,
    pub logging: LoggingConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("../back-data"),
            strategies_dir: PathBuf::from("./strategies"),
            output_dir: PathBuf::from("results"),
            parallel: true,
            logging: LoggingConfig::default(),
        }
    }
}

/// Log level filter and output format. `RUST_LOG` wins over `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::LogFormat(other.to_string())),
        }
    }
}

impl RunnerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load from `path` if given, otherwise defaults; then apply the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply directory overrides from an environment lookup.
    ///
    /// Takes the lookup as a closure so tests do not touch the process env.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(STRATEGIES_DIR_ENV).filter(|d| !d.is_empty()) {
            self.strategies_dir = PathBuf::from(dir);
        }
        self
    }
}
