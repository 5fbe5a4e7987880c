//! Runtime settings.
//!
//! Resolution order, lowest first: built-in defaults, the optional YAML file
//! given with `--config`, then command-line flags and their environment
//! variables.
//!
//! ```yaml
//! database: sqlite
//! db_path: /var/lib/scrapenews/news.db
//! workers: 10
//! page_limit: 10
//! timeout_secs: 30
//! lookback_hours: 24
//! ```

use crate::cli::Cli;
use crate::refresher::{DEFAULT_PAGE_LIMIT, DEFAULT_WORKERS};
use chrono::Duration;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Which store backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Kv,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: Backend,
    pub db_path: PathBuf,
    pub workers: usize,
    pub page_limit: u32,
    pub timeout_secs: u64,
    pub lookback_hours: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: Backend::Sqlite,
            db_path: PathBuf::from("news.db"),
            workers: DEFAULT_WORKERS,
            page_limit: DEFAULT_PAGE_LIMIT,
            timeout_secs: 30,
            lookback_hours: 24,
        }
    }
}

impl Settings {
    /// Defaults overlaid with the YAML file at `path`.
    pub async fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let settings = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(settings)
    }

    fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to null rather than an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Full resolution for one invocation.
    pub async fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut settings = match &cli.config {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };
        settings.apply(cli);
        settings.validate()?;
        debug!(?settings, "Resolved settings");
        Ok(settings)
    }

    /// Overlay every option set on the command line or in the environment.
    pub fn apply(&mut self, cli: &Cli) {
        if let Some(database) = cli.database {
            self.database = database;
        }
        if let Some(path) = &cli.db_path {
            self.db_path = path.clone();
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(page_limit) = cli.page_limit {
            self.page_limit = page_limit;
        }
        if let Some(timeout) = cli.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(hours) = cli.lookback_hours {
            self.lookback_hours = hours;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                field: "workers",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn lookback(&self) -> Duration {
        Duration::hours(i64::from(self.lookback_hours))
    }
}
