//! Command-line interface definitions for scrapenews.
//!
//! Every option can also be set through the environment variable named in
//! its help text. Options left unset fall back to the YAML config file and
//! then to built-in defaults (see [`crate::config`]).

use crate::config::Backend;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Run one refresh into ./news.db
/// scrapenews
///
/// # Refresh with a config file and fewer workers
/// scrapenews --config scrapenews.yaml --workers 4 refresh
///
/// # Print stored articles from the last day as JSON
/// scrapenews query
///
/// # Print everything stored for one newspaper
/// scrapenews query --provider bharian
///
/// # Print a specific window (from is the newer bound)
/// scrapenews query --from 2018-07-12T00:00:00Z --until 2018-07-10T00:00:00Z
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, env = "SCRAPENEWS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store backend
    #[arg(long, env = "DATABASE", value_enum)]
    pub database: Option<Backend>,

    /// Database file (SQLite database or key-value JSON file)
    #[arg(long, env = "DATABASE_PATH")]
    pub db_path: Option<PathBuf>,

    /// Number of concurrent scrape workers
    #[arg(short, long, env = "WORKERS")]
    pub workers: Option<usize>,

    /// Listing pages per source (0 for no limit)
    #[arg(long, env = "PAGE_LIMIT")]
    pub page_limit: Option<u32>,

    /// HTTP connect and request timeout in seconds
    #[arg(long, env = "TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Ignore articles published more than this many hours ago
    #[arg(long, env = "LOOKBACK_HOURS")]
    pub lookback_hours: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scrape every catalog source once and store new articles (default)
    Refresh,
    /// Print stored articles in a time window as JSON
    Query {
        /// Newer bound, RFC 3339 (default: now)
        #[arg(long)]
        from: Option<String>,
        /// Older bound, RFC 3339 (default: one day ago)
        #[arg(long)]
        until: Option<String>,
        /// Every stored article of one newspaper (nst, bharian, utusan) instead of a window
        #[arg(long, conflicts_with_all = ["from", "until"])]
        provider: Option<String>,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Refresh)
    }
}
