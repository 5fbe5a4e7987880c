//! # scrapenews
//!
//! A single-process batch harvester for Malaysian newspapers. It walks a
//! fixed catalog of section listing pages, scrapes every article newer than
//! a watermark, and stores each one at most once.
//!
//! ## Usage
//!
//! ```sh
//! scrapenews --db-path ./news.db            # one refresh run
//! scrapenews --db-path ./news.db query      # last day's articles as JSON
//! ```
//!
//! ## Architecture
//!
//! 1. **Catalog**: static list of sources ([`catalog`])
//! 2. **Extraction**: one extractor per newspaper family, paginating until
//!    the watermark or page limit ([`scrapers`])
//! 3. **Orchestration**: a worker pool runs all sources and a single
//!    collector writes results ([`refresher`])
//! 4. **Storage**: SQLite or key-value dedup store ([`store`]), read back
//!    through the range query surface ([`api`])
//!
//! Periodic triggering is left to an external scheduler (cron, systemd
//! timers); each invocation performs exactly one run.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod catalog;
mod cli;
mod config;
mod fetch;
mod models;
mod refresher;
mod scrapers;
mod store;
#[cfg(test)]
mod test_support;
mod utils;

use cli::{Cli, Command};
use config::{Backend, Settings};
use fetch::HttpFetcher;
use models::Newspaper;
use refresher::Refresher;
use store::{KvStore, NewsStore, SqliteStore};
use utils::ensure_parent_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("scrapenews starting up");

    let args = Cli::parse();
    let settings = Settings::resolve(&args).await.inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;
    info!(
        database = ?settings.database,
        workers = settings.workers,
        page_limit = settings.page_limit,
        lookback_hours = settings.lookback_hours,
        "Configuration resolved"
    );

    ensure_parent_dir(&settings.db_path).await?;
    match settings.database {
        Backend::Sqlite => {
            let store = SqliteStore::open(&settings.db_path)?;
            run(store, &settings, args.command()).await?;
        }
        Backend::Kv => {
            let store = KvStore::open(&settings.db_path)?;
            run(store, &settings, args.command()).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

async fn run<S: NewsStore>(
    mut store: S,
    settings: &Settings,
    command: Command,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Refresh => {
            let fetcher = Arc::new(HttpFetcher::new(settings.timeout())?);
            let mut refresher = Refresher::new(fetcher, store)
                .with_watermark(Utc::now() - settings.lookback())
                .with_workers(settings.workers)
                .with_page_limit(settings.page_limit);

            if let Err(e) = refresher.validate() {
                error!(error = %e, "Catalog references a newspaper without an extractor");
                return Err(e.into());
            }

            info!(watermark = %refresher.watermark(), "Catalog validated");
            let summary = refresher.refresh().await;
            println!(
                "jobs={} succeeded={} failed={} inserted={}",
                summary.jobs, summary.succeeded, summary.failed, summary.inserted
            );
        }
        Command::Query {
            from,
            until,
            provider,
        } => {
            let response = match provider {
                Some(id) => {
                    let newspaper = Newspaper::from_id(&id)
                        .ok_or_else(|| format!("unknown newspaper id {id:?}"))?;
                    api::get_news_by_provider(&mut store, newspaper.id())
                }
                None => api::get_news(&mut store, from.as_deref(), until.as_deref(), Utc::now()),
            };
            if response.status != 200 {
                error!(status = response.status, "Query failed");
            }
            println!("{}", response.body);
        }
    }
    Ok(())
}
