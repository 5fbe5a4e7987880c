//! Concurrent orchestration of one refresh run.
//!
//! A dispatcher task feeds every catalog source into a bounded job channel,
//! a fixed pool of workers runs the matching [`Extractor`] for each job and
//! the collector (the caller of [`Refresher::refresh`]) receives exactly one
//! result per job, writing successful batches into the store one at a time.
//!
//! ```text
//! dispatcher ──jobs──▶ worker × N ──results──▶ collector ──▶ NewsStore
//! ```

use crate::catalog;
use crate::fetch::Fetcher;
use crate::models::{Article, Newspaper, Source};
use crate::scrapers::{Extractor, ScrapeError};
use crate::store::{NewsStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no extractor registered for newspaper {newspaper_id:?} (source {url})")]
    ProviderNotFound { newspaper_id: String, url: String },
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counts for one refresh run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub jobs: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub inserted: usize,
}

struct JobResult {
    source: Source,
    outcome: Result<Vec<Article>, RefreshError>,
}

pub struct Refresher<S> {
    extractors: Arc<HashMap<Newspaper, Extractor>>,
    catalog: Vec<Source>,
    store: S,
    watermark: DateTime<Utc>,
    workers: usize,
    page_limit: u32,
}

impl<S: NewsStore> Refresher<S> {
    /// A refresher over the full catalog with an extractor for every
    /// newspaper and a watermark of one day before now.
    pub fn new(fetcher: Arc<dyn Fetcher>, store: S) -> Self {
        let extractors = Newspaper::ALL
            .iter()
            .map(|&n| (n, Extractor::for_newspaper(n, Arc::clone(&fetcher))))
            .collect();
        Self {
            extractors: Arc::new(extractors),
            catalog: catalog::sources(),
            store,
            watermark: Utc::now() - Duration::days(1),
            workers: DEFAULT_WORKERS,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<Source>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the registry with exactly `extractors`.
    pub fn with_extractors(mut self, extractors: impl IntoIterator<Item = Extractor>) -> Self {
        self.extractors = Arc::new(extractors.into_iter().map(|e| (e.newspaper(), e)).collect());
        self
    }

    pub fn with_watermark(mut self, watermark: DateTime<Utc>) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Listing pages per source; 0 means no limit.
    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// Check that every catalog source resolves to a registered extractor.
    pub fn validate(&self) -> Result<(), RefreshError> {
        for source in &self.catalog {
            lookup(&self.extractors, source)?;
        }
        debug!(sources = self.catalog.len(), "Catalog resolves");
        Ok(())
    }

    /// Scrape every catalog source and store what was found.
    ///
    /// Returns once a result for every source has been collected. Failed
    /// jobs are logged and counted; they never affect other jobs.
    #[instrument(level = "info", skip_all, fields(watermark = %self.watermark, workers = self.workers))]
    pub async fn refresh(&mut self) -> RefreshSummary {
        let jobs = self.catalog.clone();
        let mut summary = RefreshSummary {
            jobs: jobs.len(),
            ..RefreshSummary::default()
        };
        info!(jobs = summary.jobs, "Refresh starting");

        let (job_tx, job_rx) = kanal::bounded_async::<Source>(self.workers);
        let (result_tx, result_rx) = kanal::unbounded_async::<JobResult>();

        let mut handles = Vec::with_capacity(self.workers);
        for worker in 0..self.workers {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let extractors = Arc::clone(&self.extractors);
            let (page_limit, watermark) = (self.page_limit, self.watermark);

            handles.push(tokio::spawn(async move {
                while let Ok(source) = jobs.recv().await {
                    debug!(worker, source = %source.url, "Job picked up");
                    let outcome = run_job(&extractors, &source, page_limit, watermark).await;
                    if results.send(JobResult { source, outcome }).await.is_err() {
                        break;
                    }
                }
                debug!(worker, "Worker exiting");
            }));
        }
        // Only workers hold these now, so channel closure tracks their exit.
        drop(job_rx);
        drop(result_tx);

        let dispatcher = tokio::spawn(async move {
            for source in jobs {
                if job_tx.send(source).await.is_err() {
                    break;
                }
            }
        });

        for _ in 0..summary.jobs {
            let Ok(JobResult { source, outcome }) = result_rx.recv().await else {
                error!(
                    received = summary.succeeded + summary.failed,
                    expected = summary.jobs,
                    "Workers exited before every job reported"
                );
                break;
            };
            match outcome.and_then(|batch| self.persist(&source, &batch)) {
                Ok(inserted) => {
                    summary.succeeded += 1;
                    summary.inserted += inserted;
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(source = %source.url, error = %e, "Job failed");
                }
            }
        }

        if let Err(e) = dispatcher.await {
            error!(error = %e, "Dispatcher panicked");
        }
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!(error = %e, "Worker panicked");
            }
        }

        info!(
            jobs = summary.jobs,
            succeeded = summary.succeeded,
            failed = summary.failed,
            inserted = summary.inserted,
            "Refresh complete"
        );
        summary
    }

    fn persist(&mut self, source: &Source, batch: &[Article]) -> Result<usize, RefreshError> {
        let inserted = self.store.insert(batch)?;
        info!(source = %source.url, scraped = batch.len(), inserted, "Stored batch");
        Ok(inserted)
    }
}

#[cfg(test)]
impl<S> Refresher<S> {
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

fn lookup<'a>(
    extractors: &'a HashMap<Newspaper, Extractor>,
    source: &Source,
) -> Result<&'a Extractor, RefreshError> {
    source
        .newspaper()
        .and_then(|n| extractors.get(&n))
        .ok_or_else(|| RefreshError::ProviderNotFound {
            newspaper_id: source.newspaper_id.clone(),
            url: source.url.clone(),
        })
}

async fn run_job(
    extractors: &HashMap<Newspaper, Extractor>,
    source: &Source,
    page_limit: u32,
    watermark: DateTime<Utc>,
) -> Result<Vec<Article>, RefreshError> {
    let extractor = lookup(extractors, source)?;
    Ok(extractor.scrape(source, page_limit, watermark).await?)
}
