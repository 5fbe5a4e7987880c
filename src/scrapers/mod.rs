//! Newspaper extractors and the pagination controller they share.
//!
//! Each newspaper family has a submodule that knows its markup. The
//! families do not fetch anything themselves: they turn HTML into owned
//! values ([`ListingEntry`], [`Detail`]) and this module drives the
//! listing/detail fetches around them.
//!
//! # Supported Families
//!
//! | Newspaper | Module | Pagination | Notes |
//! |-----------|--------|------------|-------|
//! | New Straits Times | [`nst`] | `?page=N` | English dates |
//! | Berita Harian | [`bharian`] | `?page=N` | Malay dates |
//! | Utusan | [`utusan`] | single page | epoch timestamps, tags |
//!
//! # Pagination
//!
//! Scraping one listing page yields a [`PageOutcome`]:
//!
//! - `Continue`: the page was fully processed, the next page may be fetched
//! - `StopClean`: the page had no listing markup, or an entry older than the
//!   watermark was reached; the batch so far is the result
//! - `Abort`: a link was missing or a fetch/parse failed; everything
//!   accumulated for this source in this call is dropped
//!
//! Reaching the page limit after a `Continue` also ends the scrape cleanly.

pub mod bharian;
mod common;
pub mod dates;
pub mod nst;
pub mod utusan;

use crate::fetch::{FetchError, Fetcher};
use crate::models::{Article, Newspaper, Picture, Source};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use dates::DateParseError;

/// Why a scrape of one source was aborted.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("listing entry {index} on {page} has no detail link")]
    MissingLink { page: String, index: usize },
    #[error("could not parse date on {url}: {source}")]
    Date {
        url: String,
        #[source]
        source: DateParseError,
    },
    #[error("invalid URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Result of scraping a single listing page.
#[derive(Debug)]
pub enum PageOutcome {
    Continue(Vec<Article>),
    StopClean(Vec<Article>),
    Abort(ScrapeError),
}

/// One entry of a listing page, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    pub href: Option<String>,
}

/// Everything a family extracts from a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    /// Headline from the detail page, for families whose listing has none.
    pub title: Option<String>,
    pub author: String,
    pub datetime: DateTime<Utc>,
    pub location: String,
    pub content: String,
    pub pictures: Vec<Picture>,
    pub tags: Vec<String>,
}

/// Markup rules of one newspaper family.
///
/// Parsing is synchronous and returns owned values so that no DOM is held
/// across an `.await`.
pub trait ListingRules: Send + Sync {
    /// Base URL that relative links are resolved against.
    fn base_url(&self) -> &Url;

    /// Entries of a listing page, or `None` when the page has no listing
    /// markup at all.
    fn parse_listing(&self, html: &str) -> Option<Vec<ListingEntry>>;

    /// Parse a detail page. `url` is the resolved page URL.
    fn parse_detail(&self, html: &str, url: &str) -> Result<Detail, ScrapeError>;
}

/// An extractor for one newspaper family.
///
/// This is the closed mapping from [`Newspaper`] to scraping logic; adding a
/// newspaper means adding a variant here.
#[derive(Clone)]
pub enum Extractor {
    Nst(nst::Nst),
    Bharian(bharian::Bharian),
    Utusan(utusan::Utusan),
}

impl Extractor {
    /// The extractor for `newspaper`, fetching through `fetcher`.
    pub fn for_newspaper(newspaper: Newspaper, fetcher: Arc<dyn Fetcher>) -> Self {
        match newspaper {
            Newspaper::Nst => Extractor::Nst(nst::Nst::new(fetcher)),
            Newspaper::Bharian => Extractor::Bharian(bharian::Bharian::new(fetcher)),
            Newspaper::Utusan => Extractor::Utusan(utusan::Utusan::new(fetcher)),
        }
    }

    pub fn newspaper(&self) -> Newspaper {
        match self {
            Extractor::Nst(_) => Newspaper::Nst,
            Extractor::Bharian(_) => Newspaper::Bharian,
            Extractor::Utusan(_) => Newspaper::Utusan,
        }
    }

    /// Scrape `source`, stopping at `page_limit` pages (0 means no limit)
    /// or at the first article older than `watermark`.
    ///
    /// On error nothing scraped in this call is returned.
    pub async fn scrape(
        &self,
        source: &Source,
        page_limit: u32,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<Article>, ScrapeError> {
        match self {
            Extractor::Nst(e) => e.scrape(source, page_limit, watermark).await,
            Extractor::Bharian(e) => e.scrape(source, page_limit, watermark).await,
            Extractor::Utusan(e) => e.scrape(source, watermark).await,
        }
    }
}

/// Listing page `page_no` of a source: its URL with `page=N` appended.
pub fn page_url(listing: &str, page_no: u32) -> Result<String, ScrapeError> {
    let mut url = Url::parse(listing).map_err(|source| ScrapeError::Url {
        url: listing.to_string(),
        source,
    })?;
    url.query_pairs_mut()
        .append_pair("page", &page_no.to_string());
    Ok(url.to_string())
}

/// Resolve a link found on a page against the family base URL.
pub fn resolve(base: &Url, href: &str) -> Result<String, ScrapeError> {
    base.join(href)
        .map(|u| u.to_string())
        .map_err(|source| ScrapeError::Url {
            url: href.to_string(),
            source,
        })
}

/// Drive a paginated family through pages `1..` until a terminal outcome.
#[instrument(level = "info", skip_all, fields(source = %source.url, page_limit = page_limit))]
pub async fn scrape_paginated<R: ListingRules>(
    rules: &R,
    fetcher: &dyn Fetcher,
    source: &Source,
    page_limit: u32,
    watermark: DateTime<Utc>,
) -> Result<Vec<Article>, ScrapeError> {
    let mut batch = Vec::new();
    let mut page_no = 1;

    loop {
        let url = page_url(&source.url, page_no)?;
        match scrape_page(rules, fetcher, source, &url, watermark).await {
            PageOutcome::Continue(mut page) => {
                batch.append(&mut page);
                if page_limit > 0 && page_no >= page_limit {
                    info!(pages = page_no, count = batch.len(), "Page limit reached");
                    break;
                }
                page_no += 1;
            }
            PageOutcome::StopClean(mut page) => {
                batch.append(&mut page);
                info!(pages = page_no, count = batch.len(), "Scrape finished");
                break;
            }
            PageOutcome::Abort(e) => {
                warn!(page = page_no, discarded = batch.len(), error = %e, "Scrape aborted");
                return Err(e);
            }
        }
    }

    Ok(batch)
}

/// Scrape one listing page and the detail page of each of its entries.
///
/// A page without listing markup is terminal. Entries are processed in
/// document order; the first one older than `watermark` ends the page and
/// the scrape, keeping the newer entries before it.
#[instrument(level = "debug", skip_all, fields(%url))]
pub async fn scrape_page<R: ListingRules>(
    rules: &R,
    fetcher: &dyn Fetcher,
    source: &Source,
    url: &str,
    watermark: DateTime<Utc>,
) -> PageOutcome {
    let html = match fetcher.get(url).await {
        Ok(html) => html,
        Err(e) => return PageOutcome::Abort(e.into()),
    };

    let Some(entries) = rules.parse_listing(&html) else {
        debug!("Listing markup absent");
        return PageOutcome::StopClean(Vec::new());
    };
    debug!(entries = entries.len(), "Parsed listing");

    let mut articles = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let Some(href) = entry.href else {
            return PageOutcome::Abort(ScrapeError::MissingLink {
                page: url.to_string(),
                index,
            });
        };
        let detail_url = match resolve(rules.base_url(), &href) {
            Ok(u) => u,
            Err(e) => return PageOutcome::Abort(e),
        };

        let article = match scrape_detail(rules, fetcher, source, &detail_url, entry.title).await {
            Ok(a) => a,
            Err(e) => return PageOutcome::Abort(e),
        };

        if article.datetime < watermark {
            debug!(url = %detail_url, datetime = %article.datetime, "Reached stale article");
            return PageOutcome::StopClean(articles);
        }
        articles.push(article);
    }

    PageOutcome::Continue(articles)
}

/// Fetch and parse one detail page into an [`Article`].
pub async fn scrape_detail<R: ListingRules>(
    rules: &R,
    fetcher: &dyn Fetcher,
    source: &Source,
    url: &str,
    listing_title: String,
) -> Result<Article, ScrapeError> {
    let html = fetcher.get(url).await?;
    let detail = rules.parse_detail(&html, url)?;

    let mut article = Article::new(url, source);
    article.title = detail.title.unwrap_or(listing_title);
    article.author = detail.author;
    article.datetime = detail.datetime;
    article.location = detail.location;
    article.content = detail.content;
    article.pictures = detail.pictures;
    article.tags = detail.tags;
    debug!(id = %article.id, title = %article.title, "Scraped article");
    Ok(article)
}
