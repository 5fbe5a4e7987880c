//! New Straits Times extractor.
//!
//! Section listings live under `https://www.nst.com.my/news/<section>` and
//! are paginated with `?page=N`. A real listing page carries exactly four
//! `div.view-content` blocks; anything else (including the 404 page served
//! past the last page) means there is nothing more to read.

use super::{Detail, ListingEntry, ListingRules, ScrapeError, common, dates, scrape_paginated};
use crate::fetch::Fetcher;
use crate::models::{Article, Source};
use crate::utils::element_text;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::instrument;
use url::Url;

const BASE_URL: &str = "https://www.nst.com.my";
const LISTING_BLOCKS: usize = 4;

static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.views-field-title a").unwrap());
static AUTHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div.author a").unwrap());
static AUTHOR_FALLBACK: Lazy<Selector> = Lazy::new(|| Selector::parse("span.author a").unwrap());
static POST_DATE: Lazy<Selector> = Lazy::new(|| Selector::parse("span.post-date").unwrap());

#[derive(Clone)]
pub struct Nst {
    fetcher: Arc<dyn Fetcher>,
    base_url: Url,
}

impl Nst {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            base_url: Url::parse(BASE_URL).expect("valid NST base URL"),
        }
    }

    #[instrument(level = "info", skip_all, fields(section = %source.original_subcategory))]
    pub async fn scrape(
        &self,
        source: &Source,
        page_limit: u32,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<Article>, ScrapeError> {
        scrape_paginated(self, self.fetcher.as_ref(), source, page_limit, watermark).await
    }
}

impl ListingRules for Nst {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn parse_listing(&self, html: &str) -> Option<Vec<ListingEntry>> {
        let doc = Html::parse_document(html);
        if common::view_content_blocks(&doc) != LISTING_BLOCKS {
            return None;
        }
        Some(common::listing_rows(&doc, &TITLE_LINK))
    }

    fn parse_detail(&self, html: &str, url: &str) -> Result<Detail, ScrapeError> {
        let doc = Html::parse_document(html);

        let author = doc
            .select(&AUTHOR)
            .map(|a| element_text(&a))
            .collect::<String>();
        let author = if author.is_empty() {
            doc.select(&AUTHOR_FALLBACK)
                .map(|a| element_text(&a))
                .collect::<String>()
        } else {
            author
        };

        let date_text = doc
            .select(&POST_DATE)
            .map(|d| element_text(&d))
            .collect::<String>();
        let datetime = dates::parse_nst(&date_text).map_err(|source| ScrapeError::Date {
            url: url.to_string(),
            source,
        })?;

        let (location, content) = common::body(&doc);

        Ok(Detail {
            title: None,
            author: author.trim().to_string(),
            datetime,
            location,
            content,
            pictures: common::gallery(&doc),
            tags: Vec::new(),
        })
    }
}
