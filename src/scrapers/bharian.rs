//! Berita Harian extractor.
//!
//! Same Drupal layout as NST with Malay dates. A listing page is real when
//! it carries more than one `div.view-content` block.

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

const BASE_URL: &str = "https://www.bharian.com.my";

static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.views-field.views-field-title span a").unwrap());
static NODE_META: Lazy<Selector> = Lazy::new(|| Selector::parse("div.node-meta").unwrap());
static AUTHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div.author").unwrap());

#[derive(Clone)]
pub struct Bharian {
    fetcher: Arc<dyn Fetcher>,
    base_url: Url,
}

impl Bharian {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            base_url: Url::parse(BASE_URL).expect("valid Berita Harian base URL"),
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

impl ListingRules for Bharian {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn parse_listing(&self, html: &str) -> Option<Vec<ListingEntry>> {
        let doc = Html::parse_document(html);
        if common::view_content_blocks(&doc) <= 1 {
            return None;
        }
        Some(common::listing_rows(&doc, &TITLE_LINK))
    }

    fn parse_detail(&self, html: &str, url: &str) -> Result<Detail, ScrapeError> {
        let doc = Html::parse_document(html);

        let meta = doc
            .select(&NODE_META)
            .map(|m| element_text(&m))
            .collect::<String>();
        let datetime = dates::parse_bharian(&meta).map_err(|source| ScrapeError::Date {
            url: url.to_string(),
            source,
        })?;

        let author = doc
            .select(&AUTHOR)
            .map(|a| element_text(&a))
            .collect::<String>();
        let author = author.trim();
        let author = author.strip_prefix("Oleh").unwrap_or(author).trim();

        let (location, content) = common::body(&doc);

        Ok(Detail {
            title: None,
            author: author.to_string(),
            datetime,
            location,
            content,
            pictures: common::gallery(&doc),
            tags: Vec::new(),
        })
    }
}
