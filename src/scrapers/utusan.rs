//! Utusan extractor.
//!
//! Utusan section pages are not paginated: only the teasers on the section
//! page itself are read. Detail pages carry the publication time as an
//! epoch-millisecond `data-timestamp` attribute and expose article tags.

use super::{Detail, ListingEntry, ListingRules, PageOutcome, ScrapeError, dates, resolve, scrape_page};
use crate::fetch::Fetcher;
use crate::models::{Article, Picture, Source};
use crate::utils::{element_text, join_paragraphs};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use url::Url;

const BASE_URL: &str = "http://www.utusan.com.my/";

static TEASER_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li.element_item.item_teaser h2 a").unwrap());
static TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.content_header.content__header.tonal__header h1").unwrap());
static LIGHTBOX: Lazy<Selector> = Lazy::new(|| Selector::parse("#lightbox-links a").unwrap());
static DATELINE_TIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.content__dateline time").unwrap());
static AUTHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a.tone-colour.author span").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "div.clearfix.article_body.content__article-body.from-content-api.js-article__body p",
    )
    .unwrap()
});
static TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("ul.tag-list li a").unwrap());

#[derive(Clone)]
pub struct Utusan {
    fetcher: Arc<dyn Fetcher>,
    base_url: Url,
}

impl Utusan {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            base_url: Url::parse(BASE_URL).expect("valid Utusan base URL"),
        }
    }

    /// Scrape the section page of `source`, stopping at the first teaser
    /// older than `watermark`.
    #[instrument(level = "info", skip_all, fields(section = %source.original_subcategory))]
    pub async fn scrape(
        &self,
        source: &Source,
        watermark: DateTime<Utc>,
    ) -> Result<Vec<Article>, ScrapeError> {
        match scrape_page(self, self.fetcher.as_ref(), source, &source.url, watermark).await {
            PageOutcome::Continue(articles) | PageOutcome::StopClean(articles) => {
                info!(count = articles.len(), "Scrape finished");
                Ok(articles)
            }
            PageOutcome::Abort(e) => {
                warn!(error = %e, "Scrape aborted");
                Err(e)
            }
        }
    }
}

impl ListingRules for Utusan {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn parse_listing(&self, html: &str) -> Option<Vec<ListingEntry>> {
        let doc = Html::parse_document(html);
        let entries = doc
            .select(&TEASER_LINK)
            .map(|a| ListingEntry {
                title: element_text(&a).trim().to_string(),
                href: a.value().attr("href").map(str::to_string),
            })
            .collect();
        Some(entries)
    }

    fn parse_detail(&self, html: &str, url: &str) -> Result<Detail, ScrapeError> {
        let doc = Html::parse_document(html);
        let date_error = |source| ScrapeError::Date {
            url: url.to_string(),
            source,
        };

        let timestamp = doc
            .select(&DATELINE_TIME)
            .find_map(|t| t.value().attr("data-timestamp"))
            .unwrap_or_default();
        let datetime = dates::parse_epoch_millis(timestamp).map_err(date_error)?;

        let title = doc
            .select(&TITLE)
            .map(|h| element_text(&h))
            .collect::<String>();

        let mut pictures = Vec::new();
        for a in doc.select(&LIGHTBOX) {
            let Some(href) = a.value().attr("href") else {
                continue;
            };
            pictures.push(Picture {
                image_url: resolve(&self.base_url, href)?,
                caption: a.value().attr("title").unwrap_or_default().to_string(),
            });
        }

        let author = doc
            .select(&AUTHOR)
            .map(|s| element_text(&s))
            .collect::<String>();

        let tags = doc
            .select(&TAG)
            .map(|t| element_text(&t).trim().to_string())
            .filter(|t| !t.is_empty())
            .unique()
            .collect();

        Ok(Detail {
            title: Some(title.trim().to_string()),
            author: author.trim().to_string(),
            datetime,
            location: String::new(),
            content: join_paragraphs(doc.select(&BODY)),
            pictures,
            tags,
        })
    }
}
