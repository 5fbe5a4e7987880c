//! Test doubles and HTML fixtures shared by the unit tests.

use crate::fetch::{FetchError, Fetcher};
use crate::models::{Article, Newspaper, Source};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory [`Fetcher`]: serves registered pages, answers 503 for
/// everything else and records every requested URL in order.
#[derive(Default)]
pub struct FakeFetcher {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn serve(&self, url: &str, html: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), html.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.requests.lock().unwrap().iter().any(|u| u == url)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Unavailable {
                url: url.to_string(),
                status: 503,
            })
    }
}

pub fn nst_source() -> Source {
    Source::new(
        Newspaper::Nst,
        "News",
        "Nation",
        "https://www.nst.com.my/news/nation",
        &["news", "nation"],
    )
}

pub fn bharian_source() -> Source {
    Source::new(
        Newspaper::Bharian,
        "Berita",
        "Kes",
        "https://www.bharian.com.my/berita/kes",
        &["news", "crime"],
    )
}

pub fn utusan_source() -> Source {
    Source::new(
        Newspaper::Utusan,
        "Berita",
        "Nasional",
        "http://www.utusan.com.my/berita/nasional",
        &["news", "nation"],
    )
}

/// A stored-shape article published at `datetime`.
pub fn article(url: &str, datetime: DateTime<Utc>) -> Article {
    let mut a = Article::new(url, &nst_source());
    a.datetime = datetime;
    a.title = format!("Title for {url}");
    a.author = "Reporter".to_string();
    a.content = "Body.\n".to_string();
    a
}

fn listing_rows(hrefs: &[Option<&str>], title_prefix: &str, wrap_span: bool) -> String {
    hrefs
        .iter()
        .enumerate()
        .map(|(i, href)| {
            let anchor = match href {
                Some(h) => format!(r#"<a href="{h}">{title_prefix} {i}</a>"#),
                None => format!("<a>{title_prefix} {i}</a>"),
            };
            let anchor = if wrap_span {
                format!("<span>{anchor}</span>")
            } else {
                anchor
            };
            format!(
                r#"<div class="views-row-inner"><div class="views-field views-field-title">{anchor}</div></div>"#
            )
        })
        .collect()
}

/// NST listing page with one row per href (`None` renders an anchor
/// without `href`).
pub fn nst_listing(hrefs: &[Option<&str>]) -> String {
    format!(
        r#"<html><body>
        <div class="view-content">{}</div>
        <div class="view-content"></div>
        <div class="view-content"></div>
        <div class="view-content"></div>
        </body></html>"#,
        listing_rows(hrefs, "Headline", false)
    )
}

pub fn nst_detail(datetime: &DateTime<Utc>) -> String {
    format!(
        r#"<html><body>
        <div class="author"><a>Reporter Name</a></div>
        <span class="post-date">{}</span>
        <div class="field-item even"><p>KUALA LUMPUR: The story begins.</p><p>It goes on.</p></div>
        <div class="view view-article-gallery">
          <div class="views-field views-field-field-image"><img data-src="https://assets.nst.com.my/1.jpg"></div>
          <div class="views-field views-field-field-image-caption"><div class="field-content">A caption</div></div>
        </div>
        </body></html>"#,
        datetime.format("%B %-d, %Y @ %-I:%M%P")
    )
}

pub fn bharian_listing(hrefs: &[Option<&str>]) -> String {
    format!(
        r#"<html><body>
        <div class="view-content">{}</div>
        <div class="view-content"></div>
        </body></html>"#,
        listing_rows(hrefs, "Tajuk", true)
    )
}

pub fn bharian_detail(datetime: &DateTime<Utc>) -> String {
    const MONTHS: [&str; 12] = [
        "Januari", "Februari", "Mac", "April", "Mei", "Jun", "Julai", "Ogos", "September",
        "Oktober", "November", "Disember",
    ];
    let meta = format!(
        "Bharian Khamis, {} {} {} @ {}",
        datetime.day(),
        MONTHS[datetime.month0() as usize],
        datetime.year(),
        datetime.format("%-I:%M%p")
    );
    format!(
        r#"<html><body>
        <div class="node-meta">{meta}</div>
        <div class="author">Oleh Penulis Berita</div>
        <div class="field-item even"><p>JOHOR BAHRU: Seorang lelaki ditahan.</p><p>Siasatan diteruskan.</p></div>
        <div class="view view-article-gallery">
          <div class="views-field views-field-field-image"><img data-src="https://assets.bharian.com.my/1.jpg"></div>
        </div>
        </body></html>"#
    )
}

pub fn utusan_listing(hrefs: &[Option<&str>]) -> String {
    let items: String = hrefs
        .iter()
        .enumerate()
        .map(|(i, href)| {
            let anchor = match href {
                Some(h) => format!(r#"<a href="{h}">Teaser {i}</a>"#),
                None => format!("<a>Teaser {i}</a>"),
            };
            format!(r#"<li class="element_item item_teaser"><h2>{anchor}</h2></li>"#)
        })
        .collect();
    format!("<html><body><ul>{items}</ul></body></html>")
}

pub fn utusan_detail(datetime: &DateTime<Utc>) -> String {
    format!(
        r#"<html><body>
        <div class="content_header content__header tonal__header"><h1>Tajuk Utusan</h1></div>
        <div id="lightbox-links"><a href="/img/gambar.jpg" title="Kapsyen">1</a><a>no href</a></div>
        <p class="content__dateline"><time data-timestamp="{}">hari ini</time></p>
        <a class="tone-colour author"><span>Wartawan</span></a>
        <div class="clearfix article_body content__article-body from-content-api js-article__body">
          <p>PUTRAJAYA: Perenggan satu.</p><p>Perenggan dua.</p>
        </div>
        <ul class="tag-list"><li><a>politik</a></li><li><a>pilihan raya</a></li><li><a>politik</a></li></ul>
        </body></html>"#,
        datetime.timestamp_millis()
    )
}
