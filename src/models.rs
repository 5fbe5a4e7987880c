//! Data models for newspapers, catalog sources and harvested articles.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Newspaper`]: The closed set of newspaper families we know how to scrape
//! - [`Source`]: One listing page of a newspaper section
//! - [`Article`]: A normalized article as persisted by the stores
//! - [`Picture`]: An image embedded in an article, owned by that article
//!
//! The serde field names follow the JSON shape served by the query surface,
//! which is why several fields are renamed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

/// A newspaper family.
///
/// Each variant has exactly one extractor implementation, see
/// [`crate::scrapers::Extractor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Newspaper {
    Nst,
    Bharian,
    Utusan,
}

impl Newspaper {
    /// Every known newspaper, in catalog order.
    pub const ALL: [Newspaper; 3] = [Newspaper::Bharian, Newspaper::Nst, Newspaper::Utusan];

    /// Stable identifier persisted alongside every article.
    pub fn id(self) -> &'static str {
        match self {
            Newspaper::Nst => "nst",
            Newspaper::Bharian => "bharian",
            Newspaper::Utusan => "utusan",
        }
    }

    /// Human readable name.
    pub fn name(self) -> &'static str {
        match self {
            Newspaper::Nst => "New Straits Times",
            Newspaper::Bharian => "Berita Harian",
            Newspaper::Utusan => "Utusan",
        }
    }

    /// Resolve a persisted identifier back to a newspaper.
    pub fn from_id(id: &str) -> Option<Newspaper> {
        Newspaper::ALL.into_iter().find(|n| n.id() == id)
    }
}

impl fmt::Display for Newspaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A scrape target: one listing URL of a newspaper section.
///
/// Sources are declared in [`crate::catalog`] and never mutated. They are
/// denormalized into every [`Article`] scraped from them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// Display name of the newspaper.
    #[serde(rename = "name")]
    pub newspaper_name: String,
    /// Identifier of the newspaper, used to pick the extractor.
    #[serde(rename = "id")]
    pub newspaper_id: String,
    /// Section as named by the newspaper (e.g. "Berita").
    #[serde(rename = "category")]
    pub original_category: String,
    /// Subsection as named by the newspaper (e.g. "Politik").
    #[serde(rename = "subcategory")]
    pub original_subcategory: String,
    /// Topical tags we attach to this section.
    pub tags: Vec<String>,
    /// Listing page URL.
    pub url: String,
}

impl Source {
    pub fn new(
        newspaper: Newspaper,
        category: &str,
        subcategory: &str,
        url: &str,
        tags: &[&str],
    ) -> Self {
        Self {
            newspaper_name: newspaper.name().to_string(),
            newspaper_id: newspaper.id().to_string(),
            original_category: category.to_string(),
            original_subcategory: subcategory.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            url: url.to_string(),
        }
    }

    /// The newspaper family this source belongs to, if it is a known one.
    pub fn newspaper(&self) -> Option<Newspaper> {
        Newspaper::from_id(&self.newspaper_id)
    }
}

/// An image embedded in an article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Picture {
    #[serde(rename = "url")]
    pub image_url: String,
    pub caption: String,
}

/// A harvested article.
///
/// The `id` is derived from `url` alone (see [`identity_digest`]), so
/// scraping the same page twice always yields the same identity even when
/// the title or body were edited in between.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    pub id: String,
    pub author: String,
    pub datetime: DateTime<Utc>,
    pub title: String,
    /// Dateline label split off the start of the body, or empty.
    pub location: String,
    pub content: String,
    pub pictures: Vec<Picture>,
    pub tags: Vec<String>,
    /// Canonical detail page URL.
    pub url: String,
    pub source: Source,
}

impl Article {
    /// Create an article for `url`, computing its identity.
    pub fn new(url: &str, source: &Source) -> Self {
        Self {
            id: identity_digest(url),
            author: String::new(),
            datetime: DateTime::<Utc>::UNIX_EPOCH,
            title: String::new(),
            location: String::new(),
            content: String::new(),
            pictures: Vec::new(),
            tags: Vec::new(),
            url: url.to_string(),
            source: source.clone(),
        }
    }
}

/// Hex encoded SHA-1 of a canonical article URL.
pub fn identity_digest(url: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_source() -> Source {
        Source::new(
            Newspaper::Nst,
            "News",
            "Nation",
            "https://www.nst.com.my/news/nation",
            &["news", "nation"],
        )
    }

    #[test]
    fn test_identity_digest_is_deterministic() {
        let url = "https://www.nst.com.my/news/nation/2018/07/1234/some-story";
        assert_eq!(identity_digest(url), identity_digest(url));
        assert_eq!(identity_digest(url).len(), 40);
        assert_ne!(identity_digest(url), identity_digest("https://www.nst.com.my/other"));
    }

    #[test]
    fn test_identity_digest_known_value() {
        assert_eq!(
            identity_digest("abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_identity_ignores_content() {
        let source = sample_source();
        let mut a = Article::new("https://www.nst.com.my/a", &source);
        let b = Article::new("https://www.nst.com.my/a", &source);
        a.title = "Edited headline".to_string();
        a.content = "Edited body".to_string();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_newspaper_ids_round_trip() {
        for n in Newspaper::ALL {
            assert_eq!(Newspaper::from_id(n.id()), Some(n));
        }
        assert_eq!(Newspaper::from_id("thestar"), None);
    }

    #[test]
    fn test_source_newspaper_lookup() {
        assert_eq!(sample_source().newspaper(), Some(Newspaper::Nst));
        let mut unknown = sample_source();
        unknown.newspaper_id = "thestar".to_string();
        assert_eq!(unknown.newspaper(), None);
    }

    #[test]
    fn test_article_serialization_field_names() {
        let mut article = Article::new("https://www.nst.com.my/a", &sample_source());
        article.datetime = Utc.with_ymd_and_hms(2018, 7, 12, 11, 35, 0).unwrap();
        article.pictures.push(Picture {
            image_url: "https://img.example/1.jpg".to_string(),
            caption: "A caption".to_string(),
        });

        let json: serde_json::Value = serde_json::to_value(&article).unwrap();
        assert_eq!(json["pictures"][0]["url"], "https://img.example/1.jpg");
        assert_eq!(json["source"]["id"], "nst");
        assert_eq!(json["source"]["name"], "New Straits Times");
        assert_eq!(json["source"]["subcategory"], "Nation");
        assert_eq!(json["datetime"], "2018-07-12T11:35:00Z");
    }

    #[test]
    fn test_article_deserialization() {
        let mut article = Article::new("https://www.nst.com.my/a", &sample_source());
        article.tags = vec!["politik".to_string()];
        let json = serde_json::to_string(&article).unwrap();
        let back: Article = serde_json::from_str(&json).unwrap();
        assert_eq!(back, article);
    }
}
