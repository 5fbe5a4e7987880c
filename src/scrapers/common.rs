//! Markup shared by the Drupal-based sites (NST and Berita Harian).

use super::ListingEntry;
use crate::models::Picture;
use crate::utils::{element_text, join_paragraphs, split_location};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static VIEW_CONTENT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.view-content").unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("div.views-row-inner").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("div.field-item.even p").unwrap());
static GALLERY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.view.view-article-gallery").unwrap());
static GALLERY_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.views-field.views-field-field-image img").unwrap());
static GALLERY_CAPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.views-field.views-field-field-image-caption div.field-content").unwrap()
});

/// Number of `div.view-content` blocks; each site uses a fixed count to
/// tell a real listing page from an empty one.
pub fn view_content_blocks(doc: &Html) -> usize {
    doc.select(&VIEW_CONTENT).count()
}

/// Listing rows, each reduced to the first anchor matching `link`.
///
/// A row without any anchor yields an entry with no link.
pub fn listing_rows(doc: &Html, link: &Selector) -> Vec<ListingEntry> {
    doc.select(&ROW)
        .map(|row| match row.select(link).next() {
            Some(a) => ListingEntry {
                title: element_text(&a).trim().to_string(),
                href: a.value().attr("href").map(str::to_string),
            },
            None => ListingEntry {
                title: String::new(),
                href: None,
            },
        })
        .collect()
}

/// Body paragraphs with the dateline split off: `(location, content)`.
pub fn body(doc: &Html) -> (String, String) {
    let content = join_paragraphs(doc.select(&BODY));
    split_location(&content)
}

/// Pictures of the article gallery; images without `data-src` are skipped.
pub fn gallery(doc: &Html) -> Vec<Picture> {
    doc.select(&GALLERY)
        .filter_map(|g| {
            let image_url = g.select(&GALLERY_IMAGE).next()?.value().attr("data-src")?;
            let caption = g
                .select(&GALLERY_CAPTION)
                .next()
                .map(|c| element_text(&c).trim().to_string())
                .unwrap_or_default();
            Some(Picture {
                image_url: image_url.to_string(),
                caption,
            })
        })
        .collect()
}
