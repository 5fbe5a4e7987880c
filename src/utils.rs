//! Utility functions for text extraction, string manipulation, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Element text collection for the DOM-based extractors
//! - Dateline ("location") splitting for article bodies
//! - String truncation for logging
//! - Directory preparation for on-disk stores

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// A dateline label: up to four upper-case words (dots, hyphens and
/// apostrophes allowed inside a word) immediately followed by a colon.
static LOCATION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\p{Lu}[\p{Lu}.'\-]*(?:\s+\p{Lu}[\p{Lu}.'\-]*){0,3})\s*:").unwrap()
});

/// Concatenate all text nodes below an element.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Join paragraph texts the way article bodies are stored: every paragraph
/// followed by a newline.
pub fn join_paragraphs<'a, I>(paragraphs: I) -> String
where
    I: IntoIterator<Item = ElementRef<'a>>,
{
    let mut content = String::new();
    for p in paragraphs {
        content.push_str(&element_text(&p));
        content.push('\n');
    }
    content
}

/// Split a leading `Label:` dateline off an article body.
///
/// Returns `(location, content)`. The label must sit on the first line of
/// the body; one space after the colon is dropped. Bodies without a
/// dateline are returned unchanged with an empty location.
///
/// # Examples
///
/// ```ignore
/// let (loc, body) = split_location("KUALA LUMPUR: The cabinet met.\n");
/// assert_eq!(loc, "KUALA LUMPUR");
/// assert_eq!(body, "The cabinet met.\n");
/// ```
pub fn split_location(content: &str) -> (String, String) {
    let first_line = content.lines().next().unwrap_or_default();
    if let Some(caps) = LOCATION_LABEL.captures(first_line) {
        let whole = caps.get(0).map(|m| m.end()).unwrap_or_default();
        let label = caps[1].trim().to_string();
        let rest = &content[whole..];
        let rest = rest.strip_prefix(' ').unwrap_or(rest);
        debug!(location = %label, "Split dateline from body");
        return (label, rest.to_string());
    }
    (String::new(), content.to_string())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary before `max` bytes
/// and get an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Make sure the parent directory of a file path exists.
///
/// Used before opening the SQLite database so that a fresh `--db-path`
/// like `data/news.db` works without manual setup.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
            debug!(dir = %parent.display(), "Database directory ready");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        // "é" is two bytes; cutting at 3 would split the second one.
        let result = truncate_for_log("éééé", 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("(+6 bytes)"));
    }

    #[test]
    fn test_split_location() {
        let (loc, body) = split_location("KUALA LUMPUR: The cabinet met today.\nMore.\n");
        assert_eq!(loc, "KUALA LUMPUR");
        assert_eq!(body, "The cabinet met today.\nMore.\n");
    }

    #[test]
    fn test_split_location_without_label() {
        let text = "The cabinet met today.\n";
        let (loc, body) = split_location(text);
        assert_eq!(loc, "");
        assert_eq!(body, text);
    }

    #[test]
    fn test_split_location_ignores_colon_in_sentence() {
        let text = "The minister told reporters that the plan was final: no changes.\n";
        let (loc, body) = split_location(text);
        assert_eq!(loc, "");
        assert_eq!(body, text);
    }

    #[test]
    fn test_split_location_needs_upper_case_label() {
        for text in ["He said: we will win.\n", "Kuala Lumpur: mixed case.\n"] {
            let (loc, body) = split_location(text);
            assert_eq!(loc, "");
            assert_eq!(body, text);
        }
        assert_eq!(split_location("ALOR SETAR: Hujan.\n").0, "ALOR SETAR");
    }

    #[test]
    fn test_split_location_ignores_colon_on_later_line() {
        let text = "Opening paragraph.\nPUTRAJAYA: late colon.\n";
        assert_eq!(split_location(text).0, "");
    }

    #[test]
    fn test_split_location_keeps_extra_spaces() {
        let (loc, body) = split_location("IPOH:  Two spaces.\n");
        assert_eq!(loc, "IPOH");
        assert_eq!(body, " Two spaces.\n");
    }

    #[test]
    fn test_join_paragraphs() {
        let doc = Html::parse_fragment("<div><p>One <b>bold</b></p><p>Two</p></div>");
        let sel = Selector::parse("p").unwrap();
        assert_eq!(join_paragraphs(doc.select(&sel)), "One bold\nTwo\n");
    }
}
