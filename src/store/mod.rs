//! Article persistence with at-most-one-copy-per-identity semantics.
//!
//! Two backends implement [`NewsStore`]:
//!
//! | Backend | Module | Layout |
//! |---------|--------|--------|
//! | SQLite | [`sqlite`] | `news` + `pictures` tables, unique on the identity digest |
//! | Key-value | [`kv`] | one JSON record per identity digest in a single bucket, kept in a JSON file |
//!
//! Stores are written by a single task (the refresher's collector), so the
//! trait takes `&mut self` and makes no promises about concurrent writers.
//! Records that fail to decode on read are deleted and left out of the
//! result instead of failing the query.

pub mod kv;
pub mod sqlite;

use crate::models::Article;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

pub use kv::KvStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a valid store file: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode article {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait NewsStore: Send {
    /// Persist every article whose identity is not stored yet.
    ///
    /// Duplicates are skipped silently. Returns the number of new articles.
    fn insert(&mut self, batch: &[Article]) -> Result<usize, StoreError>;

    /// Articles with `until <= datetime <= from`. A `None` bound leaves that
    /// side of the range open.
    fn get_all(
        &mut self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Article>, StoreError>;

    /// Keyword search is not supported; always empty.
    fn get_by_keywords(&mut self, _keywords: &[String]) -> Result<Vec<Article>, StoreError> {
        Ok(Vec::new())
    }

    /// All stored articles of one newspaper.
    fn get_by_provider(&mut self, provider_id: &str) -> Result<Vec<Article>, StoreError>;
}

/// Whether `datetime` lies in the (inclusive, possibly open) range.
pub fn in_range(
    datetime: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> bool {
    from.is_none_or(|f| datetime <= f) && until.is_none_or(|u| datetime >= u)
}
