//! Relational store on SQLite.
//!
//! One `news` row per article (unique on `gen_id`, the identity digest) with
//! the source denormalized into `newspaper_*` columns, and one `pictures`
//! row per picture, deleted together with its article. Timestamps are kept
//! as fixed-width RFC 3339 UTC text so range filters can compare strings.

use super::{NewsStore, StoreError};
use crate::models::{Article, Picture, Source};
use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use rusqlite::types::Value;
use rusqlite::{Connection, Params, Row, params};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

const MIGRATE: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS news (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        gen_id TEXT NOT NULL UNIQUE,
        author TEXT,
        datetime TEXT,
        title TEXT,
        location TEXT,
        content TEXT,
        tags TEXT,
        url TEXT,
        newspaper_name TEXT,
        newspaper_id TEXT,
        newspaper_category TEXT,
        newspaper_subcategory TEXT,
        newspaper_tags TEXT,
        newspaper_url TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_news_datetime ON news(datetime);
    CREATE INDEX IF NOT EXISTS idx_news_newspaper ON news(newspaper_id);

    CREATE TABLE IF NOT EXISTS pictures (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        news_id TEXT NOT NULL REFERENCES news(gen_id) ON DELETE CASCADE,
        url TEXT,
        caption TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_pictures_news ON pictures(news_id);
"#;

const SELECT_NEWS: &str = "SELECT id, gen_id, author, datetime, title, location, content, tags, url, \
     newspaper_name, newspaper_id, newspaper_category, newspaper_subcategory, newspaper_tags, newspaper_url \
     FROM news";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and apply the schema.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open(path)?,
        };
        store.migrate()?;
        info!("SQLite store ready");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(MIGRATE)?;
        Ok(())
    }

    /// Load articles matching `filter` (a SQL `WHERE` clause), deleting rows
    /// that do not decode.
    fn load<P: Params>(&self, filter: &str, params: P) -> Result<Vec<Article>, StoreError> {
        let sql = format!("{SELECT_NEWS} WHERE {filter} ORDER BY datetime DESC, gen_id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params, RawNews::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut list = Vec::with_capacity(rows.len());
        let mut corrupt = Vec::new();
        for raw in rows {
            let pk = raw.pk;
            let decoded = match raw.decode() {
                Ok(article) => self
                    .pictures(&article.id)?
                    .map(|pictures| Article { pictures, ..article }),
                Err(reason) => Err(reason),
            };
            match decoded {
                Ok(article) => list.push(article),
                Err(reason) => {
                    warn!(pk, %reason, "Undecodable news row; deleting");
                    corrupt.push(pk);
                }
            }
        }

        for pk in corrupt {
            self.conn.execute("DELETE FROM news WHERE id = ?1", params![pk])?;
        }
        Ok(list)
    }

    /// Pictures of one article. The inner error names a picture cell of the
    /// wrong type, which makes the owning article undecodable.
    fn pictures(&self, news_id: &str) -> Result<Result<Vec<Picture>, String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT url, caption FROM pictures WHERE news_id = ?1 ORDER BY id")?;
        let cells = stmt
            .query_map(params![news_id], |row| {
                Ok((row.get::<_, Value>(0)?, row.get::<_, Value>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cells
            .into_iter()
            .map(|(url, caption)| -> Result<Picture, String> {
                Ok(Picture {
                    image_url: text_or_empty(url, "pictures.url")?,
                    caption: text_or_empty(caption, "pictures.caption")?,
                })
            })
            .collect())
    }
}

impl NewsStore for SqliteStore {
    #[instrument(level = "info", skip_all, fields(batch = batch.len()))]
    fn insert(&mut self, batch: &[Article]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut news = tx.prepare(
                "INSERT OR IGNORE INTO news (gen_id, author, datetime, title, location, content, tags, url, \
                 newspaper_name, newspaper_id, newspaper_category, newspaper_subcategory, newspaper_tags, newspaper_url) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            let mut pictures =
                tx.prepare("INSERT INTO pictures (news_id, url, caption) VALUES (?1, ?2, ?3)")?;

            for a in batch {
                let changed = news.execute(params![
                    a.id,
                    a.author,
                    format_datetime(&a.datetime),
                    a.title,
                    a.location,
                    a.content,
                    a.tags.iter().join(","),
                    a.url,
                    a.source.newspaper_name,
                    a.source.newspaper_id,
                    a.source.original_category,
                    a.source.original_subcategory,
                    a.source.tags.iter().join(","),
                    a.source.url,
                ])?;
                if changed == 0 {
                    debug!(id = %a.id, "Already stored");
                    continue;
                }
                for p in &a.pictures {
                    pictures.execute(params![a.id, p.image_url, p.caption])?;
                }
                inserted += 1;
            }
        }
        tx.commit()?;

        info!(inserted, skipped = batch.len() - inserted, "Inserted batch");
        Ok(inserted)
    }

    fn get_all(
        &mut self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Article>, StoreError> {
        self.load(
            "(?1 IS NULL OR datetime <= ?1) AND (?2 IS NULL OR datetime >= ?2)",
            params![from.map(|d| format_datetime(&d)), until.map(|d| format_datetime(&d))],
        )
    }

    fn get_by_provider(&mut self, provider_id: &str) -> Result<Vec<Article>, StoreError> {
        self.load("newspaper_id = ?1", params![provider_id])
    }
}

fn format_datetime(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn split_tags(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(',').map(str::to_string).collect()
}

/// Text of a column, or an error naming it when SQLite holds another type.
fn text(value: Value, column: &str) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(format!("{column}: expected TEXT, found {}", other.data_type())),
    }
}

fn text_or_empty(value: Value, column: &str) -> Result<String, String> {
    Ok(text(value, column)?.unwrap_or_default())
}

/// A `news` row as stored, before validation.
///
/// Columns are read as untyped values so that a cell of the wrong type
/// surfaces as a decode failure of this row, not as a query error.
struct RawNews {
    pk: i64,
    gen_id: Value,
    author: Value,
    datetime: Value,
    title: Value,
    location: Value,
    content: Value,
    tags: Value,
    url: Value,
    newspaper_name: Value,
    newspaper_id: Value,
    newspaper_category: Value,
    newspaper_subcategory: Value,
    newspaper_tags: Value,
    newspaper_url: Value,
}

impl RawNews {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            pk: row.get(0)?,
            gen_id: row.get(1)?,
            author: row.get(2)?,
            datetime: row.get(3)?,
            title: row.get(4)?,
            location: row.get(5)?,
            content: row.get(6)?,
            tags: row.get(7)?,
            url: row.get(8)?,
            newspaper_name: row.get(9)?,
            newspaper_id: row.get(10)?,
            newspaper_category: row.get(11)?,
            newspaper_subcategory: row.get(12)?,
            newspaper_tags: row.get(13)?,
            newspaper_url: row.get(14)?,
        })
    }

    fn decode(self) -> Result<Article, String> {
        let id = text(self.gen_id, "gen_id")?.ok_or("missing gen_id")?;
        let datetime_text = text(self.datetime, "datetime")?.ok_or("missing datetime")?;
        let datetime = DateTime::parse_from_rfc3339(&datetime_text)
            .map_err(|e| format!("datetime {datetime_text:?}: {e}"))?
            .with_timezone(&Utc);
        let url = text(self.url, "url")?.ok_or("missing url")?;

        Ok(Article {
            id,
            author: text_or_empty(self.author, "author")?,
            datetime,
            title: text_or_empty(self.title, "title")?,
            location: text_or_empty(self.location, "location")?,
            content: text_or_empty(self.content, "content")?,
            pictures: Vec::new(),
            tags: split_tags(&text_or_empty(self.tags, "tags")?),
            url,
            source: Source {
                newspaper_name: text_or_empty(self.newspaper_name, "newspaper_name")?,
                newspaper_id: text_or_empty(self.newspaper_id, "newspaper_id")?,
                original_category: text_or_empty(self.newspaper_category, "newspaper_category")?,
                original_subcategory: text_or_empty(
                    self.newspaper_subcategory,
                    "newspaper_subcategory",
                )?,
                tags: split_tags(&text_or_empty(self.newspaper_tags, "newspaper_tags")?),
                url: text_or_empty(self.newspaper_url, "newspaper_url")?,
            },
        })
    }
}
