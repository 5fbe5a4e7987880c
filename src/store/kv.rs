//! Key-value store: one serialized record per identity digest.
//!
//! Records live in a single ordered `news` bucket keyed by article id and
//! hold the article's JSON encoding. A store opened on a path keeps the
//! buckets in one JSON file there, rewritten after every change:
//!
//! ```text
//! { "news": { "<id>": "<article json>", ... } }
//! ```

use super::{NewsStore, StoreError, in_range};
use crate::models::Article;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

const BUCKET: &str = "news";

type Buckets = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Default)]
pub struct KvStore {
    bucket: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl KvStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the file at `path`, starting empty when it does not exist yet.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let io_error = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        let mut buckets = if path.exists() {
            let text = fs::read_to_string(&path).map_err(io_error)?;
            serde_json::from_str::<Buckets>(&text).map_err(|source| StoreError::File {
                path: path.clone(),
                source,
            })?
        } else {
            Buckets::new()
        };

        let bucket = buckets.remove(BUCKET).unwrap_or_default();
        info!(records = bucket.len(), "Key-value store ready");
        Ok(Self {
            bucket,
            path: Some(path),
        })
    }

    /// Write the buckets back to disk, replacing the file in one rename.
    fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_error = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        let buckets = BTreeMap::from([(BUCKET, &self.bucket)]);
        let text = serde_json::to_string(&buckets).map_err(|source| StoreError::File {
            path: path.clone(),
            source,
        })?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, text).map_err(io_error)?;
        fs::rename(&tmp, path).map_err(io_error)?;
        debug!(path = %path.display(), records = self.bucket.len(), "Flushed");
        Ok(())
    }

    /// Decode every record passing `keep`, deleting the ones that do not
    /// decode.
    fn scan<F>(&mut self, keep: F) -> Result<Vec<Article>, StoreError>
    where
        F: Fn(&Article) -> bool,
    {
        let mut list = Vec::new();
        let mut corrupt = Vec::new();

        for (key, value) in &self.bucket {
            match serde_json::from_str::<Article>(value) {
                Ok(article) => {
                    if keep(&article) {
                        list.push(article);
                    }
                }
                Err(e) => {
                    warn!(bucket = BUCKET, %key, error = %e, "Undecodable record; deleting");
                    corrupt.push(key.clone());
                }
            }
        }

        if !corrupt.is_empty() {
            for key in corrupt {
                self.bucket.remove(&key);
            }
            self.flush()?;
        }
        Ok(list)
    }
}

impl NewsStore for KvStore {
    fn insert(&mut self, batch: &[Article]) -> Result<usize, StoreError> {
        // Encode everything first so a bad article leaves the bucket untouched.
        let mut encoded = Vec::with_capacity(batch.len());
        for article in batch {
            let record = serde_json::to_string(article).map_err(|source| StoreError::Encode {
                id: article.id.clone(),
                source,
            })?;
            encoded.push((article.id.clone(), record));
        }

        let mut inserted = 0;
        for (key, record) in encoded {
            if self.bucket.contains_key(&key) {
                debug!(%key, "Already stored");
                continue;
            }
            self.bucket.insert(key, record);
            inserted += 1;
        }
        if inserted > 0 {
            self.flush()?;
        }

        info!(bucket = BUCKET, inserted, skipped = batch.len() - inserted, "Inserted batch");
        Ok(inserted)
    }

    fn get_all(
        &mut self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Article>, StoreError> {
        self.scan(|a| in_range(a.datetime, from, until))
    }

    fn get_by_provider(&mut self, provider_id: &str) -> Result<Vec<Article>, StoreError> {
        self.scan(|a| a.source.newspaper_id == provider_id)
    }
}

#[cfg(test)]
impl KvStore {
    pub fn len(&self) -> usize {
        self.bucket.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bucket.is_empty()
    }

    pub fn put_raw(&mut self, key: &str, value: &str) {
        self.bucket.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::article;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 7, d, 12, 0, 0).unwrap()
    }

    /// A fresh file path under the system temp dir, unique per test.
    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scrapenews-kv-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir.join("news.db")
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut store = KvStore::in_memory();
        let a = article("https://www.nst.com.my/a", day(1));

        assert_eq!(store.insert(&[a.clone()]).unwrap(), 1);
        assert_eq!(store.insert(&[a.clone()]).unwrap(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_does_not_overwrite() {
        let mut store = KvStore::in_memory();
        let a = article("https://www.nst.com.my/a", day(1));
        let mut edited = a.clone();
        edited.title = "Edited".to_string();

        store.insert(&[a.clone()]).unwrap();
        store.insert(&[edited]).unwrap();
        let all = store.get_all(None, None).unwrap();
        assert_eq!(all, vec![a]);
    }

    #[test]
    fn test_mixed_batch_writes_only_new() {
        let mut store = KvStore::in_memory();
        let a = article("https://www.nst.com.my/a", day(1));
        let b = article("https://www.nst.com.my/b", day(2));
        let c = article("https://www.nst.com.my/c", day(3));
        store.insert(&[a.clone()]).unwrap();

        assert_eq!(store.insert(&[a, b, c]).unwrap(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_get_all_range() {
        let mut store = KvStore::in_memory();
        let batch: Vec<_> = (1..=5)
            .map(|d| article(&format!("https://www.nst.com.my/{d}"), day(d)))
            .collect();
        store.insert(&batch).unwrap();

        let mid = store.get_all(Some(day(4)), Some(day(2))).unwrap();
        let mut days: Vec<_> = mid.iter().map(|a| a.datetime).collect();
        days.sort();
        assert_eq!(days, vec![day(2), day(3), day(4)]);

        assert_eq!(store.get_all(Some(day(2)), None).unwrap().len(), 2);
        assert_eq!(store.get_all(None, Some(day(4))).unwrap().len(), 2);
        assert_eq!(store.get_all(None, None).unwrap().len(), 5);
        assert!(store
            .get_all(Some(day(1) - Duration::days(1)), None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_get_all_is_deterministic() {
        let mut store = KvStore::in_memory();
        let batch: Vec<_> = (1..=4)
            .map(|d| article(&format!("https://www.nst.com.my/{d}"), day(d)))
            .collect();
        store.insert(&batch).unwrap();
        assert_eq!(
            store.get_all(None, None).unwrap(),
            store.get_all(None, None).unwrap()
        );
    }

    #[test]
    fn test_corrupt_record_is_purged() {
        let mut store = KvStore::in_memory();
        store
            .insert(&[article("https://www.nst.com.my/a", day(1))])
            .unwrap();
        store.put_raw("deadbeef", "{not json");

        let all = store.get_all(None, None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_by_provider_and_keywords() {
        let mut store = KvStore::in_memory();
        store
            .insert(&[article("https://www.nst.com.my/a", day(1))])
            .unwrap();
        assert_eq!(store.get_by_provider("nst").unwrap().len(), 1);
        assert!(store.get_by_provider("utusan").unwrap().is_empty());
        assert!(store
            .get_by_keywords(&["banjir".to_string()])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_records_survive_reopen() {
        let path = temp_path("reopen");
        let a = article("https://www.nst.com.my/a", day(1));
        let b = article("https://www.nst.com.my/b", day(2));
        {
            let mut store = KvStore::open(&path).unwrap();
            assert!(store.is_empty());
            store.insert(&[a.clone(), b.clone()]).unwrap();
        }

        let mut reopened = KvStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.insert(&[a.clone()]).unwrap(), 0);
        let mut urls: Vec<_> = reopened
            .get_all(None, None)
            .unwrap()
            .into_iter()
            .map(|x| x.url)
            .collect();
        urls.sort();
        assert_eq!(urls, vec![a.url, b.url]);
    }

    #[test]
    fn test_purge_is_persisted() {
        let path = temp_path("purge");
        {
            let mut store = KvStore::open(&path).unwrap();
            store
                .insert(&[article("https://www.nst.com.my/a", day(1))])
                .unwrap();
            store.put_raw("deadbeef", "{not json");
            store.flush().unwrap();
        }
        {
            let mut store = KvStore::open(&path).unwrap();
            assert_eq!(store.len(), 2);
            assert_eq!(store.get_all(None, None).unwrap().len(), 1);
        }

        assert_eq!(KvStore::open(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let path = temp_path("garbage");
        fs::write(&path, "not a bucket file").unwrap();
        assert!(matches!(
            KvStore::open(&path),
            Err(StoreError::File { .. })
        ));
    }
}
