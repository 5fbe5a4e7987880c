//! Range query surface over a [`NewsStore`].
//!
//! This is the contract an HTTP layer calls into: it takes the raw `from`
//! and `until` query values, applies the defaults and renders a status code
//! plus a JSON body. Serving it over HTTP is left to the caller.
//!
//! | Parameter | Bound | Absent or unparseable |
//! |-----------|-------|-----------------------|
//! | `from` | upper | now |
//! | `until` | lower | now minus one day |

use crate::models::Article;
use crate::store::{NewsStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, error, instrument};

/// A rendered query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

fn parse_bound(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(d) => Some(d.with_timezone(&Utc)),
        Err(e) => {
            debug!(value = raw, error = %e, "Ignoring unparseable bound");
            None
        }
    }
}

/// Resolve the `(from, until)` pair actually passed to the store.
pub fn resolve_range(
    from: Option<&str>,
    until: Option<&str>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = parse_bound(from).unwrap_or(now);
    let until = parse_bound(until).unwrap_or(now - Duration::days(1));
    (from, until)
}

fn server_error() -> Response {
    let envelope = ErrorEnvelope {
        error: ErrorBody {
            code: "ServerError",
            message: "Server error",
        },
    };
    Response {
        status: 500,
        body: serde_json::to_string(&envelope)
            .unwrap_or_else(|_| r#"{"error":{"code":"ServerError","message":"Server error"}}"#.to_string()),
    }
}

/// Articles published between `until` and `from`, as a JSON array.
///
/// Store failures are logged and answered with a generic 500 envelope.
#[instrument(level = "info", skip(store, now))]
pub fn get_news<S: NewsStore + ?Sized>(
    store: &mut S,
    from: Option<&str>,
    until: Option<&str>,
    now: DateTime<Utc>,
) -> Response {
    let (from, until) = resolve_range(from, until, now);
    debug!(%from, %until, "Resolved range");
    render(store.get_all(Some(from), Some(until)))
}

/// Every stored article of one newspaper, as a JSON array.
#[instrument(level = "info", skip(store))]
pub fn get_news_by_provider<S: NewsStore + ?Sized>(store: &mut S, provider_id: &str) -> Response {
    render(store.get_by_provider(provider_id))
}

fn render(result: Result<Vec<Article>, StoreError>) -> Response {
    let articles = match result {
        Ok(a) => a,
        Err(e) => {
            error!(error = %e, "Query failed");
            return server_error();
        }
    };

    match serde_json::to_string(&articles) {
        Ok(body) => {
            debug!(count = articles.len(), "Query answered");
            Response { status: 200, body }
        }
        Err(e) => {
            error!(error = %e, "Could not encode articles");
            server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KvStore;
    use crate::test_support::article;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 7, 12, 12, 0, 0).unwrap()
    }

    struct BrokenStore;

    impl NewsStore for BrokenStore {
        fn insert(&mut self, _batch: &[Article]) -> Result<usize, StoreError> {
            Ok(0)
        }

        fn get_all(
            &mut self,
            _from: Option<DateTime<Utc>>,
            _until: Option<DateTime<Utc>>,
        ) -> Result<Vec<Article>, StoreError> {
            Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        fn get_by_provider(&mut self, _provider_id: &str) -> Result<Vec<Article>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_resolve_range_defaults() {
        assert_eq!(
            resolve_range(None, None, now()),
            (now(), now() - Duration::days(1))
        );
        assert_eq!(
            resolve_range(Some("yesterday"), Some("2018-13-01"), now()),
            (now(), now() - Duration::days(1))
        );
    }

    #[test]
    fn test_resolve_range_parses_rfc3339() {
        let (from, until) = resolve_range(
            Some("2018-07-10T08:00:00+08:00"),
            Some("2018-07-01T00:00:00Z"),
            now(),
        );
        assert_eq!(from, Utc.with_ymd_and_hms(2018, 7, 10, 0, 0, 0).unwrap());
        assert_eq!(until, Utc.with_ymd_and_hms(2018, 7, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_get_news_default_window() {
        let mut store = KvStore::in_memory();
        store
            .insert(&[
                article("https://www.nst.com.my/recent", now() - Duration::hours(2)),
                article("https://www.nst.com.my/old", now() - Duration::days(3)),
            ])
            .unwrap();

        let response = get_news(&mut store, None, None, now());
        assert_eq!(response.status, 200);

        let body: Vec<Article> = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].url, "https://www.nst.com.my/recent");
    }

    #[test]
    fn test_get_news_body_shape() {
        let mut store = KvStore::in_memory();
        store
            .insert(&[article("https://www.nst.com.my/a", now())])
            .unwrap();

        let response = get_news(&mut store, None, None, now());
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        let first = &body[0];
        assert_eq!(first["url"], "https://www.nst.com.my/a");
        assert_eq!(first["source"]["id"], "nst");
        assert!(first["pictures"].is_array());
    }

    #[test]
    fn test_get_news_by_provider() {
        let mut store = KvStore::in_memory();
        store
            .insert(&[article("https://www.nst.com.my/a", now() - Duration::days(30))])
            .unwrap();

        let nst: Vec<Article> =
            serde_json::from_str(&get_news_by_provider(&mut store, "nst").body).unwrap();
        assert_eq!(nst.len(), 1);
        assert_eq!(get_news_by_provider(&mut store, "utusan").body, "[]");
    }

    #[test]
    fn test_get_news_store_failure_is_opaque() {
        let response = get_news(&mut BrokenStore, None, None, now());
        assert_eq!(response.status, 500);
        assert_eq!(
            response.body,
            r#"{"error":{"code":"ServerError","message":"Server error"}}"#
        );
    }
}
