//! HTTP fetch capability used by every extractor.
//!
//! Extractors only ever need "GET this URL and give me the HTML", so that is
//! all [`Fetcher`] exposes. [`HttpFetcher`] is the production implementation
//! on top of a shared `reqwest::Client`; tests drive extractors through an
//! in-memory fetcher instead.
//!
//! There is no retry here. A transport failure is final for the current
//! scrape of a source.

use crate::utils::truncate_for_log;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Browser-like user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GET {url} returned {status}")]
    Unavailable { url: String, status: u16 },
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Something that can fetch an HTML document.
///
/// Implementations must be safe to share between workers.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the response body as text.
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// [`Fetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client with the fixed user agent and the given connect/read timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status();

        // Listing pages past the last one answer 4xx with a page that simply
        // lacks the listing markup, so only server errors are failures.
        if status.is_server_error() {
            let preview = response.text().await.unwrap_or_default();
            warn!(
                %url,
                status = status.as_u16(),
                body = %truncate_for_log(&preview, 200),
                "Server error"
            );
            return Err(FetchError::Unavailable {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(request_error)?;
        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched document"
        );
        Ok(body)
    }
}
