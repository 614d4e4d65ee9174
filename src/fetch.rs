//! Page fetch capability: trait seam plus the reqwest-backed implementation.
//!
//! The worker pool talks to a [`PageFetcher`] trait object so tests can
//! substitute deterministic fetchers; [`HttpFetcher`] is the production
//! implementation against the CBSE affiliation directory.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Default directory endpoint. One school per page, keyed by `affno`.
pub const DEFAULT_BASE_URL: &str =
    "https://saras.cbse.gov.in/cbse_aff/schdir_Report/AppViewdir.aspx";

/// Per-request timeout so one unresponsive endpoint cannot stall a worker
/// beyond this bound.
pub const FETCH_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur while fetching one page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS, etc.)
    #[error("network error fetching affno {affno}: {source}")]
    Network {
        /// The affiliation number being fetched.
        affno: u32,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching affno {affno}")]
    Timeout {
        /// The affiliation number that timed out.
        affno: u32,
    },

    /// Non-success HTTP response (4xx, 5xx).
    #[error("HTTP {status} fetching affno {affno}")]
    HttpStatus {
        /// The affiliation number being fetched.
        affno: u32,
        /// The HTTP status code.
        status: u16,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(affno: u32, source: reqwest::Error) -> Self {
        Self::Network { affno, source }
    }

    /// Creates a timeout error.
    pub fn timeout(affno: u32) -> Self {
        Self::Timeout { affno }
    }

    /// Creates an HTTP status error.
    pub fn http_status(affno: u32, status: u16) -> Self {
        Self::HttpStatus { affno, status }
    }
}

/// Capability to fetch the raw page body for one affiliation number.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the page for `affno`, returning its body on success.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure, timeout, or a
    /// non-success HTTP status.
    async fn fetch_page(&self, affno: u32) -> Result<String, FetchError>;
}

/// HTTP fetcher for directory pages.
///
/// Created once and reused across the whole job, taking advantage of
/// connection pooling.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Creates a fetcher against the default directory endpoint.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a fetcher against a custom endpoint (used by tests to point
    /// at a mock server).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_base_url_and_timeout(base_url, Duration::from_secs(FETCH_TIMEOUT_SECS))
    }

    /// Creates a fetcher with an explicit per-request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_base_url_and_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(concat!("affdir/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, affno: u32) -> Result<String, FetchError> {
        let url = format!("{}?affno={}", self.base_url, affno);
        debug!(affno, %url, "fetching page");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(affno)
            } else {
                FetchError::network(affno, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(affno, status.as_u16()));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(affno)
            } else {
                FetchError::network(affno, e)
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_fetch_error_display() {
        let error = FetchError::timeout(12345);
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("12345"));

        let error = FetchError::http_status(12345, 404);
        assert!(error.to_string().contains("404"));
    }

    #[test]
    fn test_default_base_url() {
        let fetcher = HttpFetcher::new();
        assert!(fetcher.base_url().contains("cbse.gov.in"));
    }

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/AppViewdir.aspx"))
            .and(query_param("affno", "1030005"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_base_url(format!("{}/AppViewdir.aspx", server.uri()));
        let body = fetcher.fetch_page(1030005).await.unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::with_base_url(server.uri());
        let result = fetcher.fetch_page(42).await;
        match result {
            Err(FetchError::HttpStatus { affno: 42, status: 500 }) => {}
            other => panic!("expected HttpStatus error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        // Port 1 is essentially never listening
        let fetcher = HttpFetcher::with_base_url("http://127.0.0.1:1/dir");
        let result = fetcher.fetch_page(7).await;
        assert!(matches!(result, Err(FetchError::Network { affno: 7, .. })));
    }
}
