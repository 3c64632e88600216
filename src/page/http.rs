// src/page/http.rs
// =============================================================================
// This module downloads pages.
//
// Key functionality:
// - Fetcher trait: the one thing the crawl engine needs from the network,
//   "GET this url within this timeout, give me the body or an error"
// - ReqwestFetcher: the real implementation on top of reqwest
// - Sorts reqwest failures into Timeout / Network / HttpStatus
//
// Redirects are followed by the transport (up to 5); what comes back after
// that is judged by its final status.
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::error::FetchError;

// Name the user agent after the app
pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

// Something that can perform a bounded-time GET.
//
// Implementations must not panic on odd content; a body that is not HTML is
// the extractor's problem, not the fetcher's.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}

// reqwest-backed fetcher.
//
// The Client is cheap to clone (it's an Arc inside) and pools connections,
// so one instance is shared by every worker.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        // The per-request timeout covers connect, headers and body
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status();
        tracing::trace!(url, status = status.as_u16(), "response received");

        if !status.is_success() {
            // 4xx/5xx (and a 3xx left over after the redirect limit): no body
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(categorize_error)?;
        Ok(body.to_vec())
    }
}

// Categorizes reqwest errors
//
// - timeout while connecting or reading the body -> Timeout
// - everything else (DNS, refused, TLS, redirect loop, broken body) -> Network
fn categorize_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::Timeout;
    }

    let message = if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };
    FetchError::Network(message)
}
