// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// Two kinds of failure exist:
// - Per-URL failures (FetchError, ErrorKind): recorded in the outcome, the
//   crawl keeps going
// - Configuration failures (ConfigError): reported before any worker starts
// =============================================================================

use serde::Serialize;
use thiserror::Error;

// Why a single fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No complete response within the crawl timeout
    #[error("request timed out")]
    Timeout,
    /// Connection, DNS, TLS or redirect failure
    #[error("network error: {0}")]
    Network(String),
    /// The server answered with a non-2xx status
    #[error("HTTP {0}")]
    HttpStatus(u16),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Timeout => ErrorKind::Timeout,
            FetchError::Network(_) => ErrorKind::Network,
            FetchError::HttpStatus(_) => ErrorKind::HttpStatus,
        }
    }
}

// Classification of a per-URL failure as it appears in the crawl outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Timeout,
    Network,
    HttpStatus,
    /// The body ended inside a tag; earlier links were kept
    ExtractionTruncated,
    /// A seed that is not an absolute http(s) URL
    InvalidUrl,
}

// Rejected configuration. Nothing has been fetched when one of these is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid max depth {0}: must be >= 0")]
    InvalidDepth(i64),
    #[error("invalid thread count {0}: must be >= 1")]
    InvalidThreadCount(i64),
    #[error("invalid crawl interval {0}: must be >= 0")]
    InvalidInterval(i64),
    #[error("invalid crawl timeout: must be > 0")]
    InvalidTimeout,
    #[error("no seed urls given")]
    NoSeeds,
    #[error("failed to read seed list: {0}")]
    Seeds(String),
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),
}
