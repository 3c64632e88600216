// src/crawl/outcome.rs
// =============================================================================
// What a crawl hands back to its caller.
//
// - CrawlOutcome: every unique URL found, plus the URLs that failed and why
// - CrawlStats: counters for the summary line
//
// Everything here is Serialize so the binary can dump it as JSON.
// =============================================================================

use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::ErrorKind;

// One URL that could not be (fully) processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlFailure {
    /// The canonical URL (or the raw seed text for InvalidUrl)
    pub url: String,
    pub kind: ErrorKind,
    /// Optional message with more details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Jobs handed to a worker
    pub jobs_dispatched: usize,
    /// Jobs a worker finished, successfully or not
    pub jobs_completed: usize,
    /// Jobs whose fetch failed
    pub pages_failed: usize,
    /// Links extracted across all pages, duplicates included
    pub links_discovered: usize,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlOutcome {
    /// Canonical form of every URL scheduled during the crawl, sorted
    pub unique_urls: BTreeSet<String>,
    /// Failures in the order they were recorded
    pub errors: Vec<CrawlFailure>,
    pub stats: CrawlStats,
    /// True when the crawl was stopped before it ran out of work
    pub cancelled: bool,
}

impl CrawlOutcome {
    // True when no URL failed and the crawl ran to completion.
    // A truncated page still had its links followed, so it doesn't count.
    pub fn is_clean(&self) -> bool {
        !self.cancelled
            && self
                .errors
                .iter()
                .all(|f| f.kind == ErrorKind::ExtractionTruncated)
    }

    pub fn failures_of(&self, kind: ErrorKind) -> impl Iterator<Item = &CrawlFailure> {
        self.errors.iter().filter(move |f| f.kind == kind)
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
