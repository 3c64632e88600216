// src/crawl/mod.rs
// =============================================================================
// This module handles the crawl itself.
//
// Features:
// - Breadth-first crawling from any number of seed URLs
// - Configurable depth limit (0 = fetch the seeds only)
// - Fixed-size worker pool with a per-worker delay between requests
// - Deduplication on a canonical URL form
// - Crawl ends when no job is queued or running, or when cancelled
//
// Submodules:
// - frontier: the shared job queue + visited set
// - spider: the engine that runs the worker pool
// - outcome: the result handed back to the caller
// =============================================================================

mod frontier;
mod outcome;
mod spider;

pub use frontier::{canonicalize, Frontier, Job};
pub use outcome::{CrawlFailure, CrawlOutcome, CrawlStats};
pub use spider::Spider;
