//! A breadth-first web crawler.
//!
//! Given seed URLs and a maximum depth, [`Spider`] fetches pages with a
//! fixed-size pool of workers, pulls `http`/`https` links out of `<a href>`
//! tags, and keeps following newly found URLs until nothing within
//! `max_depth` hops is left. The result is the set of unique URLs reached
//! plus the URLs that failed and why.
//!
//! ```rust,ignore
//! use go_spider::{Config, ReqwestFetcher, Spider};
//!
//! let spider = Spider::new(Config::default(), ReqwestFetcher::new()?);
//! let outcome = spider.crawl(["https://example.com"]).await?;
//! println!("found {} unique urls", outcome.unique_urls.len());
//! ```

pub mod config;
pub mod crawl;
pub mod error;
pub mod page;

pub use config::Config;
pub use crawl::{CrawlFailure, CrawlOutcome, CrawlStats, Frontier, Job, Spider};
pub use error::{ConfigError, ErrorKind, FetchError};
pub use page::{extract_links, Fetcher, Links, ReqwestFetcher};
