// src/page/mod.rs
// =============================================================================
// Everything the crawler does with a single page.
//
// Submodules:
// - http: downloads a page within a timeout (Fetcher trait + reqwest)
// - html: pulls outbound links out of the downloaded bytes
// =============================================================================

mod html;
mod http;

pub use html::{extract_links, Links};
pub use http::{Fetcher, ReqwestFetcher, APP_USER_AGENT};
