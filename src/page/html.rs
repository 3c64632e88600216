// src/page/html.rs
// =============================================================================
// This module extracts outbound links from a fetched page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Is built on html5ever, which recovers from broken markup instead of failing
//
// Link policy:
// - Only <a> start tags are looked at
// - The href value is emitted as written, and only if it starts with "http"
//   (this also covers "https"; relative and protocol-relative links are skipped)
// - Resolution and canonicalization happen later, in the frontier
//
// Encoding:
// - Bytes that are not valid UTF-8 (a Latin-1 page, say) are replaced with
//   U+FFFD before parsing, so an accented character never hides later links
//
// Truncated input:
// - A body that ends inside an unterminated tag is flagged truncated; html5ever
//   drops that last tag and every link before it is still returned
//
// Links is an iterator, but the links are gathered up front: scraper builds
// the whole DOM before anything can be walked, so there is nothing to gain
// from stepping through the tree on demand.
// =============================================================================

use scraper::Html;
use std::collections::VecDeque;

// The links of one page, in document order.
//
// Single pass: once consumed, call extract_links() again on the same body to
// get the same sequence a second time.
#[derive(Debug, Clone, Default)]
pub struct Links {
    pending: VecDeque<String>,
    truncated: bool,
}

impl Links {
    /// True when the body ended in the middle of a tag
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl Iterator for Links {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.pending.len(), Some(self.pending.len()))
    }
}

// Extracts http(s) links from raw page bytes
//
// Example:
//   body = <a href="http://b.test">B</a><a href="/docs">Docs</a>
//   result = ["http://b.test"]
pub fn extract_links(body: &[u8]) -> Links {
    let text = String::from_utf8_lossy(body);
    let truncated = ends_inside_tag(&text);

    let mut pending = VecDeque::new();
    if text.is_empty() {
        return Links { pending, truncated };
    }

    let document = Html::parse_document(&text);

    for node in document.root_element().descendants() {
        let Some(element) = node.value().as_element() else {
            continue;
        };
        if element.name() != "a" {
            continue;
        }
        if let Some(href) = element.attr("href") {
            if is_followable(href) {
                pending.push_back(href.to_string());
            }
        }
    }

    tracing::trace!(links = pending.len(), truncated, "extracted links");
    Links { pending, truncated }
}

// True when the last '<' is never closed, e.g. `...<a href="http://c.te`
fn ends_inside_tag(text: &str) -> bool {
    match text.rfind('<') {
        Some(open) => !text[open..].contains('>'),
        None => false,
    }
}

// Case-sensitive "http" prefix check
fn is_followable(href: &str) -> bool {
    href.starts_with("http")
}
