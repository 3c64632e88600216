// src/crawl/frontier.rs
// =============================================================================
// The frontier: the shared queue of pending crawl jobs.
//
// How it works:
// 1. offer() canonicalizes a URL and checks it against the visited set
// 2. A URL seen for the first time is recorded and queued as a Job; the Job
//    keeps the URL as it was found (minus the fragment) because that is what
//    gets fetched, while the canonical form is only the dedup key
// 3. take() hands the oldest Job to a worker, waiting if the queue is empty
// 4. complete() is called when a worker is done with its Job
// 5. Once nothing is queued and nothing is in flight, the crawl is over
//    and close() wakes every waiting worker
//
// All state (queue, visited set, in-flight count, closed flag) sits behind
// one lock, so "already seen?" + "insert" + "enqueue" is one atomic step and
// the in-flight count can't race with offers.
// =============================================================================

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use url::Url;

// One unit of work: a URL at a given number of hops from the seeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    url: String,
    canonical: String,
    depth: usize,
}

impl Job {
    /// The URL to fetch, as it was discovered
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The dedup key, as reported in the crawl outcome
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<Job>,
    visited: HashSet<String>,
    in_flight: usize,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<State>,
    available: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking holder can't leave State half-updated: every critical
        // section is a handful of infallible collection operations
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Queues `url` at `depth` unless its canonical form was offered before.
    //
    // Returns false when the URL is a duplicate, can't be parsed as an
    // http(s) URL, or the frontier is closed.
    pub fn offer(&self, url: &str, depth: usize) -> bool {
        let Some(canonical) = canonicalize(url) else {
            tracing::debug!(url, "rejecting unparseable url");
            return false;
        };

        {
            let mut state = self.lock();
            if state.closed || !state.visited.insert(canonical.clone()) {
                return false;
            }
            state.queue.push_back(Job {
                url: strip_fragment(url).to_string(),
                canonical,
                depth,
            });
        }

        self.available.notify_one();
        true
    }

    // Removes the oldest Job, waiting while the queue is empty.
    //
    // Returns None once the frontier is closed, even if Jobs remain queued
    // (that only happens when a crawl is cancelled).
    pub async fn take(&self) -> Option<Job> {
        loop {
            // Register interest before looking at the queue, so an offer()
            // landing between the check and the await still wakes us
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(job) = state.queue.pop_front() {
                    state.in_flight += 1;
                    return Some(job);
                }
            }

            notified.await;
        }
    }

    // Marks one taken Job as finished.
    //
    // Returns true when this was the last outstanding piece of work: nothing
    // queued, nothing in flight. Children must be offered before calling this.
    pub fn complete(&self) -> bool {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.queue.is_empty() && state.in_flight == 0
    }

    // Queued Jobs plus Jobs taken but not yet completed
    pub fn pending(&self) -> usize {
        let state = self.lock();
        state.queue.len() + state.in_flight
    }

    pub fn is_drained(&self) -> bool {
        self.pending() == 0
    }

    // No more Jobs will be handed out or accepted; wakes all waiters
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    // Number of Jobs waiting to be taken
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn visited_len(&self) -> usize {
        self.lock().visited.len()
    }

    // Snapshot of every canonical URL ever accepted, sorted
    pub fn visited(&self) -> BTreeSet<String> {
        self.lock().visited.iter().cloned().collect()
    }
}

fn strip_fragment(url: &str) -> &str {
    let url = url.trim();
    match url.find('#') {
        Some(hash) => &url[..hash],
        None => url,
    }
}

// Canonical form used for deduplication:
// scheme://host[:port]/path?query with the fragment and userinfo dropped,
// default ports dropped and trailing slashes trimmed from the path.
//
// Examples:
//   "http://A.test/"          -> "http://a.test"
//   "http://a.test:80/x/#top" -> "http://a.test/x"
//   "https://a.test/s?q=1"    -> "https://a.test/s?q=1"
pub fn canonicalize(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?;
    let mut canonical = format!("{}://{}", url.scheme(), host);
    // port() is None when the port is the scheme's default
    if let Some(port) = url.port() {
        canonical.push(':');
        canonical.push_str(&port.to_string());
    }
    canonical.push_str(url.path().trim_end_matches('/'));
    if let Some(query) = url.query() {
        canonical.push('?');
        canonical.push_str(query);
    }
    Some(canonical)
}
