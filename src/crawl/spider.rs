// src/crawl/spider.rs
// =============================================================================
// The crawl engine.
//
// How a crawl runs:
// 1. Validate the config (nothing starts on a bad config)
// 2. Offer every seed to a fresh Frontier at depth 0
// 3. Spawn `thread_count` workers; each one loops:
//      take job -> sleep crawl_interval -> fetch (bounded by crawl_timeout)
//      -> extract links -> offer children at depth+1 (if within max_depth)
//      -> mark the job complete
// 4. The worker completing the last outstanding job closes the Frontier,
//    which wakes every idle worker and lets it exit
// 5. Collect the visited set, failures and counters into a CrawlOutcome
//
// Termination counts outstanding work (queued + in flight) instead of the
// number of seeds, so pages found three hops out are waited for too.
//
// Cancellation: the CancellationToken given to crawl_until_cancelled() stops
// workers at their next wait point (take, rate-limit sleep, or mid-fetch).
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument};

use crate::config::Config;
use crate::crawl::frontier::{canonicalize, Frontier, Job};
use crate::crawl::outcome::{CrawlFailure, CrawlOutcome, CrawlStats};
use crate::error::{ConfigError, ErrorKind, FetchError};
use crate::page::{extract_links, Fetcher};

// Where a worker is in its loop; only used for trace logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Idle,
    Fetching,
    Extracting,
    Scheduling,
    Stopped,
}

#[derive(Debug, Default)]
struct Counters {
    dispatched: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    links: AtomicUsize,
}

// State shared by all workers of one crawl run
struct Run<F> {
    config: Config,
    fetcher: Arc<F>,
    frontier: Frontier,
    counters: Counters,
    errors: Mutex<Vec<CrawlFailure>>,
    cancel: CancellationToken,
}

impl<F> Run<F> {
    fn record(&self, url: &str, kind: ErrorKind, message: Option<String>) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CrawlFailure {
                url: url.to_string(),
                kind,
                message,
            });
    }
}

pub struct Spider<F> {
    config: Config,
    fetcher: Arc<F>,
    dispatch: Dispatch,
}

impl<F: Fetcher> Spider<F> {
    // Logs go to whichever subscriber is the default when the Spider is built;
    // use with_dispatch() to send them somewhere else
    pub fn new(config: Config, fetcher: F) -> Self {
        Self {
            config,
            fetcher: Arc::new(fetcher),
            dispatch: tracing::dispatcher::get_default(|current| current.clone()),
        }
    }

    pub fn with_dispatch(mut self, dispatch: impl Into<Dispatch>) -> Self {
        self.dispatch = dispatch.into();
        self
    }

    // Crawls from `seeds` until no work is left
    pub async fn crawl<I, S>(&self, seeds: I) -> Result<CrawlOutcome, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.crawl_until_cancelled(seeds, CancellationToken::new())
            .await
    }

    // Crawls from `seeds` until no work is left or `cancel` fires.
    //
    // A cancelled crawl still returns Ok with whatever was found so far and
    // `cancelled` set on the outcome.
    pub async fn crawl_until_cancelled<I, S>(
        &self,
        seeds: I,
        cancel: CancellationToken,
    ) -> Result<CrawlOutcome, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seeds: Vec<String> = seeds.into_iter().map(|s| s.as_ref().to_string()).collect();
        self.run(seeds, cancel)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn run(
        &self,
        seeds: Vec<String>,
        cancel: CancellationToken,
    ) -> Result<CrawlOutcome, ConfigError> {
        self.config.validate()?;

        let started = Instant::now();
        let run = Arc::new(Run {
            config: self.config.clone(),
            fetcher: Arc::clone(&self.fetcher),
            frontier: Frontier::new(),
            counters: Counters::default(),
            errors: Mutex::new(Vec::new()),
            cancel,
        });

        tracing::info!(
            seeds = seeds.len(),
            max_depth = run.config.max_depth,
            threads = run.config.thread_count,
            interval = ?run.config.crawl_interval,
            timeout = ?run.config.crawl_timeout,
            "starting crawl"
        );

        for seed in &seeds {
            if run.frontier.offer(seed, 0) {
                continue;
            }
            if canonicalize(seed).is_none() {
                tracing::warn!(seed = %seed, "skipping seed that is not an absolute http(s) url");
                run.record(seed, ErrorKind::InvalidUrl, Some("not an absolute http(s) url".into()));
            } else {
                tracing::debug!(seed = %seed, "duplicate seed");
            }
        }

        if run.frontier.is_drained() {
            run.frontier.close();
        }

        let mut workers = JoinSet::new();
        for id in 0..run.config.thread_count {
            let span = tracing::debug_span!("worker", id);
            workers.spawn(
                worker(Arc::clone(&run))
                    .instrument(span)
                    .with_subscriber(self.dispatch.clone()),
            );
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                // Its job will never complete, so the others would wait forever
                tracing::error!("worker task failed, stopping crawl: {}", e);
                run.frontier.close();
            }
        }

        let cancelled = !run.frontier.is_drained();
        let errors = std::mem::take(&mut *run.errors.lock().unwrap_or_else(PoisonError::into_inner));
        let stats = CrawlStats {
            jobs_dispatched: run.counters.dispatched.load(Ordering::Relaxed),
            jobs_completed: run.counters.completed.load(Ordering::Relaxed),
            pages_failed: run.counters.failed.load(Ordering::Relaxed),
            links_discovered: run.counters.links.load(Ordering::Relaxed),
            duration: started.elapsed(),
        };
        let unique_urls = run.frontier.visited();

        tracing::info!(
            unique = unique_urls.len(),
            failed = errors.len(),
            cancelled,
            elapsed = ?stats.duration,
            "found {} unique urls",
            unique_urls.len()
        );

        Ok(CrawlOutcome {
            unique_urls,
            errors,
            stats,
            cancelled,
        })
    }
}

// What ended a wait inside the worker loop
enum Wake<T> {
    Ready(T),
    Cancelled,
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl std::future::Future<Output = T>,
) -> Wake<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Wake::Cancelled,
        value = fut => Wake::Ready(value),
    }
}

async fn worker<F: Fetcher>(run: Arc<Run<F>>) {
    let mut state = WorkerState::Idle;
    let cfg = &run.config;

    loop {
        let job = match until_cancelled(&run.cancel, run.frontier.take()).await {
            Wake::Ready(Some(job)) => job,
            Wake::Ready(None) => break,
            Wake::Cancelled => {
                run.frontier.close();
                break;
            }
        };
        run.counters.dispatched.fetch_add(1, Ordering::Relaxed);

        // Rate limit, per worker
        if let Wake::Cancelled =
            until_cancelled(&run.cancel, tokio::time::sleep(cfg.crawl_interval)).await
        {
            run.frontier.close();
            break;
        }

        state = transition(state, WorkerState::Fetching, &job);
        let fetched = match until_cancelled(&run.cancel, fetch(&run, &job)).await {
            Wake::Ready(fetched) => fetched,
            Wake::Cancelled => {
                run.frontier.close();
                break;
            }
        };

        let links = match fetched {
            Ok(body) => {
                state = transition(state, WorkerState::Extracting, &job);
                let links = extract_links(&body);
                if links.is_truncated() {
                    tracing::warn!(url = job.url(), "page ends inside a tag, keeping links found before it");
                    run.record(job.canonical(), ErrorKind::ExtractionTruncated, None);
                }
                links.collect::<Vec<_>>()
            }
            Err(e) => {
                tracing::warn!(url = job.url(), "failed to crawl: {}", e);
                run.counters.failed.fetch_add(1, Ordering::Relaxed);
                run.record(job.canonical(), e.kind(), Some(e.to_string()));
                Vec::new()
            }
        };
        run.counters.links.fetch_add(links.len(), Ordering::Relaxed);

        state = transition(state, WorkerState::Scheduling, &job);
        let child_depth = job.depth() + 1;
        if child_depth <= cfg.max_depth {
            let mut queued = 0;
            for link in &links {
                if run.frontier.offer(link, child_depth) {
                    queued += 1;
                }
            }
            tracing::debug!(
                url = job.url(),
                depth = job.depth(),
                found = links.len(),
                queued,
                "crawled"
            );
        } else {
            tracing::debug!(url = job.url(), depth = job.depth(), "crawled (depth limit reached)");
        }

        run.counters.completed.fetch_add(1, Ordering::Relaxed);
        if run.frontier.complete() {
            tracing::debug!("no outstanding work, closing frontier");
            run.frontier.close();
        }
        state = transition(state, WorkerState::Idle, &job);
    }

    tracing::trace!(from = ?state, to = ?WorkerState::Stopped, "worker exiting");
}

// Fetch bounded by crawl_timeout even if the Fetcher ignores its timeout argument
async fn fetch<F: Fetcher>(run: &Run<F>, job: &Job) -> Result<Vec<u8>, FetchError> {
    let timeout = run.config.crawl_timeout;
    match tokio::time::timeout(timeout, run.fetcher.fetch(job.url(), timeout)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout),
    }
}

fn transition(from: WorkerState, to: WorkerState, job: &Job) -> WorkerState {
    tracing::trace!(url = job.url(), ?from, ?to, "worker state");
    to
}
