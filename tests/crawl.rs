// Engine behaviour against an in-memory link graph.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use go_spider::{Config, ErrorKind, FetchError, Fetcher, Spider};
use tokio_util::sync::CancellationToken;

// Serves pages from a map keyed by the exact URL requested.
// URLs in `slow` never answer; anything unknown is a 404.
#[derive(Default)]
struct Graph {
    pages: HashMap<String, String>,
    slow: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

impl Graph {
    fn page(mut self, url: &str, links: &[&str]) -> Self {
        let body = links
            .iter()
            .map(|href| format!(r#"<a href="{}">link</a>"#, href))
            .collect::<Vec<_>>()
            .join("\n");
        self.pages
            .insert(url.to_string(), format!("<html><body>{}</body></html>", body));
        self
    }

    fn slow(mut self, url: &str) -> Self {
        self.slow.insert(url.to_string());
        self
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for Graph {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.slow.contains(url) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.pages
            .get(url)
            .map(|body| body.clone().into_bytes())
            .ok_or(FetchError::HttpStatus(404))
    }
}

// Lets a test keep a handle on the Graph to inspect it after the crawl
struct Shared(Arc<Graph>);

#[async_trait]
impl Fetcher for Shared {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        self.0.fetch(url, timeout).await
    }
}

fn config(max_depth: usize, threads: usize) -> Config {
    Config {
        max_depth,
        thread_count: threads,
        crawl_interval: Duration::ZERO,
        crawl_timeout: Duration::from_millis(200),
        ..Config::default()
    }
}

fn set(urls: &[&str]) -> BTreeSet<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

#[tokio::test]
async fn test_relative_link_excluded_and_self_link_deduped() {
    let graph = Graph::default().page(
        "http://a.test",
        &["http://b.test", "/relative", "http://a.test"],
    );
    let spider = Spider::new(config(1, 2), graph);

    let outcome = spider.crawl(["http://a.test"]).await.unwrap();

    assert_eq!(outcome.unique_urls, set(&["http://a.test", "http://b.test"]));
}

#[tokio::test]
async fn test_depth_zero_fetches_seeds_only() {
    let graph = Arc::new(
        Graph::default()
            .page("http://x.test", &["http://z.test"])
            .page("http://y.test", &["http://z.test"]),
    );

    let spider = Spider::new(config(0, 4), Shared(Arc::clone(&graph)));
    let outcome = spider.crawl(["http://x.test", "http://y.test"]).await.unwrap();

    assert_eq!(outcome.unique_urls, set(&["http://x.test", "http://y.test"]));
    let mut fetched = graph.fetched();
    fetched.sort();
    assert_eq!(fetched, vec!["http://x.test", "http://y.test"]);
}

#[tokio::test]
async fn test_single_worker_interval_is_serial() {
    let mut graph = Graph::default();
    let seeds: Vec<String> = (0..5).map(|i| format!("http://s{}.test", i)).collect();
    for seed in &seeds {
        graph = graph.page(seed, &[]);
    }
    let spider = Spider::new(
        Config {
            crawl_interval: Duration::from_millis(100),
            ..config(0, 1)
        },
        graph,
    );

    let started = Instant::now();
    let outcome = spider.crawl(&seeds).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(400));
    assert_eq!(outcome.unique_urls.len(), 5);
}

#[tokio::test]
async fn test_timed_out_seed_does_not_block_others() {
    let graph = Graph::default()
        .slow("http://slow.test")
        .page("http://fast.test", &["http://child.test"])
        .page("http://child.test", &[]);
    let spider = Spider::new(config(1, 2), graph);

    let outcome = spider
        .crawl(["http://slow.test", "http://fast.test"])
        .await
        .unwrap();

    assert_eq!(
        outcome.unique_urls,
        set(&["http://child.test", "http://fast.test", "http://slow.test"])
    );
    let timeouts: Vec<_> = outcome.failures_of(ErrorKind::Timeout).collect();
    assert_eq!(timeouts.len(), 1);
    assert_eq!(timeouts[0].url, "http://slow.test");
}

#[tokio::test]
async fn test_unreachable_seed_isolated() {
    let graph = Graph::default()
        .page("http://ok.test", &["http://ok.test/a"])
        .page("http://ok.test/a", &["http://ok.test/b"])
        .page("http://ok.test/b", &[]);
    let spider = Spider::new(config(3, 3), graph);

    let outcome = spider
        .crawl(["http://missing.test", "http://ok.test"])
        .await
        .unwrap();

    assert!(outcome.unique_urls.contains("http://ok.test/b"));
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].url, "http://missing.test");
    assert_eq!(outcome.errors[0].kind, ErrorKind::HttpStatus);
}

#[tokio::test]
async fn test_depth_bound_on_chain() {
    let graph = Graph::default()
        .page("http://a.test", &["http://b.test"])
        .page("http://b.test", &["http://c.test"])
        .page("http://c.test", &["http://d.test"])
        .page("http://d.test", &[]);
    let spider = Spider::new(config(2, 2), graph);

    let outcome = spider.crawl(["http://a.test"]).await.unwrap();

    assert_eq!(
        outcome.unique_urls,
        set(&["http://a.test", "http://b.test", "http://c.test"])
    );
}

#[tokio::test]
async fn test_depth_counts_from_nearest_seed() {
    // d.test is 3 hops from a.test but a seed itself
    let graph = Graph::default()
        .page("http://a.test", &["http://b.test"])
        .page("http://b.test", &["http://c.test"])
        .page("http://c.test", &["http://d.test"])
        .page("http://d.test", &["http://e.test"])
        .page("http://e.test", &[]);
    let spider = Spider::new(config(1, 1), graph);

    let outcome = spider.crawl(["http://a.test", "http://d.test"]).await.unwrap();

    assert_eq!(
        outcome.unique_urls,
        set(&["http://a.test", "http://b.test", "http://d.test", "http://e.test"])
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_page_fetched_once_in_dense_graph() {
    // Every page links to every other page, in several spellings
    let urls: Vec<String> = (0..10).map(|i| format!("http://n{}.test", i)).collect();
    let mut links: Vec<String> = Vec::new();
    for url in &urls {
        links.push(url.clone());
        links.push(format!("{}/", url));
        links.push(format!("{}/#frag", url));
    }
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    let mut graph = Graph::default();
    for url in &urls {
        graph = graph.page(url, &link_refs);
    }
    let graph = Arc::new(graph);

    let spider = Spider::new(config(5, 8), Shared(Arc::clone(&graph)));
    let outcome = spider.crawl([urls[0].as_str()]).await.unwrap();

    assert_eq!(outcome.unique_urls.len(), 10);
    let fetched = graph.fetched();
    let distinct: HashSet<_> = fetched.iter().collect();
    assert_eq!(fetched.len(), distinct.len());
    assert_eq!(outcome.stats.jobs_completed, 10);
}

#[tokio::test]
async fn test_cycle_terminates() {
    let graph = Graph::default()
        .page("http://a.test", &["http://b.test"])
        .page("http://b.test", &["http://a.test"]);
    let spider = Spider::new(config(100, 4), graph);

    let outcome = tokio::time::timeout(Duration::from_secs(5), spider.crawl(["http://a.test"]))
        .await
        .expect("crawl did not terminate")
        .unwrap();

    assert_eq!(outcome.unique_urls.len(), 2);
    assert!(outcome.is_clean());
}

#[tokio::test]
async fn test_cancellation_stops_blocked_workers() {
    let graph = Graph::default()
        .slow("http://slow1.test")
        .slow("http://slow2.test");
    let spider = Spider::new(
        Config {
            crawl_timeout: Duration::from_secs(60),
            ..config(1, 4)
        },
        graph,
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });
    }

    let started = Instant::now();
    let outcome = spider
        .crawl_until_cancelled(["http://slow1.test", "http://slow2.test"], cancel)
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(outcome.cancelled);
    assert_eq!(outcome.stats.jobs_completed, 0);
    assert_eq!(outcome.unique_urls.len(), 2);
}

#[tokio::test]
async fn test_rejects_zero_threads() {
    let spider = Spider::new(config(1, 0), Graph::default());
    assert!(spider.crawl(["http://a.test"]).await.is_err());
}
