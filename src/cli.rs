// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every crawl setting can come from three places, later ones winning:
//   built-in defaults  <  --conf file ([spider] section)  <  flags below
// =============================================================================

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use go_spider::Config;

#[derive(Parser, Debug)]
#[command(
    name = "go-spider",
    version,
    about = "Breadth-first web crawler",
    long_about = "go-spider starts from a set of seed URLs, follows http(s) links found in \
                  <a> tags up to a maximum depth, and reports every unique URL it reached \
                  along with the URLs that could not be fetched."
)]
pub struct Cli {
    /// Seed URLs to start crawling from
    ///
    /// Added to any seeds listed in --seeds or the config file's urlListFile
    pub urls: Vec<String>,

    /// Config file with a [spider] section (.ini, .toml or .json)
    #[arg(short, long, value_name = "FILE")]
    pub conf: Option<PathBuf>,

    /// JSON file holding an array of seed URLs
    #[arg(short, long, value_name = "FILE")]
    pub seeds: Option<PathBuf>,

    /// Maximum number of link hops from a seed (0 = seeds only)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Number of concurrent workers
    #[arg(long)]
    pub threads: Option<usize>,

    /// Delay each worker waits before every request, in milliseconds
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// Timeout for a single request, in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Directory where outcome.json is written
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Print the outcome as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    // Layers the flags that were given over `base`
    pub fn apply(&self, base: Config) -> Config {
        let mut config = base;
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(threads) = self.threads {
            config.thread_count = threads;
        }
        if let Some(ms) = self.interval_ms {
            config.crawl_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.timeout_ms {
            config.crawl_timeout = Duration::from_millis(ms);
        }
        if let Some(dir) = &self.output {
            config.output_dir = dir.clone();
        }
        config
    }
}
