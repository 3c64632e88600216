// src/config.rs
// =============================================================================
// Crawl configuration.
//
// A Config can be built three ways, later layers winning:
// 1. Config::default()
// 2. a config file with a [spider] section (INI, TOML or JSON by extension)
//    plus SPIDER_<KEY> environment overrides
// 3. command-line flags (see cli.rs)
//
// Example spider.ini:
//
//   [spider]
//   urlListFile = ./data/url.data
//   outputDirectory = ./output
//   maxDepth = 2
//   crawlInterval = 1
//   crawlTimeout = 10
//   threadCount = 8
//
// Interval and timeout in the file are whole seconds.
// =============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

// Read-only settings for one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of link hops from a seed (0 = seeds only)
    pub max_depth: usize,
    /// Number of concurrent workers
    pub thread_count: usize,
    /// Pause each worker takes before every fetch
    pub crawl_interval: Duration,
    /// Upper bound for a single fetch, body included
    pub crawl_timeout: Duration,
    /// Where the caller writes results
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 1,
            thread_count: 8,
            crawl_interval: Duration::from_secs(1),
            crawl_timeout: Duration::from_secs(10),
            output_dir: PathBuf::from("./output"),
        }
    }
}

impl Config {
    // Rejects settings the engine cannot run with.
    // Called by Spider before any worker is spawned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_count == 0 {
            return Err(ConfigError::InvalidThreadCount(0));
        }
        if self.crawl_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

// The [spider] section of a config file.
//
// The config crate may lowercase keys, so `maxDepth` in the file can arrive
// as `maxdepth`; both spellings are accepted. Numbers are signed so a
// negative depth is reported as a ConfigError instead of a parse failure.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SpiderSection {
    #[serde(rename = "urllistfile", alias = "urlListFile")]
    pub url_list_file: Option<PathBuf>,
    #[serde(rename = "outputdirectory", alias = "outputDirectory")]
    pub output_directory: Option<PathBuf>,
    #[serde(rename = "maxdepth", alias = "maxDepth")]
    pub max_depth: Option<i64>,
    #[serde(rename = "crawlinterval", alias = "crawlInterval")]
    pub crawl_interval: Option<i64>,
    #[serde(rename = "crawltimeout", alias = "crawlTimeout")]
    pub crawl_timeout: Option<i64>,
    #[serde(rename = "threadcount", alias = "threadCount")]
    pub thread_count: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    spider: SpiderSection,
}

impl SpiderSection {
    // Loads the [spider] section from `path`, then applies SPIDER_* variables
    // from the environment (SPIDER_MAXDEPTH=3 overrides maxDepth).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix("SPIDER")
                    .keep_prefix(true)
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        let file: ConfigFile = settings.try_deserialize()?;
        tracing::debug!(path = %path.display(), section = ?file.spider, "loaded config file");
        Ok(file.spider)
    }

    // Layers the values present in this section over `base`
    pub fn apply(&self, base: Config) -> Result<Config, ConfigError> {
        let mut config = base;

        if let Some(depth) = self.max_depth {
            config.max_depth = usize::try_from(depth).map_err(|_| ConfigError::InvalidDepth(depth))?;
        }
        if let Some(threads) = self.thread_count {
            config.thread_count = match usize::try_from(threads) {
                Ok(n) if n >= 1 => n,
                _ => return Err(ConfigError::InvalidThreadCount(threads)),
            };
        }
        if let Some(secs) = self.crawl_interval {
            let secs = u64::try_from(secs).map_err(|_| ConfigError::InvalidInterval(secs))?;
            config.crawl_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.crawl_timeout {
            match u64::try_from(secs) {
                Ok(s) if s > 0 => config.crawl_timeout = Duration::from_secs(s),
                _ => return Err(ConfigError::InvalidTimeout),
            }
        }
        if let Some(dir) = &self.output_directory {
            config.output_dir = dir.clone();
        }

        Ok(config)
    }
}

// Reads a seed list: a JSON array of URL strings
pub fn read_seed_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Seeds(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Seeds(format!("{}: {}", path.display(), e)))
}
