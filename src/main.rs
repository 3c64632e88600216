// src/main.rs
// =============================================================================
// This is the entry point of the CLI.
//
// What happens here:
// 1. Parse command-line arguments and the optional config file
// 2. Set up logging (RUST_LOG, default go_spider=info)
// 3. Run the crawl, stopping early on Ctrl-C
// 4. Write outcome.json to the output directory and print a summary
// 5. Exit with proper code (0 = all fetched, 1 = some URLs failed, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use go_spider::config::{read_seed_file, SpiderSection};
use go_spider::{Config, ConfigError, CrawlOutcome, ReqwestFetcher, Spider};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing()?;

    let (config, seeds) = resolve(&cli)?;

    let fetcher = ReqwestFetcher::new()?;
    let spider = Spider::new(config.clone(), fetcher);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, stopping crawl");
                cancel.cancel();
            }
        });
    }

    let outcome = spider.crawl_until_cancelled(&seeds, cancel).await?;

    write_outcome(&config.output_dir, &outcome)?;
    print_results(&outcome, cli.json)?;

    Ok(if outcome.is_clean() { 0 } else { 1 })
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("go_spider=info,warn"))
        .context("creating log filter")?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

// Builds the final Config and seed list from defaults, the config file and flags
fn resolve(cli: &Cli) -> Result<(Config, Vec<String>)> {
    let section = match &cli.conf {
        Some(path) => SpiderSection::load(path)
            .with_context(|| format!("loading config file {}", path.display()))?,
        None => SpiderSection::default(),
    };

    let config = cli.apply(section.apply(Config::default())?);

    let mut seeds = Vec::new();
    if let Some(path) = cli.seeds.as_ref().or(section.url_list_file.as_ref()) {
        seeds.extend(read_seed_file(path)?);
    }
    seeds.extend(cli.urls.iter().cloned());

    if seeds.is_empty() {
        return Err(ConfigError::NoSeeds.into());
    }

    Ok((config, seeds))
}

fn write_outcome(dir: &Path, outcome: &CrawlOutcome) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let path = dir.join("outcome.json");
    let json = serde_json::to_string_pretty(outcome)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;

    tracing::info!(path = %path.display(), "wrote crawl outcome");
    Ok(())
}

fn print_results(outcome: &CrawlOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        print_table(outcome);
    }
    Ok(())
}

fn print_table(outcome: &CrawlOutcome) {
    println!("Found {} unique urls", outcome.unique_urls.len());
    for url in &outcome.unique_urls {
        println!(" - {}", url);
    }

    if !outcome.errors.is_empty() {
        println!();
        println!("{:<60} {:<22} {:<30}", "URL", "ERROR", "MESSAGE");
        println!("{}", "=".repeat(112));
        for failure in &outcome.errors {
            // Truncate URL if too long for display
            let url_display = if failure.url.chars().count() > 57 {
                format!("{}...", failure.url.chars().take(57).collect::<String>())
            } else {
                failure.url.clone()
            };
            let kind = format!("{:?}", failure.kind);
            let message = failure.message.as_deref().unwrap_or("");
            println!("{:<60} {:<22} {:<30}", url_display, kind, message);
        }
    }

    let stats = &outcome.stats;
    println!();
    println!("Summary:");
    println!("   Pages fetched: {}", stats.jobs_completed.saturating_sub(stats.pages_failed));
    println!("   Pages failed: {}", stats.pages_failed);
    println!("   Links discovered: {}", stats.links_discovered);
    println!("   Duration: {:.2}s", stats.duration.as_secs_f64());
    if outcome.cancelled {
        println!("   Crawl was cancelled before finishing");
    }
}
