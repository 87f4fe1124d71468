//! Word-Harvest main entry point
//!
//! This is the command-line interface for the Word-Harvest scraper.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use word_harvest::config::{apply_overrides, load_config, Config};
use word_harvest::crawler;
use word_harvest::output::{format_aggregate, format_outcome, ResultPresenter};

/// Word-Harvest: a concurrent word-frequency scraper
///
/// Fetches every configured page with a bounded number of concurrent
/// requests, counts the words of their visible text, and prints per-page
/// and aggregated word frequencies.
#[derive(Parser, Debug)]
#[command(name = "word-harvest")]
#[command(version)]
#[command(about = "A concurrent word-frequency scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Additional URL to scrape (repeatable)
    #[arg(long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Override the number of concurrent fetches (0 = available parallelism)
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let config = apply_overrides(config, cli.concurrency, cli.urls)
        .context("Invalid command-line override")?;

    handle_scrape(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("word_harvest=info,warn"),
            1 => EnvFilter::new("word_harvest=debug,info"),
            2 => EnvFilter::new("word_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs one batch and prints its results
async fn handle_scrape(config: Config) -> anyhow::Result<()> {
    let presenter = ResultPresenter::new(
        Path::new(&config.presenter.stop_words_path),
        config.presenter.min_count,
    );

    let urls = config.batch_urls();
    tracing::info!(
        "Scraping {} URLs with {} concurrent fetches",
        urls.len(),
        config.scraper.effective_concurrency()
    );

    let (submitter, announcer, mut results) =
        crawler::start(&config).context("Failed to build HTTP client")?;

    // Producers run alongside the consumer; the total goes out last.
    let producer = tokio::spawn(async move {
        let total = urls.len();
        for url in urls {
            submitter.submit(url)?;
        }
        announcer.announce(total);
        Ok::<_, word_harvest::ScrapeError>(())
    });

    while let Some(outcome) = results.next().await {
        println!("{}", format_outcome(&outcome, &presenter));
    }

    let aggregate = results.aggregate().await?;
    producer.await??;

    println!("\n{}", format_aggregate(&aggregate, &presenter));

    Ok(())
}
