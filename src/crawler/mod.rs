//! Crawler module for page fetching and word counting
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching and response validation
//! - Visible-text extraction from HTML
//! - Word counting
//! - The coordinator that bounds concurrency, caches results and
//!   aggregates word counts across a batch

mod coordinator;
mod fetcher;
mod parser;
mod words;

pub use coordinator::{Coordinator, Outcome, ScrapeResults, Submitter, TotalAnnouncer};
pub use fetcher::{build_http_client, scrape_url, HttpSource, PageBody, PageResponse, PageSource};
pub use parser::{extract_from_chunks, extract_visible_text, TextExtractor};
pub use words::{count_words, WordCounts};

use crate::config::Config;

/// Starts a coordinator that fetches pages over HTTP
///
/// Builds the HTTP client from the configuration and spawns the
/// coordination loop on the current Tokio runtime.
///
/// # Example
///
/// ```no_run
/// use word_harvest::config::load_config;
/// use word_harvest::crawler::start;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let urls = config.batch_urls();
/// let (submitter, announcer, mut results) = start(&config)?;
/// for url in &urls {
///     submitter.submit(url.as_str())?;
/// }
/// announcer.announce(urls.len());
/// while let Some(outcome) = results.next().await {
///     println!("{}: {:?}", outcome.url, outcome.words().map(|w| w.len()));
/// }
/// let aggregate = results.aggregate().await?;
/// println!("{} distinct words", aggregate.len());
/// # Ok(())
/// # }
/// ```
pub fn start(
    config: &Config,
) -> Result<(Submitter, TotalAnnouncer, ScrapeResults), reqwest::Error> {
    let client = build_http_client(&config.user_agent, &config.scraper)?;
    Ok(Coordinator::spawn(
        HttpSource::new(client),
        config.scraper.effective_concurrency(),
    ))
}
