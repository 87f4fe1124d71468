//! Word-Harvest: a concurrent word-frequency scraper
//!
//! This crate fetches a batch of web pages with a bounded number of
//! concurrent requests, extracts the visible text of each page, and counts
//! word frequencies per page and across the whole batch.

pub mod config;
pub mod crawler;
pub mod output;

use thiserror::Error;

/// Per-URL scrape failure
///
/// Every variant is non-fatal: the coordinator wraps it into an error
/// [`crawler::Outcome`] and keeps going.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrapeError {
    #[error("Request to {url} failed: {message}")]
    Fetch { url: String, message: String },

    #[error("{url} responded with {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("{url} responded with non text-like Content-Type: {content_type}")]
    ContentType { url: String, content_type: String },

    #[error("Failed to tokenize {url}: {message}")]
    Tokenize { url: String, message: String },

    #[error("Failed to release response body of {url}: {message}")]
    BodyClose { url: String, message: String },

    #[error("Execution gate closed before {url} could be scraped")]
    Gate { url: String },

    #[error("Coordinator has already finished")]
    Closed,
}

impl ScrapeError {
    /// The URL this error belongs to, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Fetch { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::ContentType { url, .. }
            | Self::Tokenize { url, .. }
            | Self::BodyClose { url, .. }
            | Self::Gate { url } => Some(url),
            Self::Closed => None,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Outcome, WordCounts};
pub use output::ResultPresenter;
