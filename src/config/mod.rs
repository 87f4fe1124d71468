//! Configuration module for Word-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use word_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Scraping {} URLs", config.batch_urls().len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, PaginatedEntry, PresenterConfig, ScraperConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{apply_overrides, load_config, parse_config};
