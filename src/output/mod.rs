//! Output module for presenting scrape results
//!
//! This module handles:
//! - Filtering stop words and rare words out of word counts
//! - Ordering words by frequency
//! - Formatting per-page and aggregated results for the console

mod presenter;
mod report;

pub use presenter::{ResultPresenter, WordCount};
pub use report::{format_aggregate, format_outcome};
