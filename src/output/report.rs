//! Console formatting of scrape results

use crate::crawler::{Outcome, WordCounts};
use crate::output::presenter::{ResultPresenter, WordCount};

/// Formats one per-URL outcome
///
/// Successful pages print their presented word list, failures print the
/// error.
pub fn format_outcome(outcome: &Outcome, presenter: &ResultPresenter) -> String {
    match &outcome.result {
        Ok(words) => format!(
            "words for {} {}",
            outcome.url,
            format_word_list(&presenter.present(words))
        ),
        Err(e) => format!("Scraping {} resulted in an error: {}", outcome.url, e),
    }
}

/// Formats the aggregate of a whole batch
pub fn format_aggregate(aggregate: &WordCounts, presenter: &ResultPresenter) -> String {
    format!(
        "Aggregated results:\n{}",
        format_word_list(&presenter.present(aggregate))
    )
}

fn format_word_list(words: &[WordCount]) -> String {
    let items: Vec<String> = words.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(" "))
}
