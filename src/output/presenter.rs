//! Stop-word filtering and ordering of word counts for display

use crate::crawler::WordCounts;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// A word and how often it occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.word, self.count)
    }
}

/// Filters and sorts word counts for display
///
/// Stop words are loaded once, when the presenter is built. Presenting is a
/// pure function of the counts passed in.
#[derive(Debug, Clone, Default)]
pub struct ResultPresenter {
    stop_words: HashSet<String>,
    min_count: usize,
}

impl ResultPresenter {
    /// Builds a presenter from a newline-delimited stop word file
    ///
    /// A missing or unreadable file is not fatal: a warning is logged and no
    /// words are treated as stop words.
    pub fn new(stop_words_path: &Path, min_count: usize) -> Self {
        let stop_words = match load_stop_words(stop_words_path) {
            Ok(words) => {
                tracing::debug!(
                    "Loaded {} stop words from {}",
                    words.len(),
                    stop_words_path.display()
                );
                words
            }
            Err(e) => {
                tracing::warn!(
                    "Could not read stop words from {}: {}",
                    stop_words_path.display(),
                    e
                );
                HashSet::new()
            }
        };

        Self {
            stop_words,
            min_count,
        }
    }

    /// Builds a presenter from an in-memory stop word list
    pub fn from_words<I, S>(stop_words: I, min_count: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stop_words: stop_words.into_iter().map(Into::into).collect(),
            min_count,
        }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Drops stop words and rare words, then sorts by count descending
    ///
    /// Equal counts are ordered by word, so output is deterministic.
    pub fn present(&self, counts: &WordCounts) -> Vec<WordCount> {
        let mut words: Vec<WordCount> = counts
            .iter()
            .filter(|(word, count)| !self.is_stop_word(word) && *count >= self.min_count)
            .map(|(word, count)| WordCount {
                word: word.to_string(),
                count,
            })
            .collect();

        words.sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
        words
    }
}

fn load_stop_words(path: &Path) -> std::io::Result<HashSet<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
