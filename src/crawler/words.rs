//! Word counting over visible-text fragments

use std::collections::hash_map::{self, HashMap};

/// Word → occurrence count mapping
///
/// Words are kept exactly as written; `Word` and `word` are different keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordCounts(HashMap<String, usize>);

impl WordCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` occurrences of `word`
    pub fn add(&mut self, word: &str, count: usize) {
        if let Some(existing) = self.0.get_mut(word) {
            *existing += count;
        } else {
            self.0.insert(word.to_string(), count);
        }
    }

    /// Adds every count of `other` into `self`
    pub fn merge(&mut self, other: &WordCounts) {
        for (word, count) in other.iter() {
            self.add(word, count);
        }
    }

    /// Occurrences of `word`, 0 when absent
    pub fn get(&self, word: &str) -> usize {
        self.0.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(word, count)| (word.as_str(), *count))
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for WordCounts {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut counts = WordCounts::new();
        for (word, count) in iter {
            let word = word.into();
            counts.add(&word, count);
        }
        counts
    }
}

impl IntoIterator for WordCounts {
    type Item = (String, usize);
    type IntoIter = hash_map::IntoIter<String, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Counts the words of one document
///
/// A word is a maximal run of alphabetic characters. Digits, punctuation and
/// whitespace are separators and never end up inside a word.
///
/// # Example
///
/// ```
/// use word_harvest::crawler::count_words;
///
/// let counts = count_words(["Hello, world!", "hello 42 world"]);
/// assert_eq!(counts.get("world"), 2);
/// assert_eq!(counts.get("Hello"), 1);
/// assert_eq!(counts.get("hello"), 1);
/// ```
pub fn count_words<I, S>(fragments: I) -> WordCounts
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts = WordCounts::new();
    for fragment in fragments {
        for word in fragment
            .as_ref()
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
        {
            counts.add(word, 1);
        }
    }
    counts
}
