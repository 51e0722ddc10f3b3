//! Stopword sets used by the query normaliser.
//!
//! A [`Stopwords`] value is built once and never mutated afterwards; the
//! normaliser holds it behind an `Arc`. Built-in lists exist per
//! [`Locale`] and can be merged with each other and with word lists read
//! from plain-text files.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

const PERSIAN: &[&str] = &[
    "و", "در", "به", "از", "که", "این", "را", "با", "برای", "آن", "یک", "شود", "شده", "خود",
    "ای", "یا", "تا", "کرد", "بر", "هم", "نیز", "می", "شد", "ها", "است", "گفت", "می\u{200c}شود",
    "وی", "کرده", "دارد", "ما", "کند", "نیست", "باشد", "دیگر",
];

const ENGLISH: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "were", "be", "been",
];

/// Languages with a built-in stopword list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Persian,
    English,
}

impl Locale {
    /// Returns the built-in word list for this locale.
    pub fn words(&self) -> &'static [&'static str] {
        match self {
            Self::Persian => PERSIAN,
            Self::English => ENGLISH,
        }
    }
}

/// An immutable, case-insensitive stopword set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    /// An empty set: nothing is filtered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a set from arbitrary words. Words are lowercased; blanks are ignored.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Merges the built-in lists of every given locale into one set.
    pub fn for_locales(locales: &[Locale]) -> Self {
        Self::from_words(locales.iter().flat_map(|l| l.words().iter().copied()))
    }

    /// Persian and English combined.
    pub fn builtin() -> Self {
        Self::for_locales(&[Locale::Persian, Locale::English])
    }

    /// Reads a word list: one word per line, blank lines and `#` comments skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self, SearchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SearchError::Config(format!(
                "failed to read stopwords file {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self::from_words(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        ))
    }

    /// Returns the union of `self` and `other`.
    pub fn merge(mut self, other: Stopwords) -> Self {
        self.words.extend(other.words);
        self
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
