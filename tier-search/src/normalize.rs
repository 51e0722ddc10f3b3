//! Query tokenisation and stopword filtering.

use std::sync::Arc;

use crate::stopwords::Stopwords;

/// Minimum token length, in characters, for a token to survive filtering.
const MIN_TOKEN_CHARS: usize = 2;

/// Turns raw query text into the ordered term list used by the scoped tiers.
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    stopwords: Arc<Stopwords>,
}

impl QueryNormalizer {
    pub fn new(stopwords: Arc<Stopwords>) -> Self {
        Self { stopwords }
    }

    pub fn stopwords(&self) -> &Stopwords {
        &self.stopwords
    }

    /// Tokenise and filter `text`.
    ///
    /// Tokens are split on whitespace and stripped of ASCII punctuation
    /// other than `-` and `_`. Stopwords and tokens shorter than two
    /// characters are then removed. If that would leave nothing, the
    /// unfiltered tokens are returned instead, so non-blank input always
    /// yields at least one term.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        let filtered: Vec<String> = tokens
            .iter()
            .filter(|token| {
                token.chars().count() >= MIN_TOKEN_CHARS && !self.stopwords.contains(token)
            })
            .cloned()
            .collect();

        tracing::debug!(
            tokens = tokens.len(),
            kept = filtered.len(),
            "query normalised"
        );

        if filtered.is_empty() {
            tokens
        } else {
            filtered
        }
    }
}

/// Split on whitespace and strip punctuation, dropping tokens left empty.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| {
            raw.chars()
                .filter(|c| !c.is_ascii_punctuation() || *c == '-' || *c == '_')
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .collect()
}
