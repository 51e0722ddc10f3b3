//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls where the backing index lives, how the tiers
//! are executed and weighted, and which stopwords the normaliser drops.
//! It can be built in code or loaded from a TOML file; missing fields fall
//! back to their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::orchestrator::scoring::RankingWeights;
use crate::stopwords::{Locale, Stopwords};

/// How the three tier queries are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierExecution {
    /// One tier after another; later tiers are skipped once the working set is full.
    #[default]
    Sequential,
    /// All tiers at once, each fetching up to the per-tier cap; the working
    /// set is capped during the merge instead.
    Concurrent,
}

/// Configuration for a tiered search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Connection URL of the RediSearch server.
    pub redis_url: String,
    /// Name of the full-text index to query.
    pub index_name: String,
    /// Deadline in seconds for one whole search (count probe plus all tiers).
    pub timeout_seconds: u64,
    pub tier_execution: TierExecution,
    /// Number of content characters kept in a result snippet.
    pub snippet_chars: usize,
    /// Built-in stopword lists to merge.
    pub stopword_locales: Vec<Locale>,
    /// Optional extra word list, one word per line.
    pub stopwords_file: Option<PathBuf>,
    pub weights: RankingWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".into(),
            index_name: "search_index".into(),
            timeout_seconds: 10,
            tier_execution: TierExecution::Sequential,
            snippet_chars: 200,
            stopword_locales: vec![Locale::Persian, Locale::English],
            stopwords_file: None,
            weights: RankingWeights::default(),
        }
    }
}

impl SearchConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SearchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SearchError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| SearchError::Config(e.to_string()))
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `redis_url` and `index_name` must not be empty
    /// - `timeout_seconds` must be greater than 0
    /// - `snippet_chars` must be greater than 0
    /// - `weights` must keep tiers separated (see [`RankingWeights::validate`])
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.redis_url.trim().is_empty() {
            return Err(SearchError::Config("redis_url must not be empty".into()));
        }
        if self.index_name.trim().is_empty() {
            return Err(SearchError::Config("index_name must not be empty".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.snippet_chars == 0 {
            return Err(SearchError::Config(
                "snippet_chars must be greater than 0".into(),
            ));
        }
        self.weights.validate()
    }

    /// Builds the stopword set described by `stopword_locales` and `stopwords_file`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the stopwords file cannot be read.
    pub fn load_stopwords(&self) -> Result<Stopwords, SearchError> {
        let builtin = Stopwords::for_locales(&self.stopword_locales);
        match self.stopwords_file {
            Some(ref path) => Ok(builtin.merge(Stopwords::from_file(path)?)),
            None => Ok(builtin),
        }
    }
}
