//! Core types for queries, hits, and ranked responses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SearchError;

/// Default number of results returned when a query does not set a limit.
pub const DEFAULT_LIMIT: usize = 10;

/// The three progressively looser search strategies, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Every term appears in the title.
    Title,
    /// Every term appears in the content, or every term in the description.
    Body,
    /// Unrestricted: the raw query text, ranked by the index itself.
    Any,
}

impl Tier {
    /// Returns the lowercase name of this tier, as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "body",
            Self::Any => "any",
        }
    }

    /// Returns all tiers in priority order.
    pub fn all() -> &'static [Tier] {
        &[Self::Title, Self::Body, Self::Any]
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A search request.
///
/// Construct with [`Query::new`] and the `with_*` builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Raw free text typed by the user.
    pub text: String,
    /// Optional language tag filter (e.g. `"fa"`, `"en"`).
    pub language: Option<String>,
    /// Optional category tag filter.
    pub category: Option<String>,
    /// Maximum number of results in the response. Must be greater than 0.
    pub limit: usize,
    /// Requested offset. Not applied to the merged result set.
    pub offset: usize,
    /// Highlighting preference. Tier queries never request highlighting,
    /// so stored fields come back unmarked.
    pub highlight: bool,
}

impl Query {
    /// Creates a query for `text` with the default limit and no filters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            category: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            highlight: false,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    /// Checks the query invariants: non-blank text and a positive limit.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.limit == 0 {
            return Err(SearchError::InvalidQuery(
                "limit must be greater than 0".into(),
            ));
        }
        if self.text.trim().is_empty() {
            return Err(SearchError::InvalidQuery("query text is blank".into()));
        }
        Ok(())
    }
}

/// A single match returned by the backing index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Document key.
    pub url: String,
    pub title: String,
    /// Leading portion of the stored content field.
    pub snippet: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Relevance score as stored in the index, after bound normalisation.
    pub native_score: f64,
}

/// A hit placed in the merged ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    #[serde(flatten)]
    pub hit: Hit,
    /// Native score transformed by the boost of [`ScoredResult::tier`].
    pub effective_score: f64,
    /// The tier that first produced this document.
    pub tier: Tier,
}

/// The ranked page returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// At most `Query::limit` results, ordered by effective score.
    pub results: Vec<ScoredResult>,
    /// Number of documents matching the raw, unscoped query text.
    ///
    /// This counts the naive match set, not the deduplicated tiered set,
    /// so it may exceed the number of results that could ever be paged.
    pub total_results: u64,
    pub index_name: String,
    /// Wall time from the count probe to the final truncation.
    pub query_time_ms: u64,
}
