//! Trait definition for the backing full-text index.
//!
//! The engine never builds or maintains an index; it only consumes the
//! query, suggestion, and health primitives described by [`SearchIndex`].
//! [`crate::redisearch::RediSearchIndex`] is the production implementation.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Sort order requested from the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub descending: bool,
}

impl SortBy {
    /// Native relevance score, highest first.
    pub fn native_score() -> Self {
        Self {
            field: "score".into(),
            descending: true,
        }
    }
}

/// One request against the index's query primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRequest {
    /// Expression in the index's query dialect.
    pub expression: String,
    pub offset: usize,
    /// Page size. `0` asks for the total count only.
    pub limit: usize,
    pub sort: SortBy,
}

impl IndexRequest {
    /// First page of `limit` hits for `expression`, sorted by native score.
    pub fn first_page(expression: impl Into<String>, limit: usize) -> Self {
        Self {
            expression: expression.into(),
            offset: 0,
            limit,
            sort: SortBy::native_score(),
        }
    }

    /// Count-only request: no documents are returned.
    pub fn count_only(expression: impl Into<String>) -> Self {
        Self::first_page(expression, 0)
    }
}

/// A stored document as returned by the index, before field mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    /// Index-internal key of the document.
    pub key: String,
    /// Stored field name/value pairs in reply order.
    pub fields: Vec<(String, String)>,
}

impl RawDocument {
    /// First value stored under `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// One page of documents plus the size of the whole match set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPage {
    /// Documents matching the expression, independent of the page size.
    pub total: u64,
    pub documents: Vec<RawDocument>,
}

/// A backing full-text index.
///
/// All implementations must be `Send + Sync` so a single handle can serve
/// concurrent tier queries and concurrent searches.
pub trait SearchIndex: Send + Sync {
    /// Name of the index, reported back in every response.
    fn name(&self) -> &str;

    /// Run one query and return the requested page and the total match count.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::IndexUnreachable`] when the index cannot be
    /// reached, [`SearchError::IndexQuery`] when it rejects the request, and
    /// [`SearchError::MalformedReply`] when the reply cannot be decoded.
    /// Zero matches is not an error.
    fn query(
        &self,
        request: &IndexRequest,
    ) -> impl Future<Output = Result<IndexPage, SearchError>> + Send;

    /// Up to `limit` completions for `prefix` from the index's suggestion dictionary.
    fn suggest(
        &self,
        prefix: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<String>, SearchError>> + Send;

    /// Check that the index answers at all.
    fn ping(&self) -> impl Future<Output = Result<(), SearchError>> + Send;

    /// Number of documents currently held by the index.
    fn document_count(&self) -> impl Future<Output = Result<u64, SearchError>> + Send;
}
