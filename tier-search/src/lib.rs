//! # tier-search
//!
//! Tiered relevance ranking over a RediSearch full-text index.
//!
//! A free-text query is normalised into terms and issued as three scoped
//! queries of decreasing strictness: every term in the title, every term in
//! the body (content or description), and finally the raw text across all
//! fields. Hits are deduplicated by URL, boosted per tier so tiers never
//! interleave, sorted, and truncated to one page.
//!
//! ## Design
//!
//! - The backing index is a trait ([`SearchIndex`]); [`RediSearchIndex`] is
//!   the production implementation
//! - Stopwords and ranking weights are immutable configuration injected at
//!   construction
//! - A failing tier degrades the ranking but never aborts the search, even
//!   when every tier fails
//! - `total_results` comes from an unscoped count probe, not from the merged set
//! - The whole search runs under a per-call deadline

pub mod config;
pub mod error;
pub mod index;
pub mod normalize;
pub mod orchestrator;
pub mod redisearch;
pub mod stopwords;
pub mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use config::{SearchConfig, TierExecution};
pub use error::{Result, SearchError};
pub use index::SearchIndex;
pub use normalize::QueryNormalizer;
pub use orchestrator::scoring::{RankingWeights, TierBoost};
pub use redisearch::RediSearchIndex;
pub use stopwords::{Locale, Stopwords};
pub use types::{Hit, Query, ScoredResult, SearchResponse, Tier};

/// A tiered search engine over one backing index.
///
/// Holds no mutable state; share it freely between tasks when `I` allows.
#[derive(Debug)]
pub struct TieredSearch<I> {
    index: I,
    normalizer: QueryNormalizer,
    config: SearchConfig,
}

impl TieredSearch<RediSearchIndex> {
    /// Connect to the RediSearch server named by `config.redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for invalid configuration or an
    /// unreadable stopwords file, and [`SearchError::IndexUnreachable`] if
    /// the server cannot be reached.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example() -> tier_search::Result<()> {
    /// let engine = tier_search::TieredSearch::connect(tier_search::SearchConfig::default()).await?;
    /// let response = engine.search_simple("apple pie", 10).await?;
    /// for result in &response.results {
    ///     println!("{:.1} {}", result.effective_score, result.hit.url);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let index = RediSearchIndex::connect(&config.redis_url, &config.index_name).await?;
        Self::new(index, config)
    }
}

impl<I: SearchIndex> TieredSearch<I> {
    /// Build an engine over `index`, loading stopwords as `config` describes.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid or its
    /// stopwords file cannot be read.
    pub fn new(index: I, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let stopwords = config.load_stopwords()?;
        Self::with_stopwords(index, config, Arc::new(stopwords))
    }

    /// Build an engine with an explicit stopword set, ignoring the
    /// stopword fields of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn with_stopwords(index: I, config: SearchConfig, stopwords: Arc<Stopwords>) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            index = index.name(),
            stopwords = stopwords.len(),
            execution = ?config.tier_execution,
            "tiered search ready"
        );
        Ok(Self {
            index,
            normalizer: QueryNormalizer::new(stopwords),
            config,
        })
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &QueryNormalizer {
        &self.normalizer
    }

    /// Run the full tiered ranking for `query`.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidQuery`] for blank text or a zero limit
    /// - [`SearchError::IndexUnreachable`] if the count probe fails
    /// - [`SearchError::Timeout`] if the per-call deadline elapses
    pub async fn search(&self, query: &Query) -> Result<SearchResponse> {
        query.validate()?;
        self.with_deadline(orchestrator::search::orchestrate_search(
            &self.index,
            &self.normalizer,
            &self.config,
            query,
        ))
        .await
    }

    /// Search `text` with no filters.
    ///
    /// # Errors
    ///
    /// Same as [`TieredSearch::search`].
    pub async fn search_simple(&self, text: &str, limit: usize) -> Result<SearchResponse> {
        let query = Query::new(text).with_limit(limit);
        self.search(&query).await
    }

    /// Completions for `prefix`, passed straight through to the index.
    ///
    /// A `limit` of 0 returns an empty list without contacting the index.
    ///
    /// # Errors
    ///
    /// Propagates the index error, or [`SearchError::Timeout`].
    pub async fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.with_deadline(self.index.suggest(prefix, limit)).await
    }

    /// Check that the backing index answers.
    pub async fn ping(&self) -> Result<()> {
        self.with_deadline(self.index.ping()).await
    }

    /// Number of documents in the backing index.
    pub async fn document_count(&self) -> Result<u64> {
        self.with_deadline(self.index.document_count()).await
    }

    async fn with_deadline<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        let limit = Duration::from_secs(self.config.timeout_seconds);
        tokio::time::timeout(limit, operation).await.map_err(|_| {
            SearchError::Timeout(format!("exceeded {}s limit", self.config.timeout_seconds))
        })?
    }
}
