//! Single scoped query execution and hit parsing.
//!
//! The executor sends one request per call, maps stored fields onto
//! [`Hit`]s in reply order, and bounds native scores per tier so that the
//! additive tier boosts can never interleave tiers.

use url::Url;

use crate::error::SearchError;
use crate::index::{IndexRequest, RawDocument, SearchIndex};
use crate::types::{Hit, Tier};

use super::scoring::RankingWeights;

/// Hits from one scoped query plus the size of its full match set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierHits {
    pub hits: Vec<Hit>,
    pub total: u64,
}

/// Runs scoped queries against a [`SearchIndex`].
#[derive(Debug)]
pub struct SearchExecutor<'a, I> {
    index: &'a I,
    snippet_chars: usize,
    weights: &'a RankingWeights,
}

impl<'a, I: SearchIndex> SearchExecutor<'a, I> {
    pub fn new(index: &'a I, snippet_chars: usize, weights: &'a RankingWeights) -> Self {
        Self {
            index,
            snippet_chars,
            weights,
        }
    }

    /// Fetch up to `cap` hits for `tier`'s `expression`, best native score first.
    ///
    /// # Errors
    ///
    /// Propagates the index's [`SearchError`]; zero matches is `Ok`.
    pub async fn execute(
        &self,
        tier: Tier,
        expression: &str,
        cap: usize,
    ) -> Result<TierHits, SearchError> {
        let request = IndexRequest::first_page(expression, cap);

        tracing::debug!(%tier, expression, cap, "executing scoped query");
        let page = self.index.query(&request).await?;

        let ceiling = self.weights.native_score_bound(tier);
        let hits: Vec<Hit> = page
            .documents
            .iter()
            .filter_map(|doc| self.parse_hit(doc, ceiling))
            .collect();

        Ok(TierHits {
            hits,
            total: page.total,
        })
    }

    /// Number of documents matching `expression`; no documents are fetched.
    pub async fn count(&self, expression: &str) -> Result<u64, SearchError> {
        let page = self.index.query(&IndexRequest::count_only(expression)).await?;
        Ok(page.total)
    }

    /// Map one stored document onto a [`Hit`]. Documents without a URL are skipped.
    fn parse_hit(&self, doc: &RawDocument, ceiling: Option<f64>) -> Option<Hit> {
        let url = match doc.field("url") {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => {
                tracing::trace!(key = %doc.key, "document without url skipped");
                return None;
            }
        };

        let domain = doc
            .field("domain")
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| domain_of(&url));

        let raw_score = doc
            .field("score")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0);

        Some(Hit {
            title: doc.field("title").unwrap_or_default().to_string(),
            snippet: snippet(doc.field("content").unwrap_or_default(), self.snippet_chars),
            domain,
            description: doc
                .field("description")
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            native_score: bound_score(raw_score, ceiling, &url),
            url,
        })
    }
}

/// Clamp a native score into `[0, ceiling]`; `None` leaves it unbounded above.
fn bound_score(score: f64, ceiling: Option<f64>, url: &str) -> f64 {
    if score.is_nan() || score < 0.0 {
        return 0.0;
    }
    match ceiling {
        Some(max) if score > max => {
            tracing::warn!(
                url,
                score,
                max,
                "native score above tier separation bound, clamped"
            );
            max
        }
        _ => score,
    }
}

/// First `max_chars` characters of `content`, with `...` appended when cut.
pub fn snippet(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Host of `url`, or an empty string when it has none.
fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}
