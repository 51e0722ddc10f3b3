//! Cross-tier deduplication, boosting, and final ordering.
//!
//! Documents are keyed by URL. The first tier to produce a URL owns it;
//! later sightings are dropped, not re-scored. Sorting is stable, so
//! equal effective scores keep insertion (tier) order.

use std::collections::HashSet;

use crate::types::{Hit, ScoredResult, Tier};

use super::scoring::RankingWeights;

/// Accumulates boosted hits from successive tiers up to the working-set cap.
#[derive(Debug)]
pub struct ResultMerger<'a> {
    weights: &'a RankingWeights,
    seen: HashSet<String>,
    results: Vec<ScoredResult>,
}

impl<'a> ResultMerger<'a> {
    pub fn new(weights: &'a RankingWeights) -> Self {
        Self {
            weights,
            seen: HashSet::new(),
            results: Vec::new(),
        }
    }

    /// Number of unique documents accumulated so far.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether the working set has reached its cap.
    pub fn is_full(&self) -> bool {
        self.results.len() >= self.weights.working_set_cap
    }

    /// Add `hits` from `tier`, skipping URLs already seen.
    ///
    /// Stops once the working set is full. Returns how many hits were added.
    pub fn absorb(&mut self, tier: Tier, hits: Vec<Hit>) -> usize {
        let before = self.results.len();

        for hit in hits {
            if self.is_full() {
                break;
            }
            if !self.seen.insert(hit.url.clone()) {
                continue;
            }
            let effective_score = self.weights.effective_score(tier, hit.native_score);
            self.results.push(ScoredResult {
                effective_score,
                hit,
                tier,
            });
        }

        self.results.len() - before
    }

    /// Sort by effective score, highest first, and keep the first `limit`.
    pub fn finish(mut self, limit: usize) -> Vec<ScoredResult> {
        self.results.sort_by(|a, b| {
            b.effective_score
                .partial_cmp(&a.effective_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.results.truncate(limit);
        self.results
    }
}
