//! Per-tier score boosting.
//!
//! Each tier maps a native index score to an effective score with
//!
//! ```text
//! effective = native * multiplier + bonus
//! ```
//!
//! The bonuses are large enough that tiers never interleave as long as
//! native scores stay within [`RankingWeights::native_score_bound`]. With
//! the defaults (title `x2 +1000`, body `x1.5 +100`, any `x1 +0`) body hits
//! are bounded by 600 and any hits by 100; title hits are unbounded. A hit
//! at its bound ties the weakest hit of the tier above, and stable sorting
//! keeps the higher tier first.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::Tier;

/// A linear boost applied to native scores from one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBoost {
    pub multiplier: f64,
    pub bonus: f64,
}

impl TierBoost {
    pub const fn new(multiplier: f64, bonus: f64) -> Self {
        Self { multiplier, bonus }
    }

    pub fn apply(&self, native_score: f64) -> f64 {
        native_score * self.multiplier + self.bonus
    }
}

/// Boost functions and working-set limits for the tiered merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub title: TierBoost,
    pub body: TierBoost,
    pub any: TierBoost,
    /// Maximum hits requested from the index for a single tier.
    pub tier_cap: usize,
    /// Maximum unique documents accumulated across all tiers.
    pub working_set_cap: usize,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            title: TierBoost::new(2.0, 1000.0),
            body: TierBoost::new(1.5, 100.0),
            any: TierBoost::new(1.0, 0.0),
            tier_cap: 500,
            working_set_cap: 1000,
        }
    }
}

impl RankingWeights {
    /// Returns the boost for `tier`.
    pub fn boost(&self, tier: Tier) -> TierBoost {
        match tier {
            Tier::Title => self.title,
            Tier::Body => self.body,
            Tier::Any => self.any,
        }
    }

    /// Effective score of a hit with `native_score` produced by `tier`.
    pub fn effective_score(&self, tier: Tier, native_score: f64) -> f64 {
        self.boost(tier).apply(native_score)
    }

    /// Largest native score a `tier` hit may carry without outranking the
    /// weakest hit of the tier above it. `None` for the top tier.
    ///
    /// For adjacent tiers `hi` and `lo`, the weakest `hi` hit scores
    /// `hi.bonus`, so `lo` hits must satisfy
    /// `native * lo.multiplier + lo.bonus <= hi.bonus`.
    pub fn native_score_bound(&self, tier: Tier) -> Option<f64> {
        let bound = |hi: TierBoost, lo: TierBoost| (hi.bonus - lo.bonus) / lo.multiplier;
        match tier {
            Tier::Title => None,
            Tier::Body => Some(bound(self.title, self.body)),
            Tier::Any => Some(bound(self.body, self.any)),
        }
    }

    /// Remaining per-tier request size once `accumulated` documents are held.
    pub fn remaining_cap(&self, accumulated: usize) -> usize {
        self.tier_cap
            .min(self.working_set_cap.saturating_sub(accumulated))
    }

    /// Checks that tiers stay separated and caps are usable.
    ///
    /// Checks:
    /// - every multiplier is finite and greater than 0
    /// - bonuses are finite and strictly decreasing title > body > any
    /// - `tier_cap` and `working_set_cap` are greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        for tier in Tier::all() {
            let boost = self.boost(*tier);
            if !boost.multiplier.is_finite() || boost.multiplier <= 0.0 {
                return Err(SearchError::Config(format!(
                    "{tier} multiplier must be a positive number"
                )));
            }
            if !boost.bonus.is_finite() {
                return Err(SearchError::Config(format!(
                    "{tier} bonus must be a finite number"
                )));
            }
        }
        if self.title.bonus <= self.body.bonus || self.body.bonus <= self.any.bonus {
            return Err(SearchError::Config(
                "tier bonuses must strictly decrease from title to body to any".into(),
            ));
        }
        if self.tier_cap == 0 {
            return Err(SearchError::Config(
                "tier_cap must be greater than 0".into(),
            ));
        }
        if self.working_set_cap == 0 {
            return Err(SearchError::Config(
                "working_set_cap must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
