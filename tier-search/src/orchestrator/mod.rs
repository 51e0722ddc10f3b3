//! Search orchestrator: scoped tiers, execution, merge, ranking.
//!
//! This module builds the title, body, and any tier expressions, runs them
//! against the backing index, deduplicates hits by URL across tiers,
//! applies per-tier boosts, and returns a sorted, truncated result set.

pub mod executor;
pub mod merge;
pub mod query;
pub mod scoring;
pub mod search;
