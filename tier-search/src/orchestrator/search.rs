//! Core search orchestrator: count probe, tiered fetch, merge, rank.
//!
//! Runs the raw-text count probe, queries the title, body, and any tiers
//! (sequentially or concurrently), merges their hits into one boosted,
//! deduplicated working set, sorts it, and truncates to the query limit.

use std::time::Instant;

use crate::config::{SearchConfig, TierExecution};
use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::normalize::QueryNormalizer;
use crate::types::{Query, SearchResponse, Tier};

use super::executor::{SearchExecutor, TierHits};
use super::merge::ResultMerger;
use super::query::TierQueryBuilder;

/// Orchestrate one tiered search.
///
/// # Pipeline
///
/// 1. Normalise the query text into terms
/// 2. Count probe: raw text, limit 0, for `total_results`
/// 3. Title tier: every term in `title`, boosted `x2 +1000` by default
/// 4. Body tier: every term in `content` or in `description`, `x1.5 +100`
/// 5. Any tier: raw text, no boost
/// 6. Stable sort by effective score (descending)
/// 7. Truncate to `query.limit`; `query.offset` is not applied
///
/// In [`TierExecution::Sequential`] mode later tiers are skipped once the
/// working set is full and each tier requests only the remaining room. In
/// [`TierExecution::Concurrent`] mode all tiers request the full per-tier
/// cap and the working set is capped while merging in tier order.
///
/// # Errors
///
/// Returns [`SearchError::IndexUnreachable`] if the count probe fails.
/// Once the probe has answered the search always succeeds: a failing tier
/// is logged at warn level and contributes no hits, so a search whose
/// tiers all failed returns no results with the probe's `total_results`.
pub async fn orchestrate_search<I: SearchIndex>(
    index: &I,
    normalizer: &QueryNormalizer,
    config: &SearchConfig,
    query: &Query,
) -> Result<SearchResponse, SearchError> {
    tracing::trace!(query = %query.text, "tiered search");

    let terms = normalizer.normalize(&query.text);
    if terms.is_empty() {
        return Err(SearchError::InvalidQuery(
            "query has no searchable terms".into(),
        ));
    }
    if query.offset > 0 {
        tracing::debug!(
            offset = query.offset,
            "offset is not applied to the merged ranking"
        );
    }
    if query.highlight {
        tracing::debug!("highlighting is not requested for tier queries");
    }

    let started = Instant::now();
    let weights = &config.weights;
    let builder = TierQueryBuilder::new(query, &terms);
    let executor = SearchExecutor::new(index, config.snippet_chars, weights);

    // 1. Count probe. Failure here means the index is not usable at all.
    let total_results = executor
        .count(&builder.raw())
        .await
        .map_err(|err| match err {
            SearchError::IndexUnreachable(_) => err,
            other => SearchError::IndexUnreachable(format!("count probe failed: {other}")),
        })?;
    tracing::debug!(total_results, "count probe complete");

    // 2. Tiers.
    let mut merger = ResultMerger::new(weights);
    let mut attempted = 0usize;
    let mut failed = 0usize;

    match config.tier_execution {
        TierExecution::Sequential => {
            for &tier in Tier::all() {
                if merger.is_full() {
                    tracing::debug!(%tier, "working set full, tier skipped");
                    continue;
                }
                let expression = builder.tier(tier);
                let cap = weights.remaining_cap(merger.len());
                tracing::debug!(%tier, expression = %expression, cap, "tier query");

                attempted += 1;
                let outcome = executor.execute(tier, &expression, cap).await;
                failed += usize::from(!absorb_outcome(&mut merger, tier, outcome));
            }
        }
        TierExecution::Concurrent => {
            let executor = &executor;
            let futures: Vec<_> = Tier::all()
                .iter()
                .map(|&tier| {
                    let expression = builder.tier(tier);
                    let cap = weights.tier_cap;
                    async move {
                        tracing::debug!(%tier, expression = %expression, cap, "tier query");
                        (tier, executor.execute(tier, &expression, cap).await)
                    }
                })
                .collect();

            // join_all yields outcomes in tier order regardless of completion order.
            let outcomes = futures::future::join_all(futures).await;
            attempted = outcomes.len();
            for (tier, outcome) in outcomes {
                failed += usize::from(!absorb_outcome(&mut merger, tier, outcome));
            }
        }
    }

    // 3. The probe answered, so a total tier failure still yields a response.
    if attempted > 0 && failed == attempted {
        tracing::warn!(attempted, total_results, "every tier failed, returning no results");
    }

    // 4. Sort and truncate.
    let unique = merger.len();
    let results = merger.finish(query.limit);

    let query_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(
        total_results,
        unique,
        returned = results.len(),
        query_time_ms,
        "tiered search complete"
    );

    Ok(SearchResponse {
        results,
        total_results,
        index_name: index.name().to_string(),
        query_time_ms,
    })
}

/// Fold one tier's outcome into the merge. Returns whether the tier succeeded.
fn absorb_outcome(
    merger: &mut ResultMerger<'_>,
    tier: Tier,
    outcome: Result<TierHits, SearchError>,
) -> bool {
    match outcome {
        Ok(TierHits { hits, total }) => {
            let fetched = hits.len();
            let added = merger.absorb(tier, hits);
            tracing::info!(%tier, fetched, added, total, "tier complete");
            true
        }
        Err(err) => {
            tracing::warn!(%tier, error = %err, "tier query failed");
            false
        }
    }
}
