//! Integration tests for the tiered search pipeline.
//!
//! These tests drive the full normalise → count → tiers → merge → sort →
//! truncate pipeline against a scripted in-memory index (no network calls).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tier_search::index::{IndexPage, IndexRequest, RawDocument};
use tier_search::{
    Query, RankingWeights, SearchConfig, SearchError, SearchIndex, Stopwords, Tier,
    TierExecution, TieredSearch,
};

const TITLE: &str = "@title:(apple pie)";
const BODY: &str = "(@content:(apple pie)|@description:(apple pie))";
const ANY: &str = "apple pie";

#[derive(Clone)]
enum Scripted {
    Page(u64, Vec<RawDocument>),
    Reject,
    Unreachable,
}

/// An index answering each expression with a scripted outcome.
///
/// Unscripted expressions match nothing. Every request is recorded.
#[derive(Default)]
struct ScriptedIndex {
    script: HashMap<String, Scripted>,
    requests: Mutex<Vec<IndexRequest>>,
    delay: Option<Duration>,
}

impl ScriptedIndex {
    fn new() -> Self {
        Self::default()
    }

    fn on(mut self, expression: &str, outcome: Scripted) -> Self {
        self.script.insert(expression.to_string(), outcome);
        self
    }

    fn page(self, expression: &str, total: u64, documents: Vec<RawDocument>) -> Self {
        self.on(expression, Scripted::Page(total, documents))
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn requests(&self) -> Vec<IndexRequest> {
        self.requests.lock().expect("lock").clone()
    }

    fn expressions(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.expression).collect()
    }
}

impl SearchIndex for ScriptedIndex {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn query(&self, request: &IndexRequest) -> Result<IndexPage, SearchError> {
        self.requests.lock().expect("lock").push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.script.get(&request.expression) {
            Some(Scripted::Page(total, documents)) => Ok(IndexPage {
                total: *total,
                documents: documents.iter().take(request.limit).cloned().collect(),
            }),
            Some(Scripted::Reject) => Err(SearchError::IndexQuery("Syntax error".into())),
            Some(Scripted::Unreachable) => {
                Err(SearchError::IndexUnreachable("connection refused".into()))
            }
            None => Ok(IndexPage::default()),
        }
    }

    async fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        Ok((1..=limit).map(|i| format!("{prefix} {i}")).collect())
    }

    async fn ping(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn document_count(&self) -> Result<u64, SearchError> {
        Ok(self.script.len() as u64)
    }
}

fn doc(url: &str, score: f64) -> RawDocument {
    RawDocument {
        key: format!("doc:{url}"),
        fields: vec![
            ("url".into(), url.into()),
            ("title".into(), format!("Title {url}")),
            ("content".into(), format!("Content of {url}")),
            ("domain".into(), "example.com".into()),
            ("score".into(), score.to_string()),
        ],
    }
}

fn docs(prefix: &str, count: usize, score: f64) -> Vec<RawDocument> {
    (0..count)
        .map(|i| doc(&format!("https://example.com/{prefix}/{i}"), score))
        .collect()
}

fn engine(index: ScriptedIndex) -> TieredSearch<ScriptedIndex> {
    TieredSearch::new(index, SearchConfig::default()).expect("engine")
}

fn engine_with(index: ScriptedIndex, config: SearchConfig) -> TieredSearch<ScriptedIndex> {
    TieredSearch::new(index, config).expect("engine")
}

#[tokio::test]
async fn apple_pie_issues_count_then_three_tiers() {
    let engine = engine(
        ScriptedIndex::new()
            .page(TITLE, 2, docs("t", 2, 1.0))
            .page(BODY, 3, docs("b", 3, 1.0)),
    );
    engine
        .search(&Query::new("apple pie"))
        .await
        .expect("search");

    let requests = engine.index().requests();
    let expressions: Vec<&str> = requests.iter().map(|r| r.expression.as_str()).collect();
    assert_eq!(expressions, vec![ANY, TITLE, BODY, ANY]);

    let limits: Vec<usize> = requests.iter().map(|r| r.limit).collect();
    assert_eq!(limits, vec![0, 500, 500, 500]);
    assert!(requests.iter().all(|r| r.offset == 0));
    assert!(requests.iter().all(|r| r.sort.field == "score" && r.sort.descending));
}

#[tokio::test]
async fn results_have_no_duplicate_urls_and_descend() {
    let shared = "https://example.com/shared";
    let engine = engine(
        ScriptedIndex::new()
            .page(ANY, 40, {
                let mut any = docs("a", 4, 9.0);
                any.push(doc(shared, 99.0));
                any
            })
            .page(TITLE, 2, vec![doc(shared, 1.0), doc("https://example.com/t", 3.0)])
            .page(BODY, 2, vec![doc(shared, 5.0), doc("https://example.com/b", 2.0)]),
    );
    let response = engine
        .search(&Query::new("apple pie").with_limit(50))
        .await
        .expect("search");

    let urls: HashSet<&str> = response.results.iter().map(|r| r.hit.url.as_str()).collect();
    assert_eq!(urls.len(), response.results.len());
    assert_eq!(response.results.len(), 7);

    for pair in response.results.windows(2) {
        assert!(
            pair[0].effective_score >= pair[1].effective_score,
            "not sorted: {} < {}",
            pair[0].effective_score,
            pair[1].effective_score
        );
    }

    let shared_result = response
        .results
        .iter()
        .find(|r| r.hit.url == shared)
        .expect("shared url present");
    assert_eq!(shared_result.tier, Tier::Title);
    assert!((shared_result.effective_score - 1002.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn title_match_outranks_body_match_with_equal_native_score() {
    let engine = engine(
        ScriptedIndex::new()
            .page(ANY, 2, vec![doc("https://d2.com", 4.0), doc("https://d1.com", 4.0)])
            .page(TITLE, 1, vec![doc("https://d1.com", 4.0)])
            .page(BODY, 1, vec![doc("https://d2.com", 4.0)]),
    );
    let response = engine.search(&Query::new("apple pie")).await.expect("search");

    assert_eq!(response.results.len(), 2);
    assert_eq!(response.results[0].hit.url, "https://d1.com");
    assert_eq!(response.results[1].hit.url, "https://d2.com");
    assert!(response.results[0].effective_score > response.results[1].effective_score);
}

#[tokio::test]
async fn title_native_zero_beats_body_native_fifty() {
    let engine = engine(
        ScriptedIndex::new()
            .page(TITLE, 1, vec![doc("https://title.com", 0.0)])
            .page(BODY, 1, vec![doc("https://body.com", 50.0)]),
    );
    let response = engine.search(&Query::new("apple pie")).await.expect("search");

    assert_eq!(response.results[0].hit.url, "https://title.com");
    assert!((response.results[0].effective_score - 1000.0).abs() < f64::EPSILON);
    assert_eq!(response.results[1].hit.url, "https://body.com");
    assert!((response.results[1].effective_score - 175.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn fewer_unique_documents_than_limit_are_not_padded() {
    let engine = engine(
        ScriptedIndex::new()
            .page(TITLE, 2, docs("x", 2, 1.0))
            .page(ANY, 3, docs("x", 3, 1.0)),
    );
    let response = engine
        .search(&Query::new("apple pie").with_limit(10))
        .await
        .expect("search");
    assert_eq!(response.results.len(), 3);
}

#[tokio::test]
async fn total_results_comes_from_count_probe() {
    // 50 documents match the raw text; the tiers surface 12 unique ones.
    let engine = engine(
        ScriptedIndex::new()
            .page("apple", 50, docs("a", 8, 2.0))
            .page("@title:(apple)", 4, docs("t", 4, 1.0))
            .page(
                "(@content:(apple)|@description:(apple))",
                6,
                [docs("t", 2, 1.0), docs("a", 4, 1.0)].concat(),
            ),
    );
    let response = engine
        .search(&Query::new("apple").with_limit(10))
        .await
        .expect("search");
    assert_eq!(response.results.len(), 10);
    assert_eq!(response.total_results, 50);
}

#[tokio::test]
async fn later_tiers_request_only_remaining_room() {
    let config = SearchConfig {
        weights: RankingWeights {
            tier_cap: 3,
            working_set_cap: 5,
            ..Default::default()
        },
        ..Default::default()
    };
    let engine = engine_with(
        ScriptedIndex::new()
            .page(TITLE, 10, docs("t", 10, 1.0))
            .page(BODY, 10, docs("b", 10, 1.0))
            .page(ANY, 10, docs("a", 10, 1.0)),
        config,
    );
    let response = engine
        .search(&Query::new("apple pie").with_limit(20))
        .await
        .expect("search");

    let requests = engine.index().requests();
    // count, title (3), body (min(3, 5 - 3) = 2); any skipped: working set full
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].limit, 3);
    assert_eq!(requests[2].limit, 2);
    assert_eq!(response.results.len(), 5);
}

#[tokio::test]
async fn failing_tier_is_skipped() {
    let engine = engine(
        ScriptedIndex::new()
            .page(ANY, 5, docs("a", 2, 1.0))
            .page(TITLE, 1, docs("t", 1, 1.0))
            .on(BODY, Scripted::Reject),
    );
    let response = engine.search(&Query::new("apple pie")).await.expect("search");

    assert_eq!(response.results.len(), 3);
    assert_eq!(response.total_results, 5);
    assert!(response.results.iter().all(|r| r.tier != Tier::Body));
    assert_eq!(engine.index().expressions(), vec![ANY, TITLE, BODY, ANY]);
}

#[tokio::test]
async fn empty_tier_is_not_a_failure() {
    let filtered_any = "apple pie @language:{en}";
    let engine = engine(
        ScriptedIndex::new()
            .page(filtered_any, 3, vec![])
            .on("@title:(apple pie) @language:{en}", Scripted::Reject)
            .on(
                "(@content:(apple pie)|@description:(apple pie)) @language:{en}",
                Scripted::Reject,
            ),
    );
    let response = engine
        .search(&Query::new("apple pie").with_language("en"))
        .await
        .expect("search");
    assert!(response.results.is_empty());
    assert_eq!(response.total_results, 3);
}

#[tokio::test]
async fn every_tier_failing_still_returns_probe_total() {
    for tier_execution in [TierExecution::Sequential, TierExecution::Concurrent] {
        let config = SearchConfig {
            tier_execution,
            ..Default::default()
        };
        let index = FlakyAnyIndex {
            inner: ScriptedIndex::new()
                .page(ANY, 3, docs("a", 3, 1.0))
                .on(TITLE, Scripted::Reject)
                .on(BODY, Scripted::Unreachable),
        };
        let engine = TieredSearch::new(index, config).expect("engine");
        let response = engine
            .search(&Query::new("apple pie"))
            .await
            .expect("probe answered, so the search succeeds");

        assert!(response.results.is_empty(), "{tier_execution:?}");
        assert_eq!(response.total_results, 3, "{tier_execution:?}");
        // The any tier is rejected before reaching the scripted index.
        assert_eq!(engine.index().inner.requests().len(), 3, "{tier_execution:?}");
    }
}

/// Answers count-only requests normally and rejects the any tier's page request.
struct FlakyAnyIndex {
    inner: ScriptedIndex,
}

impl SearchIndex for FlakyAnyIndex {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn query(&self, request: &IndexRequest) -> Result<IndexPage, SearchError> {
        if request.limit > 0 && request.expression == ANY {
            return Err(SearchError::MalformedReply("expected array reply".into()));
        }
        self.inner.query(request).await
    }

    async fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        self.inner.suggest(prefix, limit).await
    }

    async fn ping(&self) -> Result<(), SearchError> {
        self.inner.ping().await
    }

    async fn document_count(&self) -> Result<u64, SearchError> {
        self.inner.document_count().await
    }
}

#[tokio::test]
async fn count_probe_failure_aborts_search() {
    let engine = engine(
        ScriptedIndex::new()
            .on(ANY, Scripted::Unreachable)
            .page(TITLE, 1, docs("t", 1, 1.0)),
    );
    let err = engine.search(&Query::new("apple pie")).await.unwrap_err();

    assert!(matches!(err, SearchError::IndexUnreachable(_)));
    // No tier was attempted after the failed probe.
    assert_eq!(engine.index().requests().len(), 1);
}

#[tokio::test]
async fn rejected_count_probe_is_reported_unreachable() {
    let engine = engine(ScriptedIndex::new().on(ANY, Scripted::Reject));
    let err = engine.search(&Query::new("apple pie")).await.unwrap_err();
    assert!(matches!(err, SearchError::IndexUnreachable(_)));
    assert!(err.to_string().contains("count probe failed"));
}

#[tokio::test]
async fn filters_reach_every_request() {
    let engine = engine(ScriptedIndex::new());
    engine
        .search(
            &Query::new("apple pie")
                .with_language("fa")
                .with_category("food"),
        )
        .await
        .expect("search");

    let expressions = engine.index().expressions();
    assert_eq!(expressions.len(), 4);
    assert!(expressions
        .iter()
        .all(|e| e.ends_with(" @language:{fa} @category:{food}")));
    assert_eq!(expressions[1], "@title:(apple pie) @language:{fa} @category:{food}");
}

#[tokio::test]
async fn stopwords_only_affect_scoped_tiers() {
    let engine = engine(ScriptedIndex::new());
    engine
        .search(&Query::new("the history of Rome"))
        .await
        .expect("search");
    assert_eq!(
        engine.index().expressions(),
        vec![
            "the history of Rome",
            "@title:(history Rome)",
            "(@content:(history Rome)|@description:(history Rome))",
            "the history of Rome",
        ]
    );
}

#[tokio::test]
async fn all_stopword_query_still_searches_its_tokens() {
    let engine = engine(ScriptedIndex::new());
    engine.search(&Query::new("the and")).await.expect("search");
    assert_eq!(engine.index().expressions()[1], "@title:(the and)");
}

#[tokio::test]
async fn custom_stopwords_are_used() {
    let engine = TieredSearch::with_stopwords(
        ScriptedIndex::new(),
        SearchConfig::default(),
        Arc::new(Stopwords::from_words(["pie"])),
    )
    .expect("engine");
    engine.search(&Query::new("apple pie")).await.expect("search");
    assert_eq!(engine.index().expressions()[1], "@title:(apple)");
}

#[tokio::test]
async fn offset_is_not_applied() {
    let index = || {
        ScriptedIndex::new()
            .page(TITLE, 3, docs("t", 3, 1.0))
            .page(ANY, 3, docs("a", 3, 1.0))
    };
    let first = engine(index())
        .search(&Query::new("apple pie").with_limit(4))
        .await
        .expect("search");
    let offset = engine(index())
        .search(&Query::new("apple pie").with_limit(4).with_offset(4))
        .await
        .expect("search");
    assert_eq!(first.results, offset.results);
}

#[tokio::test]
async fn tier_requests_are_plain_first_pages() {
    let engine = engine(ScriptedIndex::new());
    engine
        .search(&Query::new("apple pie").with_highlight(true))
        .await
        .expect("search");
    engine.search_simple("apple pie", 5).await.expect("search");

    let expected = vec![
        IndexRequest::count_only(ANY),
        IndexRequest::first_page(TITLE, 500),
        IndexRequest::first_page(BODY, 500),
        IndexRequest::first_page(ANY, 500),
    ];
    let requests = engine.index().requests();
    assert_eq!(requests[..4], expected[..]);
    assert_eq!(requests[4..], expected[..]);
}

#[tokio::test]
async fn oversized_native_scores_cannot_cross_tiers() {
    let engine = engine(
        ScriptedIndex::new()
            .page(BODY, 1, vec![doc("https://body.com", 0.0)])
            .page(ANY, 1, vec![doc("https://any.com", 5000.0)]),
    );
    let response = engine.search(&Query::new("apple pie")).await.expect("search");

    assert_eq!(response.results[0].hit.url, "https://body.com");
    assert_eq!(response.results[1].hit.url, "https://any.com");
    assert!((response.results[1].hit.native_score - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn title_scores_keep_their_native_value() {
    let engine = engine(
        ScriptedIndex::new()
            .page(TITLE, 1, vec![doc("https://title.com", 250.0)])
            .page(BODY, 1, vec![doc("https://body.com", 900.0)]),
    );
    let response = engine.search(&Query::new("apple pie")).await.expect("search");

    let title = &response.results[0];
    assert_eq!(title.hit.url, "https://title.com");
    assert!((title.hit.native_score - 250.0).abs() < f64::EPSILON);
    assert!((title.effective_score - 1500.0).abs() < f64::EPSILON);

    // Body scores stop at 600 so they never pass the weakest title hit (1000).
    let body = &response.results[1];
    assert!((body.hit.native_score - 600.0).abs() < f64::EPSILON);
    assert!((body.effective_score - 1000.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn concurrent_mode_fetches_full_tier_caps() {
    let config = SearchConfig {
        tier_execution: TierExecution::Concurrent,
        ..Default::default()
    };
    let engine = engine_with(
        ScriptedIndex::new()
            .page(TITLE, 2, docs("t", 2, 1.0))
            .page(BODY, 2, docs("b", 2, 1.0)),
        config,
    );
    engine.search(&Query::new("apple pie")).await.expect("search");

    let requests = engine.index().requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[0].limit, 0);
    assert!(requests[1..].iter().all(|r| r.limit == 500));
}

#[tokio::test]
async fn concurrent_mode_caps_working_set_in_tier_order() {
    let config = SearchConfig {
        tier_execution: TierExecution::Concurrent,
        weights: RankingWeights {
            tier_cap: 3,
            working_set_cap: 4,
            ..Default::default()
        },
        ..Default::default()
    };
    let engine = engine_with(
        ScriptedIndex::new()
            .page(TITLE, 3, docs("t", 3, 1.0))
            .page(BODY, 3, docs("b", 3, 1.0))
            .page(ANY, 3, docs("a", 3, 99.0)),
        config,
    );
    let response = engine
        .search(&Query::new("apple pie").with_limit(10))
        .await
        .expect("search");

    assert_eq!(response.results.len(), 4);
    let title = response.results.iter().filter(|r| r.tier == Tier::Title).count();
    let body = response.results.iter().filter(|r| r.tier == Tier::Body).count();
    assert_eq!((title, body), (3, 1));
}

#[tokio::test]
async fn sequential_and_concurrent_rank_identically_below_cap() {
    let index = || {
        ScriptedIndex::new()
            .page(ANY, 9, [docs("a", 3, 7.0), docs("t", 1, 7.0)].concat())
            .page(TITLE, 2, docs("t", 2, 3.0))
            .page(BODY, 3, [docs("b", 2, 4.0), docs("t", 1, 4.0)].concat())
    };
    let sequential = engine(index())
        .search(&Query::new("apple pie").with_limit(20))
        .await
        .expect("search");
    let concurrent = engine_with(
        index(),
        SearchConfig {
            tier_execution: TierExecution::Concurrent,
            ..Default::default()
        },
    )
    .search(&Query::new("apple pie").with_limit(20))
    .await
    .expect("search");

    assert_eq!(sequential.results, concurrent.results);
    assert_eq!(sequential.total_results, concurrent.total_results);
}

#[tokio::test(start_paused = true)]
async fn slow_index_hits_the_deadline() {
    let config = SearchConfig {
        timeout_seconds: 1,
        ..Default::default()
    };
    let engine = engine_with(
        ScriptedIndex::new().with_delay(Duration::from_secs(5)),
        config,
    );
    let err = engine.search(&Query::new("apple pie")).await.unwrap_err();
    assert!(matches!(err, SearchError::Timeout(_)));
    assert!(err.to_string().contains("1s"));
}

#[tokio::test]
async fn response_metadata() {
    let engine = engine(ScriptedIndex::new().page(TITLE, 1, docs("t", 1, 2.0)));
    let response = engine.search(&Query::new("apple pie")).await.expect("search");

    assert_eq!(response.index_name, "scripted");
    let hit = &response.results[0].hit;
    assert_eq!(hit.title, "Title https://example.com/t/0");
    assert_eq!(hit.snippet, "Content of https://example.com/t/0");
    assert_eq!(hit.domain, "example.com");
}

#[tokio::test]
async fn suggest_is_a_pass_through() {
    let engine = engine(ScriptedIndex::new());
    assert_eq!(
        engine.suggest("app", 2).await.expect("suggest"),
        vec!["app 1", "app 2"]
    );
    assert!(engine.index().requests().is_empty());
}

// ── Live RediSearch tests ───────────────────────────────────────────────
// Need a RediSearch server with a populated index.
// Run with: REDIS_URL=redis://127.0.0.1:6379 cargo test -p tier-search --test orchestrator_integration live_ -- --ignored

fn live_config() -> SearchConfig {
    SearchConfig {
        redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
        index_name: std::env::var("SEARCH_INDEX").unwrap_or_else(|_| "search_index".into()),
        timeout_seconds: 15,
        ..Default::default()
    }
}

#[tokio::test]
#[ignore]
async fn live_ping_and_count() {
    let engine = TieredSearch::connect(live_config()).await.expect("connect");
    engine.ping().await.expect("ping");
    let count = engine.document_count().await.expect("count");
    println!("index holds {count} documents");
}

#[tokio::test]
#[ignore]
async fn live_search_is_ranked_and_unique() {
    let engine = TieredSearch::connect(live_config()).await.expect("connect");
    let response = engine.search_simple("search engine", 10).await.expect("search");

    assert!(response.results.len() <= 10);
    let urls: HashSet<&str> = response.results.iter().map(|r| r.hit.url.as_str()).collect();
    assert_eq!(urls.len(), response.results.len());
    for pair in response.results.windows(2) {
        assert!(pair[0].effective_score >= pair[1].effective_score);
    }
    for r in &response.results {
        assert!(!r.hit.url.is_empty());
        println!("[{}] {:.1} {}", r.tier, r.effective_score, r.hit.url);
    }
}

#[tokio::test]
#[ignore]
async fn live_suggest_respects_limit() {
    let engine = TieredSearch::connect(live_config()).await.expect("connect");
    let suggestions = engine.suggest("se", 3).await.expect("suggest");
    assert!(suggestions.len() <= 3);
}
