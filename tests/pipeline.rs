//! End-to-end pipeline tests with scripted LLM, search, and review
//! implementations.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use orchestrate_rs::config::PipelineConfig;
use orchestrate_rs::error::PipelineError;
use orchestrate_rs::llm::provider::GenerateProvider;
use orchestrate_rs::llm::rate_limiter::{AdaptiveRateLimiter, RateLimiterParams};
use orchestrate_rs::llm::MultiProviderClient;
use orchestrate_rs::review::SourceReviewer;
use orchestrate_rs::search::SearchProvider;
use orchestrate_rs::workflow::state::{Review, SearchHit};
use orchestrate_rs::workflow::WorkflowEngine;

/// Generation provider that replays scripted responses in order.
struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerateProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| PipelineError::Orchestration {
                message: "script exhausted".to_string(),
            })
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Search provider returning the same hits for every task.
struct FixedSearch {
    hits: Vec<SearchHit>,
}

#[async_trait]
impl SearchProvider for FixedSearch {
    async fn search(
        &self,
        _query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, PipelineError> {
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }
}

/// Search provider that fails with a stage-fatal error.
struct FatalSearch;

#[async_trait]
impl SearchProvider for FatalSearch {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<SearchHit>, PipelineError> {
        Err(PipelineError::Orchestration {
            message: "boom".to_string(),
        })
    }
}

/// Reviewer that trusts every URL except those listed.
struct ListReviewer {
    unreliable: Vec<&'static str>,
}

#[async_trait]
impl SourceReviewer for ListReviewer {
    async fn review(&self, _summary: &str, url: &str) -> Result<Review, PipelineError> {
        let reliable = !self.unreliable.contains(&url);
        Ok(Review {
            is_reliable: reliable,
            critique: if reliable { "credible" } else { "unverified" }.to_string(),
        })
    }
}

fn fast_config() -> PipelineConfig {
    PipelineConfig::builder()
        .task_pacing(Duration::ZERO)
        .build()
}

fn client_for(llm: Arc<ScriptedLlm>) -> Arc<MultiProviderClient> {
    let limiter = Arc::new(AdaptiveRateLimiter::new(RateLimiterParams {
        min_delay: Duration::ZERO,
        initial_rps: 1_000_000.0,
        ..RateLimiterParams::default()
    }));
    let client = MultiProviderClient::with_providers(
        vec![llm],
        limiter,
        Duration::ZERO,
        (Duration::ZERO, Duration::ZERO),
    )
    .unwrap_or_else(|_| unreachable!());
    Arc::new(client)
}

fn hit(url: &str, content: &str) -> SearchHit {
    SearchHit {
        title: "title".to_string(),
        url: url.to_string(),
        content: content.to_string(),
    }
}

const ONE_TASK_PLAN: &str = "[SUMMARY]\nSurvey solar cell efficiency.\n[/SUMMARY]\n\
                             [TASKS]\nsolar cell efficiency records\n[/TASKS]";

#[tokio::test]
async fn full_run_produces_report_from_reliable_sources() {
    // Call order: plan, summarize hit A, summarize hit B, write.
    let llm = ScriptedLlm::new(vec![
        ONE_TASK_PLAN,
        "Summary of lab results.",
        "Summary of a forum post.",
        "# Solar Report\nEfficiency is improving.",
    ]);
    let client = client_for(llm.clone());
    let search = Arc::new(FixedSearch {
        hits: vec![
            hit("https://lab.example/results", "lab content"),
            hit("https://forum.example/post", "forum content"),
        ],
    });
    let reviewer = Arc::new(ListReviewer {
        unreliable: vec!["https://forum.example/post"],
    });

    let engine = WorkflowEngine::new(&fast_config(), client, search, reviewer);
    let state = engine.run("solar panel efficiency").await;

    assert!(state.error.is_none());
    let report = state.final_report.unwrap_or_default();
    assert!(report.contains("Solar Report"));

    // Only the reliable source made it into the research data.
    assert_eq!(state.research_data.len(), 1);
    assert_eq!(state.research_data[0].url, "https://lab.example/results");
    assert_eq!(state.research_data[0].summary, "Summary of lab results.");
    assert!(state.research_data[0].review.is_reliable);
    assert_eq!(llm.call_count(), 4);
}

#[tokio::test]
async fn stage_failure_short_circuits_to_error_report() {
    // Only the planner should run; the searcher fails fatally and the
    // writer must never be called.
    let llm = ScriptedLlm::new(vec![ONE_TASK_PLAN]);
    let client = client_for(llm.clone());
    let reviewer = Arc::new(ListReviewer { unreliable: vec![] });

    let engine = WorkflowEngine::new(&fast_config(), client, Arc::new(FatalSearch), reviewer);
    let state = engine.run("anything").await;

    assert_eq!(state.final_report.as_deref(), Some("ERROR: boom"));
    assert_eq!(state.error.as_deref(), Some("boom"));
    assert!(state.research_data.is_empty());
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn research_data_accumulates_across_tasks() {
    let plan = "[SUMMARY]\ngoal\n[/SUMMARY]\n[TASKS]\nfirst query\nsecond query\n[/TASKS]";
    // plan, task 1 summarize, task 2 summarize, write.
    let llm = ScriptedLlm::new(vec![plan, "summary one", "summary two", "final report"]);
    let client = client_for(llm);
    let search = Arc::new(FixedSearch {
        hits: vec![hit("https://example.com/a", "content")],
    });
    let reviewer = Arc::new(ListReviewer { unreliable: vec![] });

    let engine = WorkflowEngine::new(&fast_config(), client, search, reviewer);
    let state = engine.run("two part query").await;

    assert_eq!(state.research_data.len(), 2);
    assert_eq!(state.research_data[0].summary, "summary one");
    assert_eq!(state.research_data[1].summary, "summary two");
    assert_eq!(state.research_data[0].task, "first query");
    assert_eq!(state.research_data[1].task, "second query");
    assert_eq!(state.final_report.as_deref(), Some("final report"));
}

#[tokio::test]
async fn empty_search_results_still_produce_a_report() {
    // plan, write. No hits means no summarize or review calls.
    let llm = ScriptedLlm::new(vec![ONE_TASK_PLAN, "report without sources"]);
    let client = client_for(llm.clone());
    let search = Arc::new(FixedSearch { hits: vec![] });
    let reviewer = Arc::new(ListReviewer { unreliable: vec![] });

    let engine = WorkflowEngine::new(&fast_config(), client, search, reviewer);
    let state = engine.run("obscure topic").await;

    assert!(state.research_data.is_empty());
    assert_eq!(state.final_report.as_deref(), Some("report without sources"));
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn malformed_plan_degrades_to_single_task() {
    // plan (unparseable), summarize, write.
    let llm = ScriptedLlm::new(vec![
        "I could not decide on tasks, sorry.",
        "summary",
        "report",
    ]);
    let client = client_for(llm);
    let search = Arc::new(FixedSearch {
        hits: vec![hit("https://example.com/a", "content")],
    });
    let reviewer = Arc::new(ListReviewer { unreliable: vec![] });

    let engine = WorkflowEngine::new(&fast_config(), client, search, reviewer);
    let state = engine.run("fallback query").await;

    let plan = state.plan.unwrap_or_else(|| unreachable!());
    assert_eq!(plan.tasks, vec!["fallback query"]);
    assert_eq!(state.research_data.len(), 1);
    assert_eq!(state.research_data[0].task, "fallback query");
}
