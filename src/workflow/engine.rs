//! Workflow engine: the state machine that drives the research pipeline.
//!
//! Planner → Searcher → `SummarizeReview` (looping per task) → Writer.
//! Any stage error short-circuits to a terminal `ERROR:` report; errors
//! are carried in the returned state rather than a `Result`, so callers
//! always get the full state back for inspection.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::llm::MultiProviderClient;
use crate::review::SourceReviewer;
use crate::search::SearchProvider;
use crate::workflow::progress::{ProgressEvent, StageStatus};
use crate::workflow::stages::{
    PipelineStage, PlannerStage, SearcherStage, SummarizeReviewStage, WriterStage,
};
use crate::workflow::state::WorkflowState;

/// The node the state machine is about to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Planner,
    Searcher,
    SummarizeReview,
    Writer,
    Done,
}

/// Drives the research pipeline from query to final report.
///
/// There is no cancellation primitive: a run is abandoned by dropping
/// its future, which stops between awaits but not mid-request.
pub struct WorkflowEngine {
    planner: Arc<dyn PipelineStage>,
    searcher: Arc<dyn PipelineStage>,
    summarize_review: Arc<dyn PipelineStage>,
    writer: Arc<dyn PipelineStage>,
    task_pacing: Duration,
}

impl WorkflowEngine {
    /// Wires the standard stages from configuration and injected
    /// dependencies.
    #[must_use]
    pub fn new(
        config: &PipelineConfig,
        client: Arc<MultiProviderClient>,
        search: Arc<dyn SearchProvider>,
        reviewer: Arc<dyn SourceReviewer>,
    ) -> Self {
        Self {
            planner: Arc::new(PlannerStage::new(client.clone(), config.max_plan_tasks)),
            searcher: Arc::new(SearcherStage::new(search, config.max_search_results)),
            summarize_review: Arc::new(SummarizeReviewStage::new(
                client.clone(),
                reviewer,
                config.max_content_len,
                config.chunk_size,
            )),
            writer: Arc::new(WriterStage::new(client, config.writer_input_budget)),
            task_pacing: config.task_pacing,
        }
    }

    /// Builds an engine from explicit stage implementations. Intended
    /// for tests and embedders with custom stages.
    #[must_use]
    pub fn with_stages(
        planner: Arc<dyn PipelineStage>,
        searcher: Arc<dyn PipelineStage>,
        summarize_review: Arc<dyn PipelineStage>,
        writer: Arc<dyn PipelineStage>,
        task_pacing: Duration,
    ) -> Self {
        Self {
            planner,
            searcher,
            summarize_review,
            writer,
            task_pacing,
        }
    }

    /// Runs the pipeline to completion.
    pub async fn run(&self, query: &str) -> WorkflowState {
        self.run_with_progress(query, None).await
    }

    /// Runs the pipeline, optionally emitting [`ProgressEvent`]s.
    ///
    /// The returned state always has `final_report` set: either the
    /// written report, or `ERROR: <message>` when a stage failed.
    pub async fn run_with_progress(
        &self,
        query: &str,
        progress: Option<UnboundedSender<ProgressEvent>>,
    ) -> WorkflowState {
        let mut state = WorkflowState::new(query);
        let mut node = Node::Planner;
        info!(query, "workflow started");

        while node != Node::Done {
            let stage = self.stage_for(node);
            let percent = self.percent_for(node, &state);
            emit(
                progress.as_ref(),
                stage.name(),
                StageStatus::Running,
                format!("{} running", stage.name()),
                percent,
            );

            match stage.run(&state).await {
                Ok(patch) => {
                    patch.apply(&mut state);
                    emit(
                        progress.as_ref(),
                        stage.name(),
                        StageStatus::Completed,
                        format!("{} completed", stage.name()),
                        percent,
                    );
                }
                Err(e) => {
                    error!(stage = stage.name(), error = %e, "stage failed, ending workflow");
                    let message = e.to_string();
                    state.final_report = Some(format!("ERROR: {message}"));
                    state.error = Some(message.clone());
                    emit(
                        progress.as_ref(),
                        stage.name(),
                        StageStatus::Failed,
                        message,
                        percent,
                    );
                    return state;
                }
            }

            node = self.next_node(node, &state).await;
        }

        emit(
            progress.as_ref(),
            "done",
            StageStatus::Completed,
            "workflow complete".to_string(),
            100,
        );
        info!(sources = state.research_data.len(), "workflow finished");
        state
    }

    fn stage_for(&self, node: Node) -> &Arc<dyn PipelineStage> {
        match node {
            Node::Planner => &self.planner,
            Node::Searcher => &self.searcher,
            Node::SummarizeReview => &self.summarize_review,
            Node::Writer | Node::Done => &self.writer,
        }
    }

    /// Decides the next node after a successful stage. The research loop
    /// continues while plan tasks remain, with a pacing delay between
    /// iterations to spread load over time.
    async fn next_node(&self, node: Node, state: &WorkflowState) -> Node {
        match node {
            Node::Planner => Node::Searcher,
            Node::Searcher => Node::SummarizeReview,
            Node::SummarizeReview => {
                let remaining = state
                    .plan
                    .as_ref()
                    .is_some_and(|p| state.current_task_index < p.tasks.len());
                if remaining {
                    if !self.task_pacing.is_zero() {
                        tokio::time::sleep(self.task_pacing).await;
                    }
                    Node::Searcher
                } else {
                    Node::Writer
                }
            }
            Node::Writer | Node::Done => Node::Done,
        }
    }

    /// Rough overall completion estimate for progress consumers. The
    /// research loop spans 10-80 percent, spread over the plan's tasks.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
    fn percent_for(&self, node: Node, state: &WorkflowState) -> u8 {
        match node {
            Node::Planner => 5,
            Node::Searcher | Node::SummarizeReview => {
                let total = state
                    .plan
                    .as_ref()
                    .map_or(1, |p| p.tasks.len().max(1));
                let done = state.current_task_index.min(total);
                10 + ((done as f64 / total as f64) * 70.0) as u8
            }
            Node::Writer => 85,
            Node::Done => 100,
        }
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("task_pacing", &self.task_pacing)
            .finish_non_exhaustive()
    }
}

fn emit(
    progress: Option<&UnboundedSender<ProgressEvent>>,
    stage: &'static str,
    status: StageStatus,
    message: String,
    percent: u8,
) {
    if let Some(sender) = progress {
        // A dropped receiver is not an error; progress is best-effort.
        let _ = sender.send(ProgressEvent {
            stage,
            status,
            message,
            percent,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::workflow::state::{ResearchPlan, StatePatch};
    use async_trait::async_trait;

    /// Stage that returns a canned patch, or an error.
    struct FixedStage {
        name: &'static str,
        outcome: fn(&WorkflowState) -> Result<StatePatch, PipelineError>,
    }

    #[async_trait]
    impl PipelineStage for FixedStage {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, state: &WorkflowState) -> Result<StatePatch, PipelineError> {
            (self.outcome)(state)
        }
    }

    fn stage(
        name: &'static str,
        outcome: fn(&WorkflowState) -> Result<StatePatch, PipelineError>,
    ) -> Arc<dyn PipelineStage> {
        Arc::new(FixedStage { name, outcome })
    }

    fn two_task_planner(_: &WorkflowState) -> Result<StatePatch, PipelineError> {
        Ok(StatePatch {
            plan: Some(ResearchPlan {
                summary: "s".to_string(),
                tasks: vec!["a".to_string(), "b".to_string()],
            }),
            current_task_index: Some(0),
            ..StatePatch::default()
        })
    }

    fn advance_cursor(state: &WorkflowState) -> Result<StatePatch, PipelineError> {
        Ok(StatePatch {
            current_task_index: Some(state.current_task_index + 1),
            ..StatePatch::default()
        })
    }

    fn noop(_: &WorkflowState) -> Result<StatePatch, PipelineError> {
        Ok(StatePatch::default())
    }

    fn write_report(_: &WorkflowState) -> Result<StatePatch, PipelineError> {
        Ok(StatePatch {
            final_report: Some("the report".to_string()),
            ..StatePatch::default()
        })
    }

    fn fail(_: &WorkflowState) -> Result<StatePatch, PipelineError> {
        Err(PipelineError::Orchestration {
            message: "boom".to_string(),
        })
    }

    fn engine_with(
        searcher: fn(&WorkflowState) -> Result<StatePatch, PipelineError>,
    ) -> WorkflowEngine {
        WorkflowEngine::with_stages(
            stage("planner", two_task_planner),
            stage("searcher", searcher),
            stage("summarize_review", advance_cursor),
            stage("writer", write_report),
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn test_full_run_reaches_writer() {
        let engine = engine_with(noop);
        let state = engine.run("query").await;
        assert_eq!(state.final_report.as_deref(), Some("the report"));
        assert!(state.error.is_none());
        assert_eq!(state.current_task_index, 2);
    }

    #[tokio::test]
    async fn test_stage_error_short_circuits() {
        let engine = engine_with(fail);
        let state = engine.run("query").await;
        assert_eq!(state.final_report.as_deref(), Some("ERROR: boom"));
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_progress_events_end_at_hundred() {
        let engine = engine_with(noop);
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _ = engine.run_with_progress("query", Some(tx)).await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        let last = events.last().unwrap_or_else(|| unreachable!());
        assert_eq!(last.percent, 100);
        assert_eq!(last.status, StageStatus::Completed);
        assert!(events.iter().any(|e| e.stage == "planner"));
        assert!(events.iter().any(|e| e.stage == "writer"));
    }

    #[tokio::test]
    async fn test_loop_runs_once_per_task() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingStage {
            calls: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl PipelineStage for CountingStage {
            fn name(&self) -> &'static str {
                "searcher"
            }

            async fn run(&self, _state: &WorkflowState) -> Result<StatePatch, PipelineError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Ok(StatePatch::default())
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let engine = WorkflowEngine::with_stages(
            stage("planner", two_task_planner),
            Arc::new(CountingStage {
                calls: calls.clone(),
            }),
            stage("summarize_review", advance_cursor),
            stage("writer", write_report),
            Duration::ZERO,
        );

        let _ = engine.run("query").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
