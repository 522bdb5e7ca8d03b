//! Searcher stage: gathers web results for the current research task.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::search::SearchProvider;
use crate::workflow::stages::PipelineStage;
use crate::workflow::state::{StatePatch, WorkflowState};

/// Runs the current task as a web search.
///
/// Search failures are soft: a failed request logs a warning and yields
/// an empty result set, letting the pipeline move on to the next task
/// instead of aborting the whole run over one flaky query.
pub struct SearcherStage {
    provider: Arc<dyn SearchProvider>,
    max_results: usize,
}

impl SearcherStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(provider: Arc<dyn SearchProvider>, max_results: usize) -> Self {
        Self {
            provider,
            max_results,
        }
    }
}

#[async_trait]
impl PipelineStage for SearcherStage {
    fn name(&self) -> &'static str {
        "searcher"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch, PipelineError> {
        let task = state
            .current_task()
            .ok_or_else(|| PipelineError::Orchestration {
                message: "searcher invoked without a current task".to_string(),
            })?;

        let results = match self.provider.search(task, self.max_results).await {
            Ok(hits) => hits,
            Err(PipelineError::Search { message }) => {
                warn!(task, error = %message, "search failed, continuing with no results");
                Vec::new()
            }
            Err(other) => return Err(other),
        };

        info!(task, hits = results.len(), "search complete");
        Ok(StatePatch {
            search_results: Some(results),
            ..StatePatch::default()
        })
    }
}

impl std::fmt::Debug for SearcherStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearcherStage")
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}
