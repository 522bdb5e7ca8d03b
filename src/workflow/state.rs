//! Workflow state and the patch type stages use to update it.

use serde::{Deserialize, Serialize};

/// A single web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page title, possibly empty.
    pub title: String,
    /// Source URL.
    pub url: String,
    /// Extracted page content.
    pub content: String,
}

/// The research plan produced by the planner stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// One-paragraph restatement of the research goal.
    pub summary: String,
    /// Ordered research tasks, each a standalone search query.
    pub tasks: Vec<String>,
}

/// Reviewer verdict on a summarized source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Whether the source is trustworthy enough to cite.
    pub is_reliable: bool,
    /// Short free-text assessment.
    pub critique: String,
}

/// A summarized and reviewed source, ready for the writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewedSummary {
    /// Source URL.
    ///
    /// Not deduplicated across tasks: the same URL surfaced by two tasks
    /// produces two entries, each with its own task context.
    pub url: String,
    /// Source page title, possibly empty.
    pub title: String,
    /// The research task this source was gathered for.
    pub task: String,
    /// LLM-produced summary of the source content.
    pub summary: String,
    /// Reviewer verdict.
    pub review: Review,
}

/// Full pipeline state threaded through the workflow engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The user's research query.
    pub query: String,
    /// Plan produced by the planner, absent until that stage runs.
    pub plan: Option<ResearchPlan>,
    /// Index of the task currently being researched.
    pub current_task_index: usize,
    /// Search results for the current task. Replaced each iteration.
    pub search_results: Vec<SearchHit>,
    /// Accumulated reviewed summaries across all tasks.
    pub research_data: Vec<ReviewedSummary>,
    /// The final report, present once the writer has run, or an
    /// `ERROR:`-prefixed message when the pipeline failed.
    pub final_report: Option<String>,
    /// Fatal error message, set by the engine when a stage fails.
    pub error: Option<String>,
}

impl WorkflowState {
    /// Creates the initial state for a query.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// The task the pipeline is currently researching, if any remain.
    #[must_use]
    pub fn current_task(&self) -> Option<&str> {
        self.plan
            .as_ref()
            .and_then(|p| p.tasks.get(self.current_task_index))
            .map(String::as_str)
    }
}

/// A partial state update returned by a stage.
///
/// Every field a stage leaves as `None` (or empty, for `research_data`)
/// is untouched by [`StatePatch::apply`]. `research_data` is the one
/// append-merged field: entries are pushed onto the existing list, never
/// replacing it. All other fields replace the current value outright.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    /// Replaces the plan.
    pub plan: Option<ResearchPlan>,
    /// Replaces the task cursor.
    pub current_task_index: Option<usize>,
    /// Replaces the current search results.
    pub search_results: Option<Vec<SearchHit>>,
    /// Appended to the accumulated research data.
    pub research_data: Vec<ReviewedSummary>,
    /// Replaces the final report.
    pub final_report: Option<String>,
    /// Replaces the error message.
    pub error: Option<String>,
}

impl StatePatch {
    /// Merges this patch into `state`.
    pub fn apply(self, state: &mut WorkflowState) {
        if let Some(plan) = self.plan {
            state.plan = Some(plan);
        }
        if let Some(index) = self.current_task_index {
            state.current_task_index = index;
        }
        if let Some(results) = self.search_results {
            state.search_results = results;
        }
        state.research_data.extend(self.research_data);
        if let Some(report) = self.final_report {
            state.final_report = Some(report);
        }
        if let Some(error) = self.error {
            state.error = Some(error);
        }
    }
}
