//! Pipeline stages.
//!
//! Each stage is a unit of work over the shared [`WorkflowState`]: it
//! reads the state, does its job, and returns a [`StatePatch`] describing
//! what changed. Stages never mutate state directly; the engine applies
//! patches and decides transitions.

pub mod planner;
pub mod searcher;
pub mod summarize_review;
pub mod writer;

pub use planner::PlannerStage;
pub use searcher::SearcherStage;
pub use summarize_review::SummarizeReviewStage;
pub use writer::WriterStage;

use async_trait::async_trait;

use crate::error::PipelineError;
use crate::workflow::state::{StatePatch, WorkflowState};

/// A single stage of the research pipeline.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Stage name, used in progress events and logs.
    fn name(&self) -> &'static str;

    /// Runs the stage against the current state.
    ///
    /// # Errors
    ///
    /// A returned error is stage-fatal: the engine short-circuits the
    /// workflow and reports the failure as the final result.
    async fn run(&self, state: &WorkflowState) -> Result<StatePatch, PipelineError>;
}

/// Truncates `text` to at most `max_chars` characters, respecting char
/// boundaries.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
