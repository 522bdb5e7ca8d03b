//! Writer stage: composes the final report from the research data.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::llm::MultiProviderClient;
use crate::prompts::build_writer_prompt;
use crate::workflow::stages::{PipelineStage, truncate_chars};
use crate::workflow::state::{ReviewedSummary, StatePatch, WorkflowState};

/// Token budget for the final report.
const WRITER_MAX_TOKENS: u32 = 2_000;

/// Marker appended when the research material had to be cut to fit the
/// writer's input budget.
const ELISION_MARKER: &str = "\n[additional material omitted]";

/// Writes the final report from the accumulated reviewed summaries.
#[derive(Debug, Clone)]
pub struct WriterStage {
    client: Arc<MultiProviderClient>,
    input_budget: usize,
}

impl WriterStage {
    /// Creates the stage. `input_budget` bounds the research material
    /// passed to the model, in characters.
    #[must_use]
    pub fn new(client: Arc<MultiProviderClient>, input_budget: usize) -> Self {
        Self {
            client,
            input_budget,
        }
    }
}

#[async_trait]
impl PipelineStage for WriterStage {
    fn name(&self) -> &'static str {
        "writer"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch, PipelineError> {
        let material = format_material(&state.research_data, self.input_budget);
        if state.research_data.is_empty() {
            warn!("writing report with no research data");
        }

        let prompt = build_writer_prompt(&state.query, &material);
        let report = self
            .client
            .generate_with_fallback(&prompt, WRITER_MAX_TOKENS)
            .await?;

        info!(chars = report.len(), sources = state.research_data.len(), "report written");
        Ok(StatePatch {
            final_report: Some(report),
            ..StatePatch::default()
        })
    }
}

/// Renders the research data as labeled blocks, bounded to `budget`
/// characters with an elision marker when material is dropped.
fn format_material(data: &[ReviewedSummary], budget: usize) -> String {
    if data.is_empty() {
        return "No research data available.".to_string();
    }

    let full: String = data
        .iter()
        .map(|entry| {
            format!(
                "Source: {}\nTask: {}\nSummary: {}\nReview: {}\n\n",
                entry.url, entry.task, entry.summary, entry.review.critique
            )
        })
        .collect();

    if full.chars().count() <= budget {
        return full;
    }
    let kept = budget.saturating_sub(ELISION_MARKER.chars().count());
    let mut bounded = truncate_chars(&full, kept).to_string();
    bounded.push_str(ELISION_MARKER);
    bounded
}
