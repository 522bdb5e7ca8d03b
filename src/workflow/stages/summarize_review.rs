//! Summarize-review stage: condenses each search result and filters out
//! unreliable sources.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::llm::MultiProviderClient;
use crate::prompts::build_summarize_prompt;
use crate::review::SourceReviewer;
use crate::workflow::stages::{PipelineStage, truncate_chars};
use crate::workflow::state::{StatePatch, WorkflowState};

/// Token budget for a per-chunk summary.
const SUMMARIZE_MAX_TOKENS: u32 = 500;

/// Summarizes and reviews the current task's search results.
///
/// Per-hit failures (summarization or review call) skip that hit with a
/// warning rather than failing the stage; only reliable sources are
/// appended to the research data. The stage always advances the task
/// cursor, even when every hit was skipped.
pub struct SummarizeReviewStage {
    client: Arc<MultiProviderClient>,
    reviewer: Arc<dyn SourceReviewer>,
    max_content_len: usize,
    chunk_size: usize,
}

impl SummarizeReviewStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(
        client: Arc<MultiProviderClient>,
        reviewer: Arc<dyn SourceReviewer>,
        max_content_len: usize,
        chunk_size: usize,
    ) -> Self {
        Self {
            client,
            reviewer,
            max_content_len,
            chunk_size,
        }
    }

    /// Summarizes one source's content: truncate, chunk, summarize each
    /// chunk, join with newlines.
    async fn summarize_content(&self, task: &str, content: &str) -> Result<String, PipelineError> {
        let bounded = truncate_chars(content, self.max_content_len);
        let mut parts = Vec::new();
        for chunk in chunk_chars(bounded, self.chunk_size) {
            let prompt = build_summarize_prompt(task, &chunk);
            let summary = self
                .client
                .generate_with_fallback(&prompt, SUMMARIZE_MAX_TOKENS)
                .await?;
            parts.push(summary.trim().to_string());
        }
        Ok(parts.join("\n"))
    }
}

#[async_trait]
impl PipelineStage for SummarizeReviewStage {
    fn name(&self) -> &'static str {
        "summarize_review"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch, PipelineError> {
        let task = state.current_task().unwrap_or(&state.query).to_string();
        let mut patch = StatePatch {
            current_task_index: Some(state.current_task_index + 1),
            search_results: Some(Vec::new()),
            ..StatePatch::default()
        };

        for hit in &state.search_results {
            if hit.content.trim().is_empty() {
                debug!(url = %hit.url, "skipping result with no content");
                continue;
            }

            let summary = match self.summarize_content(&task, &hit.content).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(url = %hit.url, error = %e, "summarization failed, skipping source");
                    continue;
                }
            };

            let review = match self.reviewer.review(&summary, &hit.url).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(url = %hit.url, error = %e, "review failed, skipping source");
                    continue;
                }
            };

            if !review.is_reliable {
                info!(url = %hit.url, critique = %review.critique, "source rejected by reviewer");
                continue;
            }

            patch.research_data.push(crate::workflow::state::ReviewedSummary {
                url: hit.url.clone(),
                title: hit.title.clone(),
                task: task.clone(),
                summary,
                review,
            });
        }

        info!(
            task = %task,
            kept = patch.research_data.len(),
            candidates = state.search_results.len(),
            "summarize-review complete"
        );
        Ok(patch)
    }
}

impl std::fmt::Debug for SummarizeReviewStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizeReviewStage")
            .field("max_content_len", &self.max_content_len)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

/// Splits `text` into chunks of at most `chunk_size` characters.
fn chunk_chars(text: &str, chunk_size: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_size)
        .map(|c| c.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_splits_on_char_count() {
        let chunks = chunk_chars("abcdefgh", 3);
        assert_eq!(chunks, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_chars("", 3).is_empty());
    }

    #[test]
    fn test_chunk_handles_multibyte() {
        let chunks = chunk_chars("ééééé", 2);
        assert_eq!(chunks, vec!["éé", "éé", "é"]);
    }

    #[test]
    fn test_single_chunk_when_under_size() {
        let chunks = chunk_chars("short", 100);
        assert_eq!(chunks, vec!["short"]);
    }
}
