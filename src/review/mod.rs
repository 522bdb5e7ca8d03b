//! Source reliability review.
//!
//! [`SourceReviewer`] is the seam the summarize-review stage depends on.
//! The shipped [`LlmReviewer`] asks the LLM for a strict-JSON verdict and
//! parses it leniently, since models wrap JSON in code fences or prose
//! more often than not.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::error::PipelineError;
use crate::llm::MultiProviderClient;
use crate::prompts::build_review_prompt;
use crate::workflow::state::Review;

/// Token budget for a review verdict. Small on purpose: the response is
/// a single JSON object.
const REVIEW_MAX_TOKENS: u32 = 200;

/// Assesses whether a summarized source is reliable enough to cite.
#[async_trait]
pub trait SourceReviewer: Send + Sync {
    /// Reviews one summarized source.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying LLM call fails. A response
    /// that arrives but cannot be parsed is NOT an error; implementations
    /// fall back to a permissive verdict instead.
    async fn review(&self, summary: &str, url: &str) -> Result<Review, PipelineError>;
}

/// LLM-backed reviewer.
#[derive(Debug, Clone)]
pub struct LlmReviewer {
    client: Arc<MultiProviderClient>,
}

#[derive(Deserialize)]
struct ReviewVerdict {
    is_reliable: bool,
    #[serde(default)]
    critique: String,
}

impl LlmReviewer {
    /// Creates a reviewer over the shared generation client.
    #[must_use]
    pub fn new(client: Arc<MultiProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceReviewer for LlmReviewer {
    async fn review(&self, summary: &str, url: &str) -> Result<Review, PipelineError> {
        let prompt = build_review_prompt(summary, url);
        let response = self
            .client
            .generate_with_fallback(&prompt, REVIEW_MAX_TOKENS)
            .await?;
        Ok(parse_review(&response))
    }
}

/// Extracts a [`Review`] from an LLM response, tolerating code fences and
/// surrounding prose. An unparseable response yields a permissive verdict
/// so one chatty model response does not discard a good source.
fn parse_review(response: &str) -> Review {
    if let Some(json) = extract_json_object(response) {
        if let Ok(verdict) = serde_json::from_str::<ReviewVerdict>(json) {
            return Review {
                is_reliable: verdict.is_reliable,
                critique: verdict.critique,
            };
        }
    }
    warn!("review response was not parseable JSON, accepting source");
    Review {
        is_reliable: true,
        critique: "review response was not parseable; source accepted unreviewed".to_string(),
    }
}

/// Finds the first balanced top-level `{ ... }` span in the text.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
