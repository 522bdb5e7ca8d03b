//! Gemini provider.
//!
//! Last in the fallback preference order. Uses Google's
//! OpenAI-compatibility endpoint so the whole provider roster shares one
//! transport instead of pulling in a second SDK.

use async_trait::async_trait;

use super::{CompletionsBackend, not_initialized};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::llm::provider::GenerateProvider;

/// Google's OpenAI-compatibility endpoint for Gemini models.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Gemini text-generation provider.
#[derive(Debug)]
pub struct GeminiProvider {
    backend: Option<CompletionsBackend>,
}

impl GeminiProvider {
    /// Creates the provider. The client is only constructed when
    /// `GEMINI_API_KEY` was present in the configuration.
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        let backend = config.gemini_api_key.as_deref().map(|key| {
            CompletionsBackend::new(
                key,
                Some(GEMINI_BASE_URL),
                config.gemini_model.clone(),
                "gemini",
            )
        });
        Self { backend }
    }
}

#[async_trait]
impl GenerateProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, PipelineError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| not_initialized("gemini"))?;
        backend.complete(prompt, max_tokens).await
    }

    fn is_available(&self) -> bool {
        self.backend.is_some()
    }
}
