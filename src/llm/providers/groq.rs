//! Groq provider.
//!
//! First in the fallback preference order: the fastest of the configured
//! backends, well suited to high-volume summarization calls.

use async_trait::async_trait;

use super::{CompletionsBackend, not_initialized};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::llm::provider::GenerateProvider;

/// Groq's OpenAI-compatible endpoint.
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq text-generation provider.
#[derive(Debug)]
pub struct GroqProvider {
    backend: Option<CompletionsBackend>,
}

impl GroqProvider {
    /// Creates the provider. The client is only constructed when
    /// `GROQ_API_KEY` was present in the configuration.
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        let backend = config.groq_api_key.as_deref().map(|key| {
            CompletionsBackend::new(key, Some(GROQ_BASE_URL), config.groq_model.clone(), "groq")
        });
        Self { backend }
    }
}

#[async_trait]
impl GenerateProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "groq"
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, PipelineError> {
        let backend = self.backend.as_ref().ok_or_else(|| not_initialized("groq"))?;
        backend.complete(prompt, max_tokens).await
    }

    fn is_available(&self) -> bool {
        self.backend.is_some()
    }
}
