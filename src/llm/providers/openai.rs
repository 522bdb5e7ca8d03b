//! `OpenAI` provider.
//!
//! Second in the fallback preference order: the reliable fallback.
//! Supports any `OpenAI`-compatible API (Azure, local proxies) via the
//! base URL override in [`PipelineConfig`].

use async_trait::async_trait;

use super::{CompletionsBackend, not_initialized};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::llm::provider::GenerateProvider;

/// `OpenAI`-compatible text-generation provider.
#[derive(Debug)]
pub struct OpenAiProvider {
    backend: Option<CompletionsBackend>,
}

impl OpenAiProvider {
    /// Creates the provider. The client is only constructed when
    /// `OPENAI_API_KEY` was present in the configuration.
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        let backend = config.openai_api_key.as_deref().map(|key| {
            CompletionsBackend::new(
                key,
                config.openai_base_url.as_deref(),
                config.openai_model.clone(),
                "openai",
            )
        });
        Self { backend }
    }
}

#[async_trait]
impl GenerateProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, PipelineError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| not_initialized("openai"))?;
        backend.complete(prompt, max_tokens).await
    }

    fn is_available(&self) -> bool {
        self.backend.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_without_key() {
        let provider = OpenAiProvider::new(&PipelineConfig::builder().build());
        assert!(!provider.is_available());
    }

    #[test]
    fn test_available_with_key() {
        let config = PipelineConfig::builder().openai_api_key("sk-test").build();
        let provider = OpenAiProvider::new(&config);
        assert!(provider.is_available());
        assert_eq!(provider.name(), "openai");
    }
}
