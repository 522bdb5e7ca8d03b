//! Concrete provider implementations.
//!
//! All three providers speak the OpenAI-compatible chat-completions API
//! via the `async-openai` crate, differing only in base URL, default
//! model, and credential. A shared [`CompletionsBackend`] holds the
//! client plumbing; each provider module wires its own endpoint.

pub mod gemini;
pub mod groq;
pub mod openai;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use openai::OpenAiProvider;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};

use crate::error::PipelineError;

/// Shared chat-completions transport for OpenAI-compatible endpoints.
pub(crate) struct CompletionsBackend {
    client: Client<OpenAIConfig>,
    model: String,
    provider: &'static str,
}

impl CompletionsBackend {
    /// Creates a backend for the given endpoint and credential.
    pub(crate) fn new(
        api_key: &str,
        base_url: Option<&str>,
        model: String,
        provider: &'static str,
    ) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url {
            config = config.with_api_base(url);
        }
        Self {
            client: Client::with_config(config),
            model,
            provider,
        }
    }

    /// Issues a single-turn completion and returns the response text.
    pub(crate) async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, PipelineError> {
        // `max_tokens` (not `max_completion_tokens`) is the parameter the
        // Groq and Gemini compatibility endpoints accept.
        #[allow(deprecated)]
        let request = CreateChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
                    name: None,
                },
            )],
            max_tokens: Some(max_tokens),
            ..Default::default()
        };

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| api_error(self.provider, &e.to_string()))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .ok_or_else(|| PipelineError::ResponseParse {
                message: format!("{} completion contained no message content", self.provider),
                content: format!("{:?}", response.choices),
            })
    }
}

impl std::fmt::Debug for CompletionsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionsBackend")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Maps an SDK error string to [`PipelineError::ApiRequest`], flagging
/// rate-limit responses so the fallback policy can react to them.
pub(crate) fn api_error(provider: &'static str, message: &str) -> PipelineError {
    let rate_limited = message.contains("429") || message.to_lowercase().contains("rate limit");
    PipelineError::ApiRequest {
        provider,
        message: message.to_string(),
        rate_limited,
    }
}

/// The "client not initialized" error returned when `generate` is called
/// on a provider constructed without a credential.
pub(crate) fn not_initialized(provider: &'static str) -> PipelineError {
    PipelineError::ApiRequest {
        provider,
        message: "client not initialized - no API key available".to_string(),
        rate_limited: false,
    }
}
