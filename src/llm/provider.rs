//! Pluggable text-generation provider trait.
//!
//! Implementations wrap one backend behind a uniform
//! `generate(prompt, max_tokens)` contract. This keeps the fallback
//! client and every workflow stage decoupled from any particular vendor.

use async_trait::async_trait;

use crate::error::PipelineError;

/// Trait for text-generation backends.
///
/// Implementations handle transport for a specific provider while
/// presenting a uniform interface to the fallback client. Rate-limit
/// failures must surface as [`PipelineError::ApiRequest`] with the
/// `rate_limited` flag set, because the failover policy depends on
/// telling them apart from other errors.
#[async_trait]
pub trait GenerateProvider: Send + Sync {
    /// Provider name (e.g., `"groq"`, `"openai"`, `"gemini"`).
    fn name(&self) -> &'static str;

    /// Generates text from a prompt, bounded by `max_tokens`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ApiRequest`] on API failures or timeouts.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, PipelineError>;

    /// Whether this provider can serve requests.
    ///
    /// True iff its credential was present and its client constructed
    /// without error. Unavailable providers are excluded from the
    /// fallback order entirely.
    fn is_available(&self) -> bool;
}
