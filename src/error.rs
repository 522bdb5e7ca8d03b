//! Error types for the research pipeline.
//!
//! One enum covers the whole crate so stage nodes, the generation client,
//! and the engine share a single `Result` alphabet. Rate-limit failures
//! are a distinguished case because the fallback policy depends on them.

use thiserror::Error;

/// Errors produced by the pipeline core.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No generation provider had a credential at construction time.
    ///
    /// Configuration-fatal: raised before any workflow runs, since no
    /// request could ever succeed.
    #[error("no generation providers configured - set at least one of: {missing}")]
    NoProvidersConfigured {
        /// Comma-separated list of the credential env vars that were absent.
        missing: String,
    },

    /// A single provider request failed.
    #[error("{provider} request failed: {message}")]
    ApiRequest {
        /// Provider that produced the failure.
        provider: &'static str,
        /// Error detail from the SDK or transport.
        message: String,
        /// Whether the provider signalled rate limiting (HTTP 429 class).
        rate_limited: bool,
    },

    /// Every configured provider failed on the same call.
    #[error("all providers failed - last errors: [{last_errors}]")]
    AllProvidersFailed {
        /// Per-provider last error messages, joined for diagnostics.
        last_errors: String,
    },

    /// Model output could not be parsed into the expected structure.
    #[error("failed to parse model output: {message}")]
    ResponseParse {
        /// What went wrong.
        message: String,
        /// The raw content that failed to parse, for diagnostics.
        content: String,
    },

    /// The search capability failed.
    ///
    /// Callers at the stage boundary treat this as soft: a failed search
    /// yields zero candidate sources, not a fatal error.
    #[error("search request failed: {message}")]
    Search {
        /// Error detail from the search backend.
        message: String,
    },

    /// A workflow-level failure (invalid state, stage invariant violation).
    #[error("{message}")]
    Orchestration {
        /// Error detail. Displayed verbatim in the terminal error report.
        message: String,
    },
}

impl PipelineError {
    /// Whether this error signals rate limiting.
    ///
    /// Checks the structured flag first, then falls back to sniffing the
    /// message for "429" or "rate limit" - OpenAI-compatible SDKs often
    /// surface the status only inside the error text.
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::ApiRequest {
                rate_limited,
                message,
                ..
            } => {
                *rate_limited
                    || message.contains("429")
                    || message.to_lowercase().contains("rate limit")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_flag() {
        let err = PipelineError::ApiRequest {
            provider: "groq",
            message: "too many requests".to_string(),
            rate_limited: true,
        };
        assert!(err.is_rate_limit());
    }

    #[test]
    fn test_rate_limit_sniffed_from_status_text() {
        let err = PipelineError::ApiRequest {
            provider: "openai",
            message: "HTTP 429 Too Many Requests".to_string(),
            rate_limited: false,
        };
        assert!(err.is_rate_limit());
    }

    #[test]
    fn test_rate_limit_sniffed_case_insensitive() {
        let err = PipelineError::ApiRequest {
            provider: "gemini",
            message: "Rate Limit exceeded for model".to_string(),
            rate_limited: false,
        };
        assert!(err.is_rate_limit());
    }

    #[test]
    fn test_non_rate_limit_error() {
        let err = PipelineError::ApiRequest {
            provider: "openai",
            message: "connection reset".to_string(),
            rate_limited: false,
        };
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn test_orchestration_displays_message_verbatim() {
        let err = PipelineError::Orchestration {
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_search_error_is_not_rate_limit() {
        let err = PipelineError::Search {
            message: "429".to_string(),
        };
        assert!(!err.is_rate_limit());
    }
}
