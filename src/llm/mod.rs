//! LLM client layer: provider trait, concrete providers, adaptive rate
//! limiting, and the multi-provider fallback client.

pub mod multi;
pub mod provider;
pub mod providers;
pub mod rate_limiter;

pub use multi::{MultiProviderClient, ProviderStats};
pub use provider::GenerateProvider;
pub use providers::{GeminiProvider, GroqProvider, OpenAiProvider};
pub use rate_limiter::{AdaptiveRateLimiter, RateLimiterParams, RateLimiterStats};
