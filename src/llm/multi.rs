//! Multi-provider generation client with automatic fallback.
//!
//! Holds an ordered list of [`GenerateProvider`]s (fastest first) and
//! tries each in turn, returning the first success. Two throttles apply
//! before every attempt: the process-wide [`AdaptiveRateLimiter`] and a
//! simpler per-provider minimum-interval cooldown. Rate-limited failures
//! feed the adaptive limiter and insert a randomized jitter delay before
//! the next provider is tried, so an overloaded backend is not hammered
//! by an immediate retry wave.
//!
//! Per-provider statistics are collected for monitoring and tests; they
//! never influence the fallback order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::llm::provider::GenerateProvider;
use crate::llm::providers::{GeminiProvider, GroqProvider, OpenAiProvider};
use crate::llm::rate_limiter::AdaptiveRateLimiter;

/// Per-provider call statistics.
///
/// Process-wide, reset only at construction. Read by monitoring and
/// tests, never by control flow.
#[derive(Debug, Clone, Default)]
pub struct ProviderStats {
    /// Successful generation calls.
    pub success_count: u64,
    /// Failed generation calls.
    pub error_count: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
    /// Time of the most recent success.
    pub last_success: Option<Instant>,
}

/// Multi-provider LLM client with automatic fallback.
pub struct MultiProviderClient {
    providers: Vec<Arc<dyn GenerateProvider>>,
    limiter: Arc<AdaptiveRateLimiter>,
    cooldown: Duration,
    jitter: (Duration, Duration),
    last_request: Mutex<HashMap<&'static str, Instant>>,
    stats: Mutex<HashMap<&'static str, ProviderStats>>,
}

impl MultiProviderClient {
    /// Builds the client from configuration with the standard provider
    /// roster in preference order: Groq (fastest) → `OpenAI` → Gemini.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoProvidersConfigured`] when no provider
    /// credential is present - a configuration error raised before any
    /// workflow runs.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let limiter = Arc::new(AdaptiveRateLimiter::new(config.limiter));
        let candidates: Vec<Arc<dyn GenerateProvider>> = vec![
            Arc::new(GroqProvider::new(config)),
            Arc::new(OpenAiProvider::new(config)),
            Arc::new(GeminiProvider::new(config)),
        ];
        Self::with_providers(
            candidates,
            limiter,
            config.provider_cooldown,
            config.rate_limit_jitter,
        )
    }

    /// Builds the client from an explicit provider list.
    ///
    /// Candidates that report `is_available() == false` are excluded
    /// from the fallback order entirely.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoProvidersConfigured`] when no candidate
    /// is available.
    pub fn with_providers(
        candidates: Vec<Arc<dyn GenerateProvider>>,
        limiter: Arc<AdaptiveRateLimiter>,
        cooldown: Duration,
        jitter: (Duration, Duration),
    ) -> Result<Self, PipelineError> {
        let mut providers = Vec::new();
        let mut stats = HashMap::new();
        let mut missing = Vec::new();

        for candidate in candidates {
            if candidate.is_available() {
                stats.insert(candidate.name(), ProviderStats::default());
                providers.push(candidate);
            } else {
                warn!(provider = candidate.name(), "provider not available - missing or invalid API key");
                missing.push(credential_hint(candidate.name()));
            }
        }

        if providers.is_empty() {
            return Err(PipelineError::NoProvidersConfigured {
                missing: missing.join(", "),
            });
        }

        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        info!(providers = ?names, "initialized generation providers");

        Ok(Self {
            providers,
            limiter,
            cooldown,
            jitter,
            last_request: Mutex::new(HashMap::new()),
            stats: Mutex::new(stats),
        })
    }

    /// Generates text using the configured providers with automatic
    /// fallback. Fails only when every provider fails on this call.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AllProvidersFailed`] aggregating each
    /// provider's last error.
    pub async fn generate_with_fallback(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, PipelineError> {
        debug!(
            chars = prompt.len(),
            approx_tokens = prompt.len() / 4,
            "generation request"
        );

        let mut failures: Vec<String> = Vec::new();

        for provider in &self.providers {
            let name = provider.name();

            self.limiter.wait_if_needed().await;
            self.cooldown_provider(name).await;

            let started = Instant::now();
            match provider.generate(prompt, max_tokens).await {
                Ok(text) => {
                    self.record_success(name);
                    self.limiter.on_success();
                    debug!(
                        provider = name,
                        elapsed_ms = started.elapsed().as_millis(),
                        "provider succeeded"
                    );
                    return Ok(text);
                }
                Err(e) => {
                    let rate_limited = e.is_rate_limit();
                    self.record_error(name, &e);
                    warn!(provider = name, error = %e, "provider failed");
                    failures.push(format!("{name}: {e}"));

                    if rate_limited {
                        self.limiter.on_rate_limit();
                        let delay = self.jitter_delay();
                        debug!(
                            provider = name,
                            delay_ms = delay.as_millis(),
                            "rate limited, jittering before next provider"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(PipelineError::AllProvidersFailed {
            last_errors: failures.join("; "),
        })
    }

    /// Names of the available providers, in fallback order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Snapshot of per-provider statistics.
    #[must_use]
    pub fn stats(&self) -> HashMap<&'static str, ProviderStats> {
        self.lock_stats().clone()
    }

    /// The provider with the best success ratio so far, if any provider
    /// has handled at least one request.
    #[must_use]
    pub fn best_provider(&self) -> Option<&'static str> {
        let stats = self.lock_stats();
        let mut best: Option<(&'static str, f64)> = None;
        for (&name, s) in stats.iter() {
            let total = s.success_count + s.error_count;
            if total == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let ratio = s.success_count as f64 / total as f64;
            if best.is_none_or(|(_, r)| ratio > r) {
                best = Some((name, ratio));
            }
        }
        best.map(|(name, _)| name)
    }

    /// Shared adaptive rate limiter, for monitoring.
    #[must_use]
    pub fn limiter(&self) -> &AdaptiveRateLimiter {
        &self.limiter
    }

    /// Enforces the per-provider minimum request interval, then records
    /// a new request start for the provider.
    async fn cooldown_provider(&self, name: &'static str) {
        let sleep_for = {
            let guard = self.lock_last_request();
            guard.get(name).and_then(|last| {
                let since_last = last.elapsed();
                (since_last < self.cooldown).then(|| self.cooldown - since_last)
            })
        };
        if let Some(delay) = sleep_for {
            tokio::time::sleep(delay).await;
        }
        self.lock_last_request().insert(name, Instant::now());
    }

    fn jitter_delay(&self) -> Duration {
        let (min, max) = self.jitter;
        if max <= min {
            return min;
        }
        let spread = (max - min).as_secs_f64();
        min + Duration::from_secs_f64(rand::rng().random_range(0.0..spread))
    }

    fn record_success(&self, name: &'static str) {
        let mut stats = self.lock_stats();
        let entry = stats.entry(name).or_default();
        entry.success_count += 1;
        entry.last_success = Some(Instant::now());
    }

    fn record_error(&self, name: &'static str, error: &PipelineError) {
        let mut stats = self.lock_stats();
        let entry = stats.entry(name).or_default();
        entry.error_count += 1;
        entry.last_error = Some(error.to_string());
    }

    fn lock_stats(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, ProviderStats>> {
        self.stats
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_last_request(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, Instant>> {
        self.last_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MultiProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiProviderClient")
            .field("providers", &self.provider_names())
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Maps a provider name to the env var its credential comes from, for
/// the configuration-fatal error message.
fn credential_hint(name: &str) -> String {
    match name {
        "groq" => "GROQ_API_KEY".to_string(),
        "openai" => "OPENAI_API_KEY".to_string(),
        "gemini" => "GEMINI_API_KEY".to_string(),
        other => other.to_string(),
    }
}
