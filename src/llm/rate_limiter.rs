//! Adaptive rate limiter for generation calls.
//!
//! A leaky-bucket-of-one throttle whose delay hill-climbs toward the
//! fastest rate the backend currently tolerates: rate-limit responses
//! multiply the delay by a backoff factor, sustained success multiplies
//! it by a recovery factor. No manual tuning required.
//!
//! All counter mutation happens under a lock; the limiter is shared via
//! `Arc` across every generation attempt in the process.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Tuning parameters for [`AdaptiveRateLimiter`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterParams {
    /// Initial request rate in requests per second.
    pub initial_rps: f64,
    /// Floor for the inter-request delay.
    pub min_delay: Duration,
    /// Ceiling for the inter-request delay.
    pub max_delay: Duration,
    /// Multiplier applied on each rate-limit response (>1).
    pub backoff_multiplier: f64,
    /// Multiplier applied after sustained success (<1).
    pub recovery_multiplier: f64,
    /// Consecutive successes required before the delay is reduced.
    pub stability_threshold: u32,
}

impl Default for RateLimiterParams {
    fn default() -> Self {
        Self {
            initial_rps: 3.0,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 1.5,
            recovery_multiplier: 0.9,
            stability_threshold: 10,
        }
    }
}

/// Snapshot of the limiter's internal state, for monitoring and tests.
///
/// Never read by control flow.
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterStats {
    /// Current inter-request delay.
    pub current_delay: Duration,
    /// Recent rate-limit hits (decays by one per success).
    pub rate_limit_count: u32,
    /// Consecutive successes since the last rate limit or recovery step.
    pub success_count: u32,
    /// Effective request rate implied by the current delay.
    pub effective_rps: f64,
}

#[derive(Debug)]
struct LimiterState {
    current_delay: Duration,
    last_request: Option<Instant>,
    rate_limit_count: u32,
    success_count: u32,
}

/// Per-process adaptive delay controller.
///
/// `wait_if_needed` paces callers; `on_rate_limit` / `on_success` feed the
/// control loop with observed outcomes. Safe for concurrent callers.
#[derive(Debug)]
pub struct AdaptiveRateLimiter {
    params: RateLimiterParams,
    state: Mutex<LimiterState>,
}

impl AdaptiveRateLimiter {
    /// Creates a limiter with the given parameters.
    #[must_use]
    pub fn new(params: RateLimiterParams) -> Self {
        let current_delay = Duration::from_secs_f64(1.0 / params.initial_rps);
        Self {
            params,
            state: Mutex::new(LimiterState {
                current_delay,
                last_request: None,
                rate_limit_count: 0,
                success_count: 0,
            }),
        }
    }

    /// Blocks until at least the current delay has elapsed since the last
    /// recorded call start, then records a new call start.
    ///
    /// This is a throttle, not a queue: concurrent callers race for the
    /// next slot and the loser re-waits for the following one.
    pub async fn wait_if_needed(&self) {
        loop {
            let sleep_for = {
                let mut state = self.lock_state();
                let now = Instant::now();
                match state.last_request {
                    Some(last) => {
                        let since_last = now.duration_since(last);
                        if since_last >= state.current_delay {
                            state.last_request = Some(now);
                            return;
                        }
                        state.current_delay - since_last
                    }
                    None => {
                        state.last_request = Some(now);
                        return;
                    }
                }
            };
            tokio::time::sleep(sleep_for).await;
        }
    }

    /// Records a rate-limit response: increases the delay with backoff,
    /// clamped to `max_delay`, and resets the consecutive-success counter.
    pub fn on_rate_limit(&self) {
        let mut state = self.lock_state();
        state.rate_limit_count += 1;
        state.success_count = 0;
        state.current_delay = clamp(
            state.current_delay.mul_f64(self.params.backoff_multiplier),
            self.params.min_delay,
            self.params.max_delay,
        );
        tracing::info!(
            new_delay_ms = state.current_delay.as_millis(),
            "rate limit hit, backing off"
        );
    }

    /// Records a successful call: once enough consecutive successes have
    /// accumulated with no recent rate limit, reduces the delay toward
    /// `min_delay`.
    pub fn on_success(&self) {
        let mut state = self.lock_state();
        state.success_count += 1;
        state.rate_limit_count = state.rate_limit_count.saturating_sub(1);

        if state.success_count >= self.params.stability_threshold
            && state.rate_limit_count == 0
            && state.current_delay > self.params.min_delay
        {
            state.current_delay = clamp(
                state.current_delay.mul_f64(self.params.recovery_multiplier),
                self.params.min_delay,
                self.params.max_delay,
            );
            state.success_count = 0;
            tracing::info!(
                new_delay_ms = state.current_delay.as_millis(),
                "stable performance, reduced delay"
            );
        }
    }

    /// Returns the current inter-request delay.
    #[must_use]
    pub fn current_delay(&self) -> Duration {
        self.lock_state().current_delay
    }

    /// Returns a snapshot of the limiter state.
    #[must_use]
    pub fn stats(&self) -> RateLimiterStats {
        let state = self.lock_state();
        RateLimiterStats {
            current_delay: state.current_delay,
            rate_limit_count: state.rate_limit_count,
            success_count: state.success_count,
            effective_rps: 1.0 / state.current_delay.as_secs_f64().max(f64::EPSILON),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LimiterState> {
        // A poisoned lock means another thread panicked mid-update; the
        // counters are still usable, so recover the guard.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for AdaptiveRateLimiter {
    fn default() -> Self {
        Self::new(RateLimiterParams::default())
    }
}

fn clamp(value: Duration, min: Duration, max: Duration) -> Duration {
    value.max(min).min(max)
}
