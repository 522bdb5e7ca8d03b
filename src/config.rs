//! Pipeline configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! Missing provider credentials are not an error here - availability is
//! checked when the generation client is constructed, so a config built
//! from a bare environment is still usable for offline tests.

use std::time::Duration;

use crate::llm::rate_limiter::RateLimiterParams;

/// Default maximum search results per sub-task.
const DEFAULT_MAX_SEARCH_RESULTS: usize = 3;
/// Default cap on planner sub-tasks.
const DEFAULT_MAX_PLAN_TASKS: usize = 5;
/// Default truncation length for raw source content, in characters.
const DEFAULT_MAX_CONTENT_LEN: usize = 3000;
/// Default chunk size for summarizing long content, in characters.
const DEFAULT_CHUNK_SIZE: usize = 2000;
/// Default character budget for the writer's aggregate research block.
const DEFAULT_WRITER_INPUT_BUDGET: usize = 24_000;
/// Default pacing delay between task-loop iterations.
const DEFAULT_TASK_PACING_MS: u64 = 1000;
/// Default minimum interval between requests to the same provider.
const DEFAULT_PROVIDER_COOLDOWN_MS: u64 = 500;
/// Default jitter window slept before falling over from a rate-limited provider.
const DEFAULT_JITTER_MIN_MS: u64 = 2000;
const DEFAULT_JITTER_MAX_MS: u64 = 5000;

/// Configuration for the research pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Groq API key (`GROQ_API_KEY`).
    pub groq_api_key: Option<String>,
    /// OpenAI API key (`OPENAI_API_KEY`).
    pub openai_api_key: Option<String>,
    /// Gemini API key (`GEMINI_API_KEY`).
    pub gemini_api_key: Option<String>,
    /// Tavily search API key (`TAVILY_API_KEY`).
    pub tavily_api_key: Option<String>,
    /// Model used by the Groq provider.
    pub groq_model: String,
    /// Model used by the OpenAI provider.
    pub openai_model: String,
    /// Model used by the Gemini provider.
    pub gemini_model: String,
    /// Optional base URL override for the OpenAI provider (proxies,
    /// compatible APIs).
    pub openai_base_url: Option<String>,
    /// Maximum search hits requested per sub-task.
    pub max_search_results: usize,
    /// Maximum sub-tasks accepted from the planner.
    pub max_plan_tasks: usize,
    /// Raw source content is truncated to this many characters before
    /// summarization.
    pub max_content_len: usize,
    /// Content longer than this is split into chunks of this size and
    /// each chunk summarized independently.
    pub chunk_size: usize,
    /// Character budget for the aggregate research block handed to the
    /// writer. Input past the budget is elided with an explicit marker
    /// rather than relying on provider-side clipping.
    pub writer_input_budget: usize,
    /// Fixed delay between task-loop iterations.
    pub task_pacing: Duration,
    /// Minimum interval between requests to the same provider,
    /// independent of the adaptive limiter.
    pub provider_cooldown: Duration,
    /// Randomized delay window slept before trying the next provider
    /// after a rate-limited failure.
    pub rate_limit_jitter: (Duration, Duration),
    /// Adaptive rate limiter tuning.
    pub limiter: RateLimiterParams,
}

impl PipelineConfig {
    /// Creates a new builder for `PipelineConfig`.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::builder().from_env().build()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    groq_api_key: Option<String>,
    openai_api_key: Option<String>,
    gemini_api_key: Option<String>,
    tavily_api_key: Option<String>,
    groq_model: Option<String>,
    openai_model: Option<String>,
    gemini_model: Option<String>,
    openai_base_url: Option<String>,
    max_search_results: Option<usize>,
    max_plan_tasks: Option<usize>,
    max_content_len: Option<usize>,
    chunk_size: Option<usize>,
    writer_input_budget: Option<usize>,
    task_pacing: Option<Duration>,
    provider_cooldown: Option<Duration>,
    rate_limit_jitter: Option<(Duration, Duration)>,
    limiter: Option<RateLimiterParams>,
}

impl PipelineConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.groq_api_key.is_none() {
            self.groq_api_key = std::env::var("GROQ_API_KEY").ok();
        }
        if self.openai_api_key.is_none() {
            self.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if self.gemini_api_key.is_none() {
            self.gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        }
        if self.tavily_api_key.is_none() {
            self.tavily_api_key = std::env::var("TAVILY_API_KEY").ok();
        }
        if self.groq_model.is_none() {
            self.groq_model = std::env::var("ORCHESTRATE_GROQ_MODEL").ok();
        }
        if self.openai_model.is_none() {
            self.openai_model = std::env::var("ORCHESTRATE_OPENAI_MODEL").ok();
        }
        if self.gemini_model.is_none() {
            self.gemini_model = std::env::var("ORCHESTRATE_GEMINI_MODEL").ok();
        }
        if self.openai_base_url.is_none() {
            self.openai_base_url = std::env::var("OPENAI_BASE_URL").ok();
        }
        if self.max_search_results.is_none() {
            self.max_search_results = std::env::var("ORCHESTRATE_MAX_RESULTS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.max_plan_tasks.is_none() {
            self.max_plan_tasks = std::env::var("ORCHESTRATE_MAX_TASKS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        self
    }

    /// Sets the Groq API key.
    #[must_use]
    pub fn groq_api_key(mut self, key: impl Into<String>) -> Self {
        self.groq_api_key = Some(key.into());
        self
    }

    /// Sets the OpenAI API key.
    #[must_use]
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Sets the Gemini API key.
    #[must_use]
    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(key.into());
        self
    }

    /// Sets the Tavily search API key.
    #[must_use]
    pub fn tavily_api_key(mut self, key: impl Into<String>) -> Self {
        self.tavily_api_key = Some(key.into());
        self
    }

    /// Sets the Groq model.
    #[must_use]
    pub fn groq_model(mut self, model: impl Into<String>) -> Self {
        self.groq_model = Some(model.into());
        self
    }

    /// Sets the OpenAI model.
    #[must_use]
    pub fn openai_model(mut self, model: impl Into<String>) -> Self {
        self.openai_model = Some(model.into());
        self
    }

    /// Sets the Gemini model.
    #[must_use]
    pub fn gemini_model(mut self, model: impl Into<String>) -> Self {
        self.gemini_model = Some(model.into());
        self
    }

    /// Sets the base URL override for the OpenAI provider.
    #[must_use]
    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = Some(url.into());
        self
    }

    /// Sets the maximum search results per sub-task.
    #[must_use]
    pub const fn max_search_results(mut self, n: usize) -> Self {
        self.max_search_results = Some(n);
        self
    }

    /// Sets the cap on planner sub-tasks.
    #[must_use]
    pub const fn max_plan_tasks(mut self, n: usize) -> Self {
        self.max_plan_tasks = Some(n);
        self
    }

    /// Sets the source content truncation length.
    #[must_use]
    pub const fn max_content_len(mut self, n: usize) -> Self {
        self.max_content_len = Some(n);
        self
    }

    /// Sets the summarization chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = Some(n);
        self
    }

    /// Sets the writer input character budget.
    #[must_use]
    pub const fn writer_input_budget(mut self, n: usize) -> Self {
        self.writer_input_budget = Some(n);
        self
    }

    /// Sets the pacing delay between task-loop iterations.
    #[must_use]
    pub const fn task_pacing(mut self, delay: Duration) -> Self {
        self.task_pacing = Some(delay);
        self
    }

    /// Sets the per-provider request cooldown.
    #[must_use]
    pub const fn provider_cooldown(mut self, cooldown: Duration) -> Self {
        self.provider_cooldown = Some(cooldown);
        self
    }

    /// Sets the jitter window slept before provider failover on rate limits.
    #[must_use]
    pub const fn rate_limit_jitter(mut self, min: Duration, max: Duration) -> Self {
        self.rate_limit_jitter = Some((min, max));
        self
    }

    /// Sets the adaptive rate limiter parameters.
    #[must_use]
    pub const fn limiter(mut self, params: RateLimiterParams) -> Self {
        self.limiter = Some(params);
        self
    }

    /// Builds the [`PipelineConfig`].
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        PipelineConfig {
            groq_api_key: self.groq_api_key,
            openai_api_key: self.openai_api_key,
            gemini_api_key: self.gemini_api_key,
            tavily_api_key: self.tavily_api_key,
            groq_model: self
                .groq_model
                .unwrap_or_else(|| "llama-3.1-8b-instant".to_string()),
            openai_model: self
                .openai_model
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            gemini_model: self
                .gemini_model
                .unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            openai_base_url: self.openai_base_url,
            max_search_results: self.max_search_results.unwrap_or(DEFAULT_MAX_SEARCH_RESULTS),
            max_plan_tasks: self.max_plan_tasks.unwrap_or(DEFAULT_MAX_PLAN_TASKS),
            max_content_len: self.max_content_len.unwrap_or(DEFAULT_MAX_CONTENT_LEN),
            chunk_size: self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            writer_input_budget: self
                .writer_input_budget
                .unwrap_or(DEFAULT_WRITER_INPUT_BUDGET),
            task_pacing: self
                .task_pacing
                .unwrap_or(Duration::from_millis(DEFAULT_TASK_PACING_MS)),
            provider_cooldown: self
                .provider_cooldown
                .unwrap_or(Duration::from_millis(DEFAULT_PROVIDER_COOLDOWN_MS)),
            rate_limit_jitter: self.rate_limit_jitter.unwrap_or((
                Duration::from_millis(DEFAULT_JITTER_MIN_MS),
                Duration::from_millis(DEFAULT_JITTER_MAX_MS),
            )),
            limiter: self.limiter.unwrap_or_default(),
        }
    }
}
