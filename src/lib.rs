//! Multi-agent research report pipeline.
//!
//! Turns a research query into a cited Markdown report through a staged
//! workflow: a planner breaks the query into search tasks, a searcher
//! gathers web sources, a summarize-review stage condenses and vets each
//! source, and a writer composes the final report. All LLM calls go
//! through a multi-provider client with ordered fallback and adaptive
//! rate limiting.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use orchestrate_rs::config::PipelineConfig;
//! use orchestrate_rs::llm::MultiProviderClient;
//! use orchestrate_rs::review::LlmReviewer;
//! use orchestrate_rs::search::TavilyClient;
//! use orchestrate_rs::workflow::WorkflowEngine;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = PipelineConfig::from_env();
//! let client = Arc::new(MultiProviderClient::from_config(&config)?);
//! let search = Arc::new(TavilyClient::new("tvly-..."));
//! let reviewer = Arc::new(LlmReviewer::new(client.clone()));
//!
//! let engine = WorkflowEngine::new(&config, client, search, reviewer);
//! let state = engine.run("state of perovskite solar cells").await;
//! println!("{}", state.final_report.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod review;
pub mod search;
pub mod workflow;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use llm::MultiProviderClient;
pub use workflow::{WorkflowEngine, WorkflowState};
