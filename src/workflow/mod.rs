//! Workflow engine, stages, state, and progress reporting.

pub mod engine;
pub mod progress;
pub mod stages;
pub mod state;

pub use engine::WorkflowEngine;
pub use progress::{ProgressEvent, StageStatus};
pub use state::{ResearchPlan, Review, ReviewedSummary, SearchHit, StatePatch, WorkflowState};
