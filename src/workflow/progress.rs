//! Progress reporting for workflow consumers.

/// Lifecycle status of a stage execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// The stage has started.
    Running,
    /// The stage finished successfully.
    Completed,
    /// The stage failed; the workflow is ending.
    Failed,
}

/// A progress update emitted by the workflow engine.
///
/// Delivered over an unbounded channel so a slow consumer can never
/// stall the pipeline.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Name of the stage this event concerns.
    pub stage: &'static str,
    /// What happened.
    pub status: StageStatus,
    /// Human-readable detail.
    pub message: String,
    /// Rough overall completion estimate, 0-100.
    pub percent: u8,
}
