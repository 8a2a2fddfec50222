//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler components.
///
/// Most task-level misuse (re-enqueueing a finished task, waiting on a task
/// whose dependency never runs) is not an error: it is reported through
/// `tracing` diagnostics and the task surface itself. Only lifecycle and
/// configuration failures surface here.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker {worker_id}: {source}")]
    Spawn {
        /// Index of the worker that could not be started.
        worker_id: usize,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// A background wait could not be joined.
    #[error("join error: {0}")]
    Join(String),
}
