//! Core scheduling abstractions: tasks, queues and the worker pool.

pub mod error;
pub(crate) mod queues;
pub mod scheduler;
pub mod signal;
pub mod stats;
pub mod task;

pub use error::SchedulerError;
pub use scheduler::Scheduler;
pub use signal::CompletionSignal;
pub use stats::SchedulerStats;
pub use task::{Job, Task, TaskHandle, TaskId, TaskState};
