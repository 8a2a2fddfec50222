//! Configuration models for the scheduler.

pub mod scheduler;

pub use scheduler::{default_worker_count, SchedulerConfig};
