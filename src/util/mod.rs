//! Shared utilities.

pub mod telemetry;
pub mod thread_id;

pub use telemetry::init_tracing;
pub use thread_id::{current_thread_id, ThreadRegistry};
