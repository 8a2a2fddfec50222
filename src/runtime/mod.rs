//! Runtime adapters.

#[cfg(feature = "tokio-runtime")]
pub mod tokio_wait;

#[cfg(feature = "tokio-runtime")]
pub use tokio_wait::{await_completed_async, await_timeout_async};
