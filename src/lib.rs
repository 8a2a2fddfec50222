//! # Prometheus Task Scheduler
//!
//! A dependency-aware thread-pool task scheduler for the Prometheus engine.
//!
//! A small pool of worker threads executes deferred units of work
//! ("tasks"). A task may name other tasks as prerequisites and will not run
//! until all of them have completed. Any thread may also wait on a task; if
//! the task is eligible and unclaimed, the waiting thread runs it itself
//! instead of blocking.
//!
//! ## Guarantees
//!
//! - **Exactly once**: a task's body runs at most once, even when workers and
//!   waiting threads race for it (the claim is a single compare-exchange).
//! - **Dependency ordering**: a task never completes before any of its
//!   dependencies.
//! - **No busy waiting**: idle workers sleep on a condition variable; waiters
//!   sleep on a per-task completion signal.
//! - **No cycles**: dependencies are `Arc` handles fixed at construction, so a
//!   task can only depend on tasks that already exist.
//!
//! ## Example
//!
//! ```
//! use prometheus_task_scheduler::config::SchedulerConfig;
//! use prometheus_task_scheduler::core::{Scheduler, Task};
//! use std::time::Duration;
//!
//! let scheduler = Scheduler::start(SchedulerConfig::new())?;
//!
//! let mesh = Task::new(|| { /* load mesh */ });
//! let texture = Task::new(|| { /* load texture */ });
//! let material = Task::with_dependencies(|| { /* bind */ }, [mesh.clone(), texture.clone()]);
//!
//! scheduler.enqueue(&material);
//! scheduler.enqueue(&mesh);
//! scheduler.enqueue(&texture);
//!
//! assert!(material.await_timeout(Duration::from_secs(5)));
//! # Ok::<(), prometheus_task_scheduler::core::SchedulerError>(())
//! ```
//!
//! ## Logging
//!
//! Scheduler events are emitted through `tracing`. Call
//! [`util::init_tracing`] to install a default subscriber, or install your
//! own. [`infra::BufferedLogger`] is a console logger that performs its I/O in
//! scheduler tasks.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Tasks, queues and the worker pool.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Infrastructure built on the scheduler (buffered console logging).
pub mod infra;
/// Runtime adapters (async waiting).
pub mod runtime;
/// Shared utilities (telemetry, thread identities).
pub mod util;
