//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Environment variable overriding the worker count.
pub const ENV_WORKER_COUNT: &str = "TASK_SCHEDULER_WORKER_COUNT";
/// Environment variable overriding the worker stack size (bytes).
pub const ENV_STACK_SIZE: &str = "TASK_SCHEDULER_STACK_SIZE";
/// Environment variable overriding the worker thread name prefix.
pub const ENV_THREAD_PREFIX: &str = "TASK_SCHEDULER_THREAD_PREFIX";

const DEFAULT_THREAD_PREFIX: &str = "task-worker";

/// Smallest stack we allow a worker to be spawned with.
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Worker pool size used when none is configured: every logical core except
/// two (the OS and the main thread), but never fewer than three.
#[must_use]
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(2).max(3)
}

/// Scheduler configuration.
///
/// # Example
///
/// ```
/// use prometheus_task_scheduler::config::SchedulerConfig;
///
/// let config = SchedulerConfig::new()
///     .with_worker_count(4)
///     .with_thread_name_prefix("asset-loader");
/// assert!(config.validate().is_ok());
/// assert_eq!(config.resolved_worker_count(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of worker threads; `None` uses [`default_worker_count`].
    pub worker_count: Option<usize>,
    /// Stack size for worker threads in bytes; `None` uses the platform default.
    pub thread_stack_size: Option<usize>,
    /// Worker threads are named `{thread_name_prefix}-{index}`.
    pub thread_name_prefix: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            thread_stack_size: None,
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit worker count.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = Some(worker_count);
        self
    }

    /// Set the worker stack size in bytes.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, stack_size: usize) -> Self {
        self.thread_stack_size = Some(stack_size);
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Worker count after applying the default sizing rule.
    #[must_use]
    pub fn resolved_worker_count(&self) -> usize {
        self.worker_count.unwrap_or_else(default_worker_count)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == Some(0) {
            return Err("worker_count must be greater than 0".into());
        }
        if let Some(stack_size) = self.thread_stack_size {
            if stack_size < MIN_STACK_SIZE {
                return Err(format!(
                    "thread_stack_size must be at least {MIN_STACK_SIZE} bytes"
                ));
            }
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err("thread_name_prefix must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment, loading a `.env`
    /// file first if one exists.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed variable or validation
    /// failure.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is fine; real environment variables still apply.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Unset keys keep
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed value or validation
    /// failure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_WORKER_COUNT) {
            cfg.worker_count = Some(parse_usize(ENV_WORKER_COUNT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_STACK_SIZE) {
            cfg.thread_stack_size = Some(parse_usize(ENV_STACK_SIZE, &raw)?);
        }
        if let Some(prefix) = lookup(ENV_THREAD_PREFIX) {
            cfg.thread_name_prefix = prefix;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize, String> {
    raw.trim()
        .parse()
        .map_err(|e| format!("{key}=`{raw}` is not a valid count: {e}"))
}
