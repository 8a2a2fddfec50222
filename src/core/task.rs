//! Tasks, their work bodies and the three-state lifecycle.
//!
//! A [`Task`] is created once with its work body ([`Job`]) and the list of
//! tasks it depends on. Both are fixed for the task's lifetime. Tasks are
//! always handled through [`TaskHandle`] (`Arc<Task>`), so a dependency can
//! never dangle and, because a dependency must exist before the dependent is
//! built, a dependency cycle can never be expressed.
//!
//! # Example
//!
//! ```
//! use prometheus_task_scheduler::core::Task;
//!
//! let load = Task::new(|| println!("load"));
//! let parse = Task::with_dependencies(|| println!("parse"), [load.clone()]);
//!
//! assert!(!parse.dependencies_completed());
//! assert_eq!(parse.dependencies().len(), 1);
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error};

use super::signal::CompletionSignal;
use crate::util::current_thread_id;

/// Process-unique task identifier, used in diagnostics.
pub type TaskId = u64;

/// Shared handle to a task. Producers, dependents and the scheduler queues
/// all hold clones of the same handle.
pub type TaskHandle = Arc<Task>;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(0);

/// Lifecycle of a task. Transitions only move forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TaskState {
    /// Not started yet. The only state in which a task may be enqueued.
    Waiting = 0,
    /// The body is executing on some thread.
    Running = 1,
    /// The body has returned (or panicked); the completion signal is set.
    Completed = 2,
}

impl TaskState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Waiting,
            1 => Self::Running,
            _ => Self::Completed,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// The work body of a task.
///
/// `execute` consumes the job, so the type system already rules out a second
/// invocation; the scheduler additionally guarantees that only one thread
/// ever gets to take the job out of its task. Any state the job needs must be
/// captured by the implementing type.
///
/// Implemented for every `FnOnce() + Send + 'static` closure:
///
/// ```
/// use prometheus_task_scheduler::core::{Job, Task};
///
/// struct Upload { bytes: Vec<u8> }
///
/// impl Job for Upload {
///     fn execute(self: Box<Self>) {
///         assert!(!self.bytes.is_empty());
///     }
/// }
///
/// let _from_struct = Task::new(Upload { bytes: vec![1, 2, 3] });
/// let _from_closure = Task::new(|| {});
/// ```
pub trait Job: Send + 'static {
    /// Run the work body.
    fn execute(self: Box<Self>);
}

impl<F> Job for F
where
    F: FnOnce() + Send + 'static,
{
    fn execute(self: Box<Self>) {
        (*self)();
    }
}

/// A unit of deferred work with a fixed dependency list.
pub struct Task {
    id: TaskId,
    name: Option<String>,
    dependencies: Vec<TaskHandle>,
    state: AtomicU8,
    /// Set while the task sits in the ready queue or the waiting set.
    queued: AtomicBool,
    panicked: AtomicBool,
    job: Mutex<Option<Box<dyn Job>>>,
    signal: CompletionSignal,
}

impl Task {
    /// Create a task with no dependencies.
    pub fn new<J: Job>(job: J) -> TaskHandle {
        Self::build(None, job, Vec::new())
    }

    /// Create a task that may only run after every task in `dependencies`
    /// has completed.
    pub fn with_dependencies<J, I>(job: J, dependencies: I) -> TaskHandle
    where
        J: Job,
        I: IntoIterator<Item = TaskHandle>,
    {
        Self::build(None, job, dependencies.into_iter().collect())
    }

    /// Like [`Task::with_dependencies`], with a label that shows up in
    /// diagnostics.
    pub fn named<J, I>(name: impl Into<String>, job: J, dependencies: I) -> TaskHandle
    where
        J: Job,
        I: IntoIterator<Item = TaskHandle>,
    {
        Self::build(Some(name.into()), job, dependencies.into_iter().collect())
    }

    fn build<J: Job>(name: Option<String>, job: J, dependencies: Vec<TaskHandle>) -> TaskHandle {
        Arc::new(Self {
            id: NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed),
            name,
            dependencies,
            state: AtomicU8::new(TaskState::Waiting as u8),
            queued: AtomicBool::new(false),
            panicked: AtomicBool::new(false),
            job: Mutex::new(Some(Box::new(job))),
            signal: CompletionSignal::new(),
        })
    }

    /// Process-unique identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Optional label given at construction.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Tasks that must complete before this one may run.
    #[must_use]
    pub fn dependencies(&self) -> &[TaskHandle] {
        &self.dependencies
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Non-blocking check for `state() == Completed`.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.state() == TaskState::Completed
    }

    /// Whether the body panicked. A panicking task still counts as completed.
    #[must_use]
    pub fn panicked(&self) -> bool {
        self.panicked.load(Ordering::Acquire)
    }

    /// True iff every dependency has completed.
    #[must_use]
    pub fn dependencies_completed(&self) -> bool {
        self.dependencies.iter().all(|dep| dep.completed())
    }

    /// Wait at most `timeout` for the task to complete.
    ///
    /// This is a pure wait: it never runs the task on the calling thread and
    /// does not affect the task when the timeout expires. Returns whether the
    /// task had completed by then.
    pub fn await_timeout(&self, timeout: Duration) -> bool {
        if self.completed() {
            return true;
        }
        self.signal.wait_for(timeout)
    }

    /// Block until the task completes, without helper execution.
    pub(crate) fn wait(&self) {
        if !self.completed() {
            self.signal.wait();
        }
    }

    /// Claim queue membership. Returns false if the task is already queued.
    pub(crate) fn mark_queued(&self) -> bool {
        !self.queued.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn clear_queued(&self) {
        self.queued.store(false, Ordering::Release);
    }

    /// Run the body on the calling thread if the task is eligible.
    ///
    /// Eligible means every dependency has completed and this thread wins the
    /// `Waiting -> Running` compare-exchange. Exactly one caller can win, so
    /// concurrent workers and helpers never execute the same body twice.
    /// Returns whether this call executed the task.
    pub(crate) fn try_run(&self) -> bool {
        if !self.dependencies_completed() {
            return false;
        }
        if self
            .state
            .compare_exchange(
                TaskState::Waiting as u8,
                TaskState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return false;
        }

        debug!(
            task_id = self.id,
            task = self.name.as_deref().unwrap_or(""),
            thread = current_thread_id(),
            "Executing task"
        );

        let job = self.job.lock().take();
        if let Some(job) = job {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| job.execute())) {
                self.panicked.store(true, Ordering::Release);
                error!(
                    task_id = self.id,
                    task = self.name.as_deref().unwrap_or(""),
                    panic = %panic_message(payload.as_ref()),
                    "Task body panicked"
                );
            }
        }

        self.state.store(TaskState::Completed as u8, Ordering::Release);
        self.signal.notify();
        true
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state())
            .field(
                "dependencies",
                &self.dependencies.iter().map(|dep| dep.id).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}
