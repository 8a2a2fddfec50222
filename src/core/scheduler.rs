//! Worker pool that executes tasks once their dependencies have completed.
//!
//! # Design
//!
//! - **One lock**: the ready queue, the waiting set and the shutdown flag sit
//!   behind a single `parking_lot::Mutex`; idle workers sleep on the paired
//!   `Condvar`.
//! - **No polling**: workers only wake on enqueue, promotion or shutdown, and
//!   re-check the queue under the lock before sleeping again.
//! - **Exactly-once execution**: workers and helper threads both go through
//!   `Task::try_run`, whose `Waiting -> Running` compare-exchange has a
//!   single winner.
//! - **Helper execution**: [`Scheduler::await_completed`] runs an eligible
//!   task on the calling thread instead of blocking, so waiting never
//!   deadlocks on a saturated or stopped pool.
//!
//! # Example
//!
//! ```
//! use prometheus_task_scheduler::config::SchedulerConfig;
//! use prometheus_task_scheduler::core::{Scheduler, Task};
//!
//! let scheduler = Scheduler::start(SchedulerConfig::new().with_worker_count(2))?;
//!
//! let fetch = Task::new(|| println!("fetch"));
//! let decode = Task::with_dependencies(|| println!("decode"), [fetch.clone()]);
//!
//! // Enqueue order does not matter: decode waits for fetch.
//! scheduler.enqueue(&decode);
//! scheduler.enqueue(&fetch);
//!
//! scheduler.await_completed(&decode);
//! assert!(fetch.completed());
//!
//! scheduler.release_pool();
//! # Ok::<(), prometheus_task_scheduler::core::SchedulerError>(())
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::util::current_thread_id;

use super::error::SchedulerError;
use super::queues::{Placement, Queues};
use super::stats::{SchedulerCounters, SchedulerStats};
use super::task::{TaskHandle, TaskState};

/// Which kind of thread executed a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Runner {
    Worker,
    Helper,
}

/// State shared between the scheduler handle and its worker threads.
struct Shared {
    queues: Mutex<Queues>,
    /// Signaled when the ready queue gains work or on shutdown.
    work_available: Condvar,
    counters: SchedulerCounters,
}

impl Shared {
    /// Try to execute `task` on the calling thread and, if it ran, promote
    /// any dependents that became eligible.
    fn run_task(&self, task: &TaskHandle, runner: Runner) -> bool {
        if !task.try_run() {
            return false;
        }
        match runner {
            Runner::Worker => self.counters.worker_executions.fetch_add(1, Ordering::Relaxed),
            Runner::Helper => self.counters.helper_executions.fetch_add(1, Ordering::Relaxed),
        };
        if task.panicked() {
            self.counters.panicked_tasks.fetch_add(1, Ordering::Relaxed);
        }
        self.update_waiting_tasks();
        true
    }

    /// Dependency resolver pass: promote newly eligible waiting tasks and
    /// wake enough workers to pick them up.
    fn update_waiting_tasks(&self) {
        let promoted = self.queues.lock().promote_ready();
        if promoted == 0 {
            return;
        }
        self.counters
            .promoted_tasks
            .fetch_add(promoted as u64, Ordering::Relaxed);
        if promoted == 1 {
            self.work_available.notify_one();
        } else {
            self.work_available.notify_all();
        }
    }

    /// Dequeue and run the front ready task. Returns false when the ready
    /// queue was empty.
    fn run_next_ready(&self) -> bool {
        let Some(task) = self.queues.lock().pop_ready() else {
            return false;
        };
        // Losing here means a helper thread already took the task.
        self.run_task(&task, Runner::Worker);
        true
    }

    fn worker_loop(&self, worker_id: usize) {
        debug!(worker_id = worker_id, thread = current_thread_id(), "Worker thread started");
        loop {
            if self.run_next_ready() {
                continue;
            }

            let mut queues = self.queues.lock();
            loop {
                if queues.shutdown {
                    drop(queues);
                    debug!(worker_id = worker_id, "Worker thread exiting");
                    return;
                }
                if queues.has_ready() {
                    break;
                }
                self.work_available.wait(&mut queues);
            }
        }
    }
}

/// Dependency-aware thread-pool task scheduler.
///
/// Owns the ready queue, the waiting set and the worker threads. Producers
/// share it by reference (`&Scheduler` or `Arc<Scheduler>`).
///
/// The pool is started with [`create_pool`](Self::create_pool) (or
/// [`Scheduler::start`]) and stopped with
/// [`release_pool`](Self::release_pool); dropping the scheduler releases the
/// pool too. When that happens on a worker thread (a task body held the last
/// `Arc<Scheduler>`), every other worker is joined and the current one exits
/// after its body returns.
///
/// The dependency resolver only scans the waiting set of the scheduler that
/// ran the completed task. A task waiting on one scheduler for a dependency
/// that another scheduler runs is not promoted until its own scheduler
/// completes something else (or a thread calls
/// [`await_completed`](Self::await_completed) on it).
pub struct Scheduler {
    config: SchedulerConfig,
    shared: Arc<Shared>,
    /// Held for the whole of `create_pool` and `release_pool`.
    workers: Mutex<Vec<JoinHandle<()>>>,
    live_workers: AtomicUsize,
}

impl Scheduler {
    /// Create a scheduler without starting any worker threads.
    ///
    /// Tasks may already be enqueued and awaited; with no workers they only
    /// run through helper execution.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        Ok(Self {
            config,
            shared: Arc::new(Shared {
                queues: Mutex::new(Queues::new()),
                work_available: Condvar::new(),
                counters: SchedulerCounters::default(),
            }),
            workers: Mutex::new(Vec::new()),
            live_workers: AtomicUsize::new(0),
        })
    }

    /// Create a scheduler and start its worker pool.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` for an invalid configuration
    /// and `SchedulerError::Spawn` if a worker thread cannot be started.
    pub fn start(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let scheduler = Self::new(config)?;
        scheduler.create_pool()?;
        Ok(scheduler)
    }

    /// Configuration this scheduler was built with.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Start the worker threads. No-op if they are already running.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Spawn` if the OS refuses a thread; workers
    /// started before the failure are shut down again.
    pub fn create_pool(&self) -> Result<(), SchedulerError> {
        let mut workers = self.workers.lock();
        if !workers.is_empty() {
            debug!("Worker pool already running");
            return Ok(());
        }

        self.shared.queues.lock().shutdown = false;

        let worker_count = self.config.resolved_worker_count();
        workers.reserve(worker_count);
        for worker_id in 0..worker_count {
            match self.spawn_worker(worker_id) {
                Ok(handle) => workers.push(handle),
                Err(source) => {
                    // Queued tasks stay put; they run on a later create_pool.
                    let started = std::mem::take(&mut *workers);
                    self.join_workers(started);
                    return Err(SchedulerError::Spawn { worker_id, source });
                }
            }
        }
        self.live_workers.store(worker_count, Ordering::Release);

        info!(
            worker_count = worker_count,
            prefix = %self.config.thread_name_prefix,
            "Task scheduler worker pool started"
        );
        Ok(())
    }

    fn spawn_worker(&self, worker_id: usize) -> std::io::Result<JoinHandle<()>> {
        let mut builder =
            thread::Builder::new().name(format!("{}-{worker_id}", self.config.thread_name_prefix));
        if let Some(stack_size) = self.config.thread_stack_size {
            builder = builder.stack_size(stack_size);
        }
        let shared = Arc::clone(&self.shared);
        builder.spawn(move || shared.worker_loop(worker_id))
    }

    /// Stop the worker threads: set the shutdown flag, wake every worker and
    /// join them. Tasks still queued are dropped from the queues without
    /// running; their state stays `Waiting`. No-op if no workers are running.
    pub fn release_pool(&self) {
        let mut workers = self.workers.lock();
        if workers.is_empty() {
            return;
        }
        let worker_count = workers.len();
        info!(worker_count = worker_count, "Shutting down task scheduler worker pool");
        self.join_workers(std::mem::take(&mut *workers));

        let dropped = self.shared.queues.lock().clear();
        if dropped > 0 {
            warn!(dropped = dropped, "Discarded queued tasks at shutdown");
        }
        info!(worker_count = worker_count, "Task scheduler worker pool shut down");
    }

    /// Set the shutdown flag, wake every worker and join them.
    ///
    /// When the calling thread is itself one of the workers (the last
    /// `Arc<Scheduler>` was dropped inside a task body) its own handle is
    /// detached instead; that worker exits on its own once the body returns.
    fn join_workers(&self, workers: Vec<JoinHandle<()>>) {
        self.shared.queues.lock().shutdown = true;
        self.shared.work_available.notify_all();

        let current = thread::current().id();
        for (worker_id, worker) in workers.into_iter().enumerate() {
            if worker.thread().id() == current {
                warn!(worker_id = worker_id, "Pool released from its own worker thread; not joining it");
                continue;
            }
            if worker.join().is_err() {
                warn!(worker_id = worker_id, "Worker panicked");
            }
        }

        self.live_workers.store(0, Ordering::Release);
    }

    /// Whether worker threads are currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker_count() > 0
    }

    /// Number of live worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.live_workers.load(Ordering::Acquire)
    }

    /// Submit a task.
    ///
    /// The task goes to the ready queue if its dependencies have all
    /// completed (waking one idle worker), otherwise to the waiting set.
    /// Submitting a task that is running, completed or already queued is
    /// ignored with a warning.
    pub fn enqueue(&self, task: &TaskHandle) {
        let state = task.state();
        if state != TaskState::Waiting {
            self.shared
                .counters
                .rejected_submissions
                .fetch_add(1, Ordering::Relaxed);
            warn!(task_id = task.id(), state = %state, "Ignoring enqueue of a task that is not waiting");
            return;
        }
        if !task.mark_queued() {
            self.shared
                .counters
                .rejected_submissions
                .fetch_add(1, Ordering::Relaxed);
            warn!(task_id = task.id(), "Ignoring enqueue of a task that is already queued");
            return;
        }

        let placement = self.shared.queues.lock().admit(Arc::clone(task));
        self.shared
            .counters
            .submitted_tasks
            .fetch_add(1, Ordering::Relaxed);
        debug!(task_id = task.id(), placement = ?placement, "Task enqueued");

        if placement == Placement::Ready {
            self.shared.work_available.notify_one();
        }
    }

    /// Block until `task` has completed.
    ///
    /// If the task's dependencies have completed and no thread has claimed it
    /// yet, the calling thread runs it directly and returns without blocking.
    /// Otherwise this waits for whichever thread is running it.
    ///
    /// A task whose dependencies never complete (for example, a dependency
    /// that is never enqueued) blocks this call forever; use
    /// [`Task::await_timeout`](super::Task::await_timeout) to bound the wait.
    pub fn await_completed(&self, task: &TaskHandle) {
        if task.completed() {
            return;
        }
        if self.shared.run_task(task, Runner::Helper) {
            debug!(task_id = task.id(), thread = current_thread_id(), "Task run by waiting thread");
            return;
        }
        task.wait();
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let (ready, waiting) = {
            let queues = self.shared.queues.lock();
            (queues.ready_len(), queues.waiting_len())
        };
        self.shared
            .counters
            .snapshot(self.worker_count(), ready, waiting)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.release_pool();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("worker_count", &self.worker_count())
            .finish_non_exhaustive()
    }
}
