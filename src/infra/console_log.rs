//! Buffered console logger that writes through the scheduler.
//!
//! Producers format and buffer a line, then return immediately; the actual
//! write happens in a flush task on a worker thread. At most one flush task
//! is in flight at a time: a new one is enqueued only when the previous one
//! has completed, and each flush writes every line buffered so far.
//!
//! A line buffered while a flush task is already running may miss that
//! batch; it is picked up by the next flush (triggered by the next log call)
//! or by an explicit [`BufferedLogger::flush`].

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{warn, Level};

use crate::core::{Scheduler, Task, TaskHandle};
use crate::util::current_thread_id;

type LineBuffer = Arc<Mutex<Vec<String>>>;

/// Logger that hands console I/O to the scheduler.
pub struct BufferedLogger<W>
where
    W: Write + Send + 'static,
{
    scheduler: Arc<Scheduler>,
    pending: LineBuffer,
    sink: Arc<Mutex<W>>,
    in_flight: Mutex<Option<TaskHandle>>,
    flushes_scheduled: AtomicU64,
}

impl BufferedLogger<io::Stdout> {
    /// Logger writing to standard output.
    #[must_use]
    pub fn stdout(scheduler: Arc<Scheduler>) -> Self {
        Self::new(scheduler, io::stdout())
    }
}

impl<W> BufferedLogger<W>
where
    W: Write + Send + 'static,
{
    /// Logger writing to `sink`.
    pub fn new(scheduler: Arc<Scheduler>, sink: W) -> Self {
        Self {
            scheduler,
            pending: Arc::new(Mutex::new(Vec::new())),
            sink: Arc::new(Mutex::new(sink)),
            in_flight: Mutex::new(None),
            flushes_scheduled: AtomicU64::new(0),
        }
    }

    /// Buffer one line, tagged with the calling thread's id and `level`, and
    /// make sure a flush task is on its way.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        let line = format!("[T{}] {:<5} {message}", current_thread_id(), level.as_str());
        self.pending.lock().push(line);
        self.schedule_flush();
    }

    fn schedule_flush(&self) {
        let mut in_flight = self.in_flight.lock();
        if in_flight.as_ref().is_some_and(|task| !task.completed()) {
            return;
        }

        let pending = Arc::clone(&self.pending);
        let sink = Arc::clone(&self.sink);
        let task = Task::named(
            "console-flush",
            move || {
                if let Err(e) = write_pending(&pending, &sink) {
                    warn!(error = %e, "Console log flush failed");
                }
            },
            Vec::<TaskHandle>::new(),
        );
        self.scheduler.enqueue(&task);
        self.flushes_scheduled.fetch_add(1, Ordering::Relaxed);
        *in_flight = Some(task);
    }

    /// Wait for the in-flight flush task, then write whatever is still
    /// buffered on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns the sink's I/O error.
    pub fn flush(&self) -> io::Result<()> {
        let in_flight = self.in_flight.lock().clone();
        if let Some(task) = in_flight {
            self.scheduler.await_completed(&task);
        }
        write_pending(&self.pending, &self.sink)
    }

    /// Lines buffered but not written yet.
    #[must_use]
    pub fn pending_lines(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of flush tasks enqueued so far.
    #[must_use]
    pub fn flushes_scheduled(&self) -> u64 {
        self.flushes_scheduled.load(Ordering::Relaxed)
    }

    /// Run `f` with the sink locked.
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut *self.sink.lock())
    }
}

impl<W> Drop for BufferedLogger<W>
where
    W: Write + Send + 'static,
{
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "Console log flush failed on drop");
        }
    }
}

/// Write every buffered line. The sink lock is taken before the buffer is
/// drained so concurrent flushes write their batches in buffer order.
fn write_pending<W: Write>(pending: &LineBuffer, sink: &Mutex<W>) -> io::Result<()> {
    let mut sink = sink.lock();
    let lines = std::mem::take(&mut *pending.lock());
    if lines.is_empty() {
        return Ok(());
    }
    for line in &lines {
        writeln!(sink, "{line}")?;
    }
    sink.flush()
}
