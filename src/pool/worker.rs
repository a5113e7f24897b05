//! Worker thread implementation

use crate::core::{DispatchError, ItemId, Processor, Result, WorkItem};
use crate::queue::{Dequeued, WorkQueue};
use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{span, Level};

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of items processed successfully
    pub items_processed: AtomicU64,
    /// Total number of items whose processing returned an error
    pub items_failed: AtomicU64,
    /// Total number of items whose processing panicked
    pub items_panicked: AtomicU64,
    /// Total time spent processing items (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total items processed successfully
    pub fn get_items_processed(&self) -> u64 {
        self.items_processed.load(Ordering::Relaxed)
    }

    /// Get total items failed
    pub fn get_items_failed(&self) -> u64 {
        self.items_failed.load(Ordering::Relaxed)
    }

    /// Get total items panicked
    pub fn get_items_panicked(&self) -> u64 {
        self.items_panicked.load(Ordering::Relaxed)
    }

    /// Get average processing time per handled item in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_items_processed() + self.get_items_failed() + self.get_items_panicked();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    fn record(&self, outcome: &Outcome, elapsed: Duration) {
        let counter = match outcome {
            Outcome::Completed => &self.items_processed,
            Outcome::Failed(_) => &self.items_failed,
            Outcome::Panicked(_) => &self.items_panicked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total_processing_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }
}

/// How processing of one item ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum Outcome {
    /// The processor returned `Ok`
    Completed,
    /// The processor returned an error; the item was dropped
    Failed(String),
    /// The processor panicked; the item was dropped
    Panicked(String),
}

impl Outcome {
    /// Whether the item was processed successfully
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

/// One entry per processed item, emitted in the order processing finished
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Worker that handled the item
    pub worker_id: usize,
    /// Item that was handled
    pub item_id: ItemId,
    /// How processing ended
    pub outcome: Outcome,
    /// Time spent in the processor
    pub elapsed: Duration,
    /// Wall-clock completion time
    pub finished_at: DateTime<Utc>,
}

/// Everything a worker thread needs, moved into the thread at spawn time
pub(crate) struct WorkerContext<P> {
    pub(crate) queue: Arc<WorkQueue<P>>,
    pub(crate) processor: Arc<dyn Processor<P>>,
    pub(crate) records: Option<Sender<ProcessRecord>>,
    /// Number of worker threads that have not left their loop yet
    pub(crate) live: Arc<AtomicUsize>,
}

/// Decrements the live-worker count when the loop exits, including by unwinding
struct LiveGuard<'a>(&'a AtomicUsize);

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A worker thread that takes items from the shared queue
#[derive(Debug)]
pub struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a worker bound to `ctx.queue`.
    ///
    /// The worker exits once the queue is shut down and empty, so every
    /// item queued before shutdown is processed before `join` returns.
    pub(crate) fn spawn<P: Send + 'static>(
        id: usize,
        thread_name: String,
        ctx: WorkerContext<P>,
    ) -> Result<Self> {
        let stats = Arc::new(WorkerStats::new());
        let stats_clone = Arc::clone(&stats);
        let live = Arc::clone(&ctx.live);

        // Counted before the thread starts so the count never lags a running worker
        live.fetch_add(1, Ordering::AcqRel);
        let thread = thread::Builder::new()
            .name(thread_name)
            .spawn(move || Self::run(id, ctx, &stats_clone))
            .map_err(|e| {
                live.fetch_sub(1, Ordering::AcqRel);
                DispatchError::spawn_with_source(id, e.to_string(), e)
            })?;

        Ok(Self {
            id,
            thread: Some(thread),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Id of the worker's OS thread, until it has been joined
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.thread.as_ref().map(|t| t.thread().id())
    }

    /// Whether the worker thread is still alive
    pub fn is_active(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Join the worker thread
    pub fn join(mut self) -> Result<()> {
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|panic| DispatchError::join(self.id, panic_message(&*panic)))?;
        }
        Ok(())
    }

    fn run<P>(id: usize, ctx: WorkerContext<P>, stats: &WorkerStats) {
        let _live = LiveGuard(&ctx.live);

        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        log::debug!("worker {} started", id);

        loop {
            match ctx.queue.pop_blocking() {
                Dequeued::Item(item) => {
                    let record = Self::process_item(id, &item, ctx.processor.as_ref(), stats);
                    if let Some(records) = &ctx.records {
                        // The receiver may have been dropped by the caller
                        let _ = records.send(record);
                    }
                }
                Dequeued::Stop => {
                    log::debug!(
                        "worker {} stopping: {} processed, {} failed, {} panicked",
                        id,
                        stats.get_items_processed(),
                        stats.get_items_failed(),
                        stats.get_items_panicked()
                    );
                    break;
                }
            }
        }
    }

    /// Run the processor on one item with panic protection
    fn process_item<P>(
        id: usize,
        item: &WorkItem<P>,
        processor: &dyn Processor<P>,
        stats: &WorkerStats,
    ) -> ProcessRecord {
        #[cfg(feature = "tracing")]
        let item_span = span!(Level::DEBUG, "process_item", item_id = item.id().get());
        #[cfg(feature = "tracing")]
        let _item_guard = item_span.enter();

        let start = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(|| processor.process(id, item)));
        let elapsed = start.elapsed();

        let outcome = match result {
            Ok(Ok(())) => {
                log::info!("[Worker {}] Processed item {}", id, item.id());
                Outcome::Completed
            }
            Ok(Err(e)) => {
                log::warn!(
                    "[Worker {}] Processing of item {} by {} failed: {}",
                    id,
                    item.id(),
                    processor.name(),
                    e
                );
                Outcome::Failed(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                let err = DispatchError::worker_panic(id, message.clone());
                log::error!("[Worker {}] Item {} dropped: {}", id, item.id(), err);
                Outcome::Panicked(message)
            }
        };

        stats.record(&outcome, elapsed);

        ProcessRecord {
            worker_id: id,
            item_id: item.id(),
            outcome,
            elapsed,
            finished_at: Utc::now(),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.is_finished() {
                if let Err(panic) = thread.join() {
                    log::error!(
                        "worker {} panicked before it was joined: {}",
                        self.id,
                        panic_message(&*panic)
                    );
                }
            } else {
                log::warn!(
                    "worker {} dropped while still running; its thread is detached",
                    self.id
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
