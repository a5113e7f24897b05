//! Dispatcher implementation

use crate::core::{ClosureProcessor, DispatchError, ItemId, Processor, Result, WorkItem};
use crate::pool::config::DispatcherConfig;
use crate::pool::worker::{ProcessRecord, Worker, WorkerContext, WorkerStats};
use crate::queue::WorkQueue;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Lifecycle of a [`Dispatcher`]
///
/// `Running → Stopping → Stopped`; there is no way back to `Running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DispatcherState {
    /// Workers are active and submissions are accepted
    Running = 0,
    /// Shutdown was signalled; workers are draining the queue
    Stopping = 1,
    /// All workers have been joined
    Stopped = 2,
}

impl DispatcherState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => DispatcherState::Running,
            1 => DispatcherState::Stopping,
            _ => DispatcherState::Stopped,
        }
    }
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatcherState::Running => "running",
            DispatcherState::Stopping => "stopping",
            DispatcherState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Owns one [`WorkQueue`] and a fixed set of workers draining it.
///
/// Workers start as soon as the dispatcher is built. Items are handed out
/// in submission order; whichever idle worker wakes first takes the next
/// one.
///
/// # Shutdown
///
/// [`stop`](Self::stop) signals the queue and joins every worker. Items
/// queued before the call are still processed (drain-on-stop). Items
/// submitted after it are dropped without being processed:
/// [`submit`](Self::submit) logs a warning, [`try_submit`](Self::try_submit)
/// returns [`DispatchError::NotAccepting`]. Dropping the dispatcher stops it.
///
/// Called from inside a processor, `stop` and `stop_now` only signal the
/// queue; the workers are joined by the next `stop` from outside the pool.
///
/// ```rust
/// use work_dispatcher::prelude::*;
/// use std::time::Duration;
///
/// # fn main() -> Result<()> {
/// let dispatcher = Dispatcher::new(4, SimulatedProcessor::fixed(Duration::from_millis(1)))?;
/// for i in 0..20 {
///     dispatcher.submit(WorkItem::new(i, "data"));
/// }
/// dispatcher.stop();
/// assert_eq!(dispatcher.total_processed(), 20);
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<P: Send + 'static> {
    config: DispatcherConfig,
    queue: Arc<WorkQueue<P>>,
    workers: Mutex<Vec<Worker>>,
    worker_threads: Vec<ThreadId>,
    live: Arc<AtomicUsize>,
    stop_lock: Mutex<()>,
    stats: Vec<Arc<WorkerStats>>,
    state: AtomicU8,
    records: Option<Receiver<ProcessRecord>>,
    next_id: AtomicU64,
    total_submitted: AtomicU64,
}

impl<P: Send + 'static> fmt::Debug for Dispatcher<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("queue_len", &self.queue.len())
            .field(
                "total_submitted",
                &self.total_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl<P: Send + 'static> Dispatcher<P> {
    /// Create a dispatcher with `worker_count` workers and start them
    pub fn new(worker_count: usize, processor: impl Processor<P> + 'static) -> Result<Self> {
        Self::with_config(DispatcherConfig::new(worker_count), processor)
    }

    /// Create a dispatcher whose processor is a closure
    pub fn from_fn<F>(worker_count: usize, f: F) -> Result<Self>
    where
        F: Fn(usize, &WorkItem<P>) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(worker_count, ClosureProcessor::new(f))
    }

    /// Create a dispatcher from a configuration and start its workers
    ///
    /// # Errors
    ///
    /// - `DispatchError::InvalidConfig` - `worker_count` is 0
    /// - `DispatchError::SpawnError` - a worker thread could not be created;
    ///   the workers already started are stopped and joined first
    pub fn with_config(
        config: DispatcherConfig,
        processor: impl Processor<P> + 'static,
    ) -> Result<Self> {
        Self::build(config, processor, Worker::spawn::<P>)
    }

    fn build<S>(
        config: DispatcherConfig,
        processor: impl Processor<P> + 'static,
        mut spawn: S,
    ) -> Result<Self>
    where
        S: FnMut(usize, String, WorkerContext<P>) -> Result<Worker>,
    {
        config.validate()?;

        let queue = Arc::new(WorkQueue::new());
        let processor: Arc<dyn Processor<P>> = Arc::new(processor);
        let (record_tx, record_rx) = if config.capture_records {
            let (tx, rx) = crossbeam_channel::unbounded();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };
        let live = Arc::new(AtomicUsize::new(0));

        let mut workers = Vec::with_capacity(config.worker_count);
        for id in 0..config.worker_count {
            let ctx = WorkerContext {
                queue: Arc::clone(&queue),
                processor: Arc::clone(&processor),
                records: record_tx.clone(),
                live: Arc::clone(&live),
            };
            match spawn(id, config.thread_name(id), ctx) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    log::error!("dispatcher start aborted: {}", e);
                    queue.shutdown();
                    Self::join_all(workers);
                    return Err(e);
                }
            }
        }

        log::debug!(
            "dispatcher started {} workers using {}",
            config.worker_count,
            processor.name()
        );

        let stats = workers.iter().map(Worker::stats).collect();
        let worker_threads = workers.iter().filter_map(Worker::thread_id).collect();
        Ok(Self {
            config,
            queue,
            workers: Mutex::new(workers),
            worker_threads,
            live,
            stop_lock: Mutex::new(()),
            stats,
            state: AtomicU8::new(DispatcherState::Running as u8),
            records: record_rx,
            next_id: AtomicU64::new(0),
            total_submitted: AtomicU64::new(0),
        })
    }

    /// Queue an item for processing
    ///
    /// Never blocks. After [`stop`](Self::stop) the item is dropped
    /// unprocessed and a warning is logged; use
    /// [`try_submit`](Self::try_submit) to observe that case.
    pub fn submit(&self, item: WorkItem<P>) {
        if let Err(e) = self.try_submit(item) {
            log::warn!("{}", e);
        }
    }

    /// Queue an item, reporting whether it was accepted
    ///
    /// # Errors
    ///
    /// - `DispatchError::NotAccepting` - the dispatcher has been stopped;
    ///   the item is dropped
    pub fn try_submit(&self, item: WorkItem<P>) -> Result<ItemId> {
        let id = item.id();
        self.queue
            .push(item)
            .map_err(|_| DispatchError::not_accepting(id, self.state()))?;
        self.total_submitted.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    /// Queue a payload under a dispatcher-assigned id
    ///
    /// Ids count up from 0 per dispatcher. They are not checked against ids
    /// chosen by callers of [`submit`](Self::submit).
    pub fn submit_payload(&self, payload: P) -> ItemId {
        let id = ItemId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.submit(WorkItem::with_id(id, payload));
        id
    }

    /// Stop accepting items, let the workers drain the queue, and join them
    ///
    /// Blocks until every worker has exited. Idempotent: concurrent or
    /// repeated calls wait for the first one to finish and never join a
    /// worker twice.
    ///
    /// On a worker thread this only signals the queue and returns, leaving
    /// the state at `Stopping`; a worker cannot join itself.
    pub fn stop(&self) {
        if self.on_worker_thread() {
            self.begin_stopping();
            self.queue.shutdown();
            log::debug!("stop requested from a worker thread, workers left to drain");
            return;
        }

        let _serial = self.stop_lock.lock();
        if self.state() == DispatcherState::Stopped {
            return;
        }

        self.begin_stopping();
        self.queue.shutdown();
        log::debug!("dispatcher stopping, {} items left to drain", self.queue.len());

        self.join_workers();
        log::debug!(
            "dispatcher stopped after {} submissions",
            self.total_submitted()
        );
    }

    /// Stop without draining: queued items are removed and returned
    ///
    /// Items a worker has already taken still run to completion. Returns an
    /// empty vector if the dispatcher was already stopped. On a worker
    /// thread the queue is emptied but nothing is joined, as with
    /// [`stop`](Self::stop).
    pub fn stop_now(&self) -> Vec<WorkItem<P>> {
        if self.on_worker_thread() {
            self.begin_stopping();
            return self.discard_queued();
        }

        let _serial = self.stop_lock.lock();
        if self.state() == DispatcherState::Stopped {
            return Vec::new();
        }

        self.begin_stopping();
        let discarded = self.discard_queued();
        self.join_workers();
        discarded
    }

    fn discard_queued(&self) -> Vec<WorkItem<P>> {
        let discarded = self.queue.shutdown_now();
        if !discarded.is_empty() {
            log::warn!("force stop discarded {} queued items", discarded.len());
        }
        discarded
    }

    fn on_worker_thread(&self) -> bool {
        self.worker_threads.contains(&thread::current().id())
    }

    /// Move `Running` to `Stopping`; a later state is left alone
    fn begin_stopping(&self) {
        let _ = self.state.compare_exchange(
            DispatcherState::Running as u8,
            DispatcherState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Join every worker and mark the dispatcher stopped; caller holds `stop_lock`
    fn join_workers(&self) {
        // Short lock: accessors stay usable while the joins block
        let workers = std::mem::take(&mut *self.workers.lock());
        Self::join_all(workers);
        self.set_state(DispatcherState::Stopped);
    }

    fn join_all(workers: Vec<Worker>) {
        for worker in workers {
            let id = worker.id();
            if let Err(e) = worker.join() {
                log::error!("worker {} did not exit cleanly: {}", id, e);
            }
        }
    }

    fn set_state(&self, state: DispatcherState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Current lifecycle state
    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether the dispatcher still accepts items
    pub fn is_running(&self) -> bool {
        self.state() == DispatcherState::Running
    }

    /// Configuration the dispatcher was built with
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Number of workers in the pool
    pub fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Number of worker threads that have not exited yet
    ///
    /// Zero once [`stop`](Self::stop) has returned.
    pub fn active_workers(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Number of items waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Total number of accepted submissions
    pub fn total_submitted(&self) -> u64 {
        self.total_submitted.load(Ordering::Relaxed)
    }

    /// Statistics for all workers, indexed by worker id
    pub fn worker_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.stats.clone()
    }

    /// Total items processed successfully across all workers
    pub fn total_processed(&self) -> u64 {
        self.stats.iter().map(|s| s.get_items_processed()).sum()
    }

    /// Total items that failed or panicked across all workers
    pub fn total_failed(&self) -> u64 {
        self.stats
            .iter()
            .map(|s| s.get_items_failed() + s.get_items_panicked())
            .sum()
    }

    /// Receiver for processing records, if record capture is enabled
    ///
    /// The channel disconnects once every worker has exited, so iterating
    /// it after [`stop`](Self::stop) yields exactly the records produced.
    pub fn records(&self) -> Option<Receiver<ProcessRecord>> {
        self.records.clone()
    }
}

impl<P: Send + 'static> Drop for Dispatcher<P> {
    fn drop(&mut self) {
        self.stop();
    }
}
