//! The shared work queue.
//!
//! [`WorkQueue`] is an unbounded FIFO guarded by a single mutex. The queued
//! items and the running flag live under that same lock, and a condition
//! variable wakes consumers blocked in [`WorkQueue::pop_blocking`].
//!
//! # Shutdown
//!
//! [`WorkQueue::shutdown`] clears the running flag exactly once and wakes
//! every waiter. Items that were queued before the flag was cleared are
//! still handed out (drain-on-stop); consumers only see
//! [`Dequeued::Stop`] once the queue is both stopped and empty.
//!
//! ```rust
//! use work_dispatcher::queue::{Dequeued, WorkQueue};
//! use work_dispatcher::WorkItem;
//!
//! let queue = WorkQueue::new();
//! queue.push(WorkItem::new(1, "first")).unwrap();
//! queue.shutdown();
//!
//! assert!(matches!(queue.pop_blocking(), Dequeued::Item(item) if item.id().get() == 1));
//! assert!(matches!(queue.pop_blocking(), Dequeued::Stop));
//! ```

use crate::core::WorkItem;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;

/// Outcome of a blocking pop
#[derive(Debug)]
#[must_use]
pub enum Dequeued<P> {
    /// The head of the queue
    Item(WorkItem<P>),
    /// The queue is stopped and empty; the consumer should exit
    Stop,
}

struct QueueState<P> {
    items: VecDeque<WorkItem<P>>,
    running: bool,
}

/// Unbounded, blocking, multi-producer multi-consumer FIFO of work items
pub struct WorkQueue<P> {
    state: Mutex<QueueState<P>>,
    available: Condvar,
}

impl<P> Default for WorkQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for WorkQueue<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("WorkQueue")
            .field("len", &state.items.len())
            .field("running", &state.running)
            .finish()
    }
}

impl<P> WorkQueue<P> {
    /// Creates an empty, running queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                running: true,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends an item at the tail and wakes one waiting consumer.
    ///
    /// Never blocks on capacity. Once the queue has been shut down it is
    /// inert: the item is handed back in `Err` and will never be delivered.
    pub fn push(&self, item: WorkItem<P>) -> Result<(), WorkItem<P>> {
        {
            let mut state = self.state.lock();
            if !state.running {
                return Err(item);
            }
            state.items.push_back(item);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Takes the head item, blocking while the queue is empty and running.
    ///
    /// Queued items are returned even after shutdown; [`Dequeued::Stop`] is
    /// returned only when the queue is stopped and empty.
    pub fn pop_blocking(&self) -> Dequeued<P> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Dequeued::Item(item);
            }
            if !state.running {
                return Dequeued::Stop;
            }
            self.available.wait(&mut state);
        }
    }

    /// Clears the running flag and wakes every waiter.
    ///
    /// Returns `true` for the call that performed the transition and `false`
    /// for every later call.
    pub fn shutdown(&self) -> bool {
        {
            let mut state = self.state.lock();
            if !state.running {
                return false;
            }
            state.running = false;
        }
        self.available.notify_all();
        true
    }

    /// Clears the running flag and removes every queued item.
    ///
    /// The removed items are returned in FIFO order instead of being
    /// delivered. Consumers already holding an item are unaffected.
    pub fn shutdown_now(&self) -> Vec<WorkItem<P>> {
        let discarded = {
            let mut state = self.state.lock();
            state.running = false;
            std::mem::take(&mut state.items)
        };
        self.available.notify_all();
        discarded.into()
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Whether no items are queued
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Whether [`shutdown`](Self::shutdown) has not been called yet
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }
}
