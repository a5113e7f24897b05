//! # Work Dispatcher
//!
//! A work-distribution dispatcher: one unbounded FIFO queue of typed work
//! items, drained by a fixed pool of worker threads, with race-free
//! drain-then-stop shutdown.
//!
//! ## Features
//!
//! - **Single Queue**: Mutex + condition variable FIFO shared by every worker
//! - **Fixed Pool**: Workers start with the dispatcher and live until it stops
//! - **Drain-on-Stop**: Items queued before shutdown are always processed
//! - **Force Stop**: Optionally hand queued items back instead of running them
//! - **Panic Isolation**: A failing or panicking processor never kills a worker
//! - **Processing Records**: One `(worker_id, item_id)` record per processed item
//!
//! ## Quick Start
//!
//! ```rust
//! use work_dispatcher::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let dispatcher = Dispatcher::from_fn(4, |worker_id, item: &WorkItem<String>| {
//!     println!("worker {} handling {}: {}", worker_id, item.id(), item.payload());
//!     Ok(())
//! })?;
//!
//! for i in 0..10 {
//!     dispatcher.submit(WorkItem::new(i, format!("request {}", i)));
//! }
//!
//! // Waits for the queue to drain and joins every worker
//! dispatcher.stop();
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use work_dispatcher::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<()> {
//! let config = DispatcherConfig::new(2)
//!     .with_thread_name_prefix("inference")
//!     .with_record_capture(true);
//!
//! let dispatcher = Dispatcher::with_config(config, SimulatedProcessor::fixed(Duration::from_millis(1)))?;
//! dispatcher.submit(WorkItem::new(7, ()));
//! dispatcher.stop();
//!
//! let records: Vec<ProcessRecord> = dispatcher.records().unwrap().iter().collect();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].item_id, ItemId::new(7));
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Processors
//!
//! ```rust
//! use work_dispatcher::prelude::*;
//!
//! struct Uppercase;
//!
//! impl Processor<String> for Uppercase {
//!     fn process(&self, worker_id: usize, item: &WorkItem<String>) -> Result<()> {
//!         if item.payload().is_empty() {
//!             return Err(DispatchError::processing(item.id(), "empty payload"));
//!         }
//!         println!("[{}] {}", worker_id, item.payload().to_uppercase());
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Uppercase"
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let dispatcher = Dispatcher::new(2, Uppercase)?;
//! dispatcher.submit(WorkItem::new(1, "hello".to_string()));
//! dispatcher.submit(WorkItem::new(2, String::new()));
//! dispatcher.stop();
//!
//! assert_eq!(dispatcher.total_processed(), 1);
//! assert_eq!(dispatcher.total_failed(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod queue;

pub use crate::core::{
    ClosureProcessor, DispatchError, ItemId, Latency, Processor, Result, SimulatedProcessor,
    WorkItem,
};
pub use crate::pool::{
    Dispatcher, DispatcherConfig, DispatcherState, Outcome, ProcessRecord, WorkerStats,
};
pub use crate::queue::{Dequeued, WorkQueue};
