//! Core types and traits for the dispatcher

pub mod error;
pub mod item;
pub mod processor;

pub use error::{DispatchError, Result};
pub use item::{ItemId, WorkItem};
pub use processor::{ClosureProcessor, Latency, Processor, SimulatedProcessor};
