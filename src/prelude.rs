//! Convenient re-exports for common types and traits

pub use crate::core::{
    ClosureProcessor, DispatchError, ItemId, Latency, Processor, Result, SimulatedProcessor,
    WorkItem,
};
pub use crate::pool::{Dispatcher, DispatcherConfig, DispatcherState, ProcessRecord};
