//! Dispatcher and worker implementations

pub mod config;
pub mod dispatcher;
pub mod worker;

pub use config::DispatcherConfig;
pub use dispatcher::{Dispatcher, DispatcherState};
pub use worker::{Outcome, ProcessRecord, Worker, WorkerStats};
