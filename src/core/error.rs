//! Error types for the dispatcher

use crate::core::item::ItemId;
use crate::pool::DispatcherState;

/// Result type for dispatcher operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors that can occur in the dispatcher
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{worker_id}: {message}")]
    SpawnError {
        /// ID of the worker that failed to spawn
        worker_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{worker_id}: {message}")]
    JoinError {
        /// ID of the worker that failed to join
        worker_id: usize,
        /// Error message
        message: String,
    },

    /// A processor reported failure for an item
    #[error("Processing failed (item_id: {item_id}): {message}")]
    ProcessingFailed {
        /// ID of the failed item
        item_id: ItemId,
        /// Error message
        message: String,
    },

    /// A processor panicked while a worker was running it
    #[error("Worker #{worker_id} caught a processor panic: {message}")]
    WorkerPanic {
        /// ID of the worker
        worker_id: usize,
        /// Panic message
        message: String,
    },

    /// The dispatcher no longer accepts items
    #[error("Dispatcher is {state}, item {item_id} was not accepted")]
    NotAccepting {
        /// ID of the rejected item
        item_id: ItemId,
        /// Lifecycle state at the time of the submission
        state: DispatcherState,
    },
}

impl DispatchError {
    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        worker_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        DispatchError::SpawnError {
            worker_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(worker_id: usize, message: impl Into<String>) -> Self {
        DispatchError::JoinError {
            worker_id,
            message: message.into(),
        }
    }

    /// Create a processing failure
    pub fn processing(item_id: ItemId, message: impl Into<String>) -> Self {
        DispatchError::ProcessingFailed {
            item_id,
            message: message.into(),
        }
    }

    /// Create a worker panic error
    pub fn worker_panic(worker_id: usize, message: impl Into<String>) -> Self {
        DispatchError::WorkerPanic {
            worker_id,
            message: message.into(),
        }
    }

    /// Create a not accepting error
    pub fn not_accepting(item_id: ItemId, state: DispatcherState) -> Self {
        DispatchError::NotAccepting { item_id, state }
    }
}
