//! Dispatcher configuration

use crate::core::{DispatchError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a [`Dispatcher`](crate::pool::Dispatcher)
///
/// Can be built in code or loaded from JSON; fields missing from the JSON
/// document take their defaults.
///
/// ```rust
/// use work_dispatcher::DispatcherConfig;
///
/// let config = DispatcherConfig::from_json(r#"{ "worker_count": 4 }"#).unwrap();
/// assert_eq!(config.worker_count, 4);
/// assert_eq!(config.thread_name_prefix, "dispatch-worker");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Number of worker threads, must be at least 1
    pub worker_count: usize,
    /// Thread name prefix; workers are named `{prefix}-{id}`
    pub thread_name_prefix: String,
    /// Publish a [`ProcessRecord`](crate::pool::ProcessRecord) for every
    /// processed item on the channel returned by
    /// [`Dispatcher::records`](crate::pool::Dispatcher::records).
    ///
    /// Off by default: records accumulate until read.
    pub capture_records: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            thread_name_prefix: "dispatch-worker".to_string(),
            capture_records: false,
        }
    }
}

impl DispatcherConfig {
    /// Create a new configuration with the given number of workers
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Default::default()
        }
    }

    /// Parse a configuration from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DispatchError::invalid_config("json", e.to_string()))
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Enable or disable the processing record channel
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_record_capture(mut self, enabled: bool) -> Self {
        self.capture_records = enabled;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(DispatchError::invalid_config(
                "worker_count",
                "Number of workers must be greater than 0",
            ));
        }
        Ok(())
    }

    pub(crate) fn thread_name(&self, worker_id: usize) -> String {
        format!("{}-{}", self.thread_name_prefix, worker_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.worker_count, num_cpus::get());
        assert!(!config.capture_records);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let err = DispatcherConfig::new(0).validate().unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidConfig { ref parameter, .. } if parameter == "worker_count"
        ));
    }

    #[test]
    fn test_builder() {
        let config = DispatcherConfig::new(3)
            .with_thread_name_prefix("inference")
            .with_record_capture(true);
        assert_eq!(config.worker_count, 3);
        assert!(config.capture_records);
        assert_eq!(config.thread_name(2), "inference-2");
    }

    #[test]
    fn test_from_json() {
        let config = DispatcherConfig::from_json(
            r#"{ "worker_count": 2, "thread_name_prefix": "gpu", "capture_records": true }"#,
        )
        .unwrap();
        assert_eq!(
            config,
            DispatcherConfig::new(2)
                .with_thread_name_prefix("gpu")
                .with_record_capture(true)
        );

        let err = DispatcherConfig::from_json("{ \"worker_count\": -1 }").unwrap_err();
        assert!(matches!(err, DispatchError::InvalidConfig { .. }));
    }
}
