//! Scheduler configuration.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Configuration for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run submitted tasks on a background worker pool instead of the
    /// caller's thread
    pub parallel_execution: bool,
    /// Number of workers in the pool
    pub max_workers: NonZeroUsize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parallel_execution: false,
            max_workers: NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl SchedulerConfig {
    /// Create a synchronous configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parallel configuration.
    pub fn parallel() -> Self {
        Self::default().with_parallel_execution(true)
    }

    /// Enable or disable parallel execution.
    pub fn with_parallel_execution(mut self, enabled: bool) -> Self {
        self.parallel_execution = enabled;
        self
    }

    /// Set the number of workers.
    pub fn with_max_workers(mut self, max: NonZeroUsize) -> Self {
        self.max_workers = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_synchronous() {
        let config = SchedulerConfig::default();
        assert!(!config.parallel_execution);
        assert_eq!(config.max_workers.get(), 4);
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::parallel().with_max_workers(NonZeroUsize::new(2).unwrap());
        assert!(config.parallel_execution);
        assert_eq!(config.max_workers.get(), 2);
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"parallel_execution": true}"#).unwrap();
        assert_eq!(config, SchedulerConfig::parallel());
    }
}
