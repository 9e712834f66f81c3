//! Executor configuration.
//!
//! This module contains the [`ExecutorConfig`] struct for configuring the
//! workload executor and its worker pool.

use crate::config::{default_thread_pool_size, ConfigFile};

// =============================================================================
// Executor Configuration
// =============================================================================

/// Configuration for the workload executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Number of worker slots in the shared pool.
    ///
    /// Fixed for the lifetime of the executor.
    pub pool_size: usize,
}

impl ExecutorConfig {
    /// Creates a configuration with the given pool size.
    pub fn with_pool_size(pool_size: usize) -> Self {
        Self { pool_size }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            pool_size: default_thread_pool_size(),
        }
    }
}

impl From<&ConfigFile> for ExecutorConfig {
    fn from(config: &ConfigFile) -> Self {
        Self {
            pool_size: config.runner.thread_pool_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_config_default() {
        let config = ExecutorConfig::default();
        assert_eq!(config.pool_size, default_thread_pool_size());
        assert!(config.pool_size > 0);
    }

    #[test]
    fn test_executor_config_from_config_file() {
        let mut file = ConfigFile::default();
        file.runner.thread_pool_size = 7;
        assert_eq!(ExecutorConfig::from(&file).pool_size, 7);
    }
}
