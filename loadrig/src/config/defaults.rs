//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants, CPU-aware helper functions,
//! and the `ConfigFile::default()` implementation.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;

// =============================================================================
// CPU helpers
// =============================================================================

/// Get the number of available CPU cores.
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Default worker pool size: num_cpus, never below [`MIN_THREAD_POOL_SIZE`].
pub fn default_thread_pool_size() -> usize {
    num_cpus().max(MIN_THREAD_POOL_SIZE)
}

// =============================================================================
// Runner
// =============================================================================

/// Smallest pool that can host a monitor, an active workload and one
/// fan-out task at the same time.
pub const MIN_THREAD_POOL_SIZE: usize = 3;

/// Default interval between monitor samples.
pub const DEFAULT_MONITOR_FREQUENCY_MS: u64 = 1_000;

/// Default number of samples buffered before the monitor flushes.
pub const DEFAULT_MONITOR_FLUSH_EVERY: usize = 10;

// =============================================================================
// Paths
// =============================================================================

/// Default resource directory name, relative to the working directory.
pub const DEFAULT_RESOURCE_DIR: &str = "resources";

/// Default results directory name, relative to the working directory.
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Default data directory name under the config directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default log file name under the config directory.
pub const DEFAULT_LOG_FILE: &str = "loadrig.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();

        Self {
            runner: RunnerSettings {
                thread_pool_size: default_thread_pool_size(),
                monitor_frequency_ms: DEFAULT_MONITOR_FREQUENCY_MS,
                monitor_flush_every: DEFAULT_MONITOR_FLUSH_EVERY,
            },
            paths: PathSettings {
                resource_dir: PathBuf::from(DEFAULT_RESOURCE_DIR),
                results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
                data_dir: config_dir.join(DEFAULT_DATA_DIR),
            },
            logging: LoggingSettings {
                file: config_dir.join(DEFAULT_LOG_FILE),
            },
        }
    }
}
