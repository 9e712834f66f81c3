//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete user configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Worker pool and monitor settings
    pub runner: RunnerSettings,
    /// Resource, result and data directories
    pub paths: PathSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Runner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Number of worker slots in the shared pool
    pub thread_pool_size: usize,
    /// Interval between monitor samples, in milliseconds
    pub monitor_frequency_ms: u64,
    /// Flush buffered monitor samples every N samples
    pub monitor_flush_every: usize,
}

/// Directory configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSettings {
    /// Directory searched for scenario and schema files
    pub resource_dir: PathBuf,
    /// Directory receiving result, export and monitor files
    pub results_dir: PathBuf,
    /// Directory holding persisted store data, one subdirectory per target
    pub data_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
