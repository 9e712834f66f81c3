//! User configuration for loadrig.
//!
//! The config file is INI (`~/.loadrig/config.ini`, or any path passed with
//! `--config`). A missing file yields defaults; a present file overlays only
//! the keys it sets.
//!
//! # Example
//!
//! ```no_run
//! use loadrig::config::ConfigFile;
//!
//! let config = ConfigFile::load().expect("config");
//! println!("pool size: {}", config.runner.thread_pool_size);
//! ```

mod defaults;
mod file;
mod parser;
mod settings;

pub use defaults::{
    default_thread_pool_size, num_cpus, DEFAULT_DATA_DIR, DEFAULT_LOG_FILE,
    DEFAULT_MONITOR_FLUSH_EVERY, DEFAULT_MONITOR_FREQUENCY_MS, DEFAULT_RESOURCE_DIR,
    DEFAULT_RESULTS_DIR, MIN_THREAD_POOL_SIZE,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, LoggingSettings, PathSettings, RunnerSettings};
