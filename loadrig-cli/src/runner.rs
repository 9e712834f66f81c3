//! CLI runner for common setup and operations.
//!
//! Loads the config file, initializes logging and opens the environment a
//! run drives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::error::CliError;
use loadrig::config::ConfigFile;
use loadrig::driver::{RunConfig, RunDriver, RunSummary, StoreEnvironment};
use loadrig::logging::{default_log_file, init_logging, LoggingGuard};
use loadrig::scenario::ResourceList;
use loadrig::store::MemoryStore;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file to use instead of `~/.loadrig/config.ini`
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| default_log_file().to_string());

        let logging_guard = init_logging(&log_dir, &log_file, true, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a run.
    pub fn log_startup(&self, run: &RunConfig) {
        info!("Loadrig v{}", loadrig::VERSION);
        info!(
            target_name = %run.target,
            load = run.load,
            query = run.query,
            monitor = run.monitor,
            pool_size = run.thread_pool_size,
            "Starting run"
        );
    }

    /// Opens the store for the configured target and runs the benchmark.
    pub async fn run(&self, run: RunConfig) -> Result<RunSummary, CliError> {
        // Rejected configurations must not touch the data directory.
        run.validate()?;

        // Side modes read only resource and result files.
        let env = if run.is_side_mode() {
            StoreEnvironment::new(
                Arc::new(MemoryStore::in_memory()),
                ResourceList::new(&run.resource_dir),
                run.results_dir.clone(),
            )
        } else {
            StoreEnvironment::open(&run).map_err(CliError::Environment)?
        };

        let driver = RunDriver::new(run, Arc::new(env));
        Ok(driver.run().await?)
    }
}

/// Prints what a finished run did.
pub fn print_summary(summary: &RunSummary) {
    for path in &summary.listed_files {
        println!("{}", path.display());
    }

    if let Some(comparison) = &summary.comparison {
        print!("{}", comparison.render());
    }

    for table in &summary.dropped_tables {
        println!("Dropped table {}", table);
    }
    if summary.tables_created > 0 {
        println!("Created {} table(s)", summary.tables_created);
    }

    for report in &summary.reports {
        println!(
            "{:<10} {:<10} {:>8.2}s  {}",
            report.id.to_string(),
            report.status.to_string(),
            report.elapsed.as_secs_f64(),
            report.outcome.summary
        );
    }
}
