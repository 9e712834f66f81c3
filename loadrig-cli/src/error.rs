//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use loadrig::config::ConfigFileError;
use loadrig::driver::DriverError;

/// Exit code for usage and configuration errors.
pub const EXIT_USAGE: i32 = 1;

/// Exit code for failures during a run.
pub const EXIT_RUN: i32 = 2;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Config file could not be read
    Config(ConfigFileError),
    /// Data store or resource setup failed
    Environment(DriverError),
    /// The run was rejected or failed
    Run(DriverError),
}

impl CliError {
    /// Exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::LoggingInit(_) | CliError::Config(_) => EXIT_USAGE,
            CliError::Environment(_) => EXIT_RUN,
            CliError::Run(e) if e.is_usage() => EXIT_USAGE,
            CliError::Run(_) => EXIT_RUN,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Run(DriverError::NothingToDo) => {
                eprintln!();
                eprintln!("Run 'loadrig --help' for the available options.");
            }
            CliError::Run(DriverError::Scenario(_)) => {
                eprintln!();
                eprintln!("Run 'loadrig --list-files' to see the available scenario and schema files.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Environment(e) => write!(f, "Failed to open data store: {}", e),
            CliError::Run(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Environment(e) | CliError::Run(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<DriverError> for CliError {
    fn from(e: DriverError) -> Self {
        CliError::Run(e)
    }
}
