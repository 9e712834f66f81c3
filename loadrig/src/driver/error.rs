//! Run driver errors.

use thiserror::Error;

use crate::executor::ExecutorError;
use crate::results::ResultsError;
use crate::scenario::ScenarioError;
use crate::store::StoreError;

/// Errors raised while configuring or running a benchmark.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No action was requested.
    #[error("nothing to do: pass --load, --query, --monitor, --drop, --list-files or --compare")]
    NothingToDo,

    /// The run configuration is inconsistent.
    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Results(#[from] ResultsError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl DriverError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Returns true for errors raised before anything ran.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::NothingToDo | Self::InvalidConfig(_))
    }
}
