//! Store error types.

use thiserror::Error;

/// Errors raised by a [`DataStore`](super::DataStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The named table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// A table definition or row does not fit the schema.
    #[error("schema error for table {table}: {reason}")]
    Schema { table: String, reason: String },

    /// The drop pattern is not a valid regular expression.
    #[error("invalid table pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Reading or writing persisted data failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be (de)serialized.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A store call on a blocking thread panicked or was cancelled.
    #[error("blocking store call failed: {0}")]
    Blocking(String),
}

impl StoreError {
    pub(crate) fn schema(table: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for crate::executor::WorkloadError {
    fn from(e: StoreError) -> Self {
        Self::Store(e.to_string())
    }
}
