//! Result file errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing, reading or comparing result files.
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("result I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed result file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// No result file carries the requested label.
    #[error("no results labelled '{label}' in {dir}")]
    NoResults { label: String, dir: PathBuf },

    /// Diff mode found no earlier export to compare against.
    #[error("no baseline export at {0}")]
    MissingBaseline(PathBuf),

    /// Exported rows differ from the baseline.
    #[error("rows differ from {path}: {reason}")]
    Mismatch { path: PathBuf, reason: String },
}

impl ResultsError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &std::path::Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<ResultsError> for crate::executor::WorkloadError {
    fn from(e: ResultsError) -> Self {
        Self::Io(e.to_string())
    }
}
