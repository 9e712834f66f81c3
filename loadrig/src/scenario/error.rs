//! Scenario and schema file errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating or parsing scenario and schema files.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The file could not be read as INI.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// A required key is missing.
    #[error("{path}: [{section}] is missing '{key}'")]
    MissingKey {
        path: PathBuf,
        section: String,
        key: String,
    },

    /// A key has an unusable value.
    #[error("{path}: [{section}] {key} = '{value}' - {reason}")]
    InvalidValue {
        path: PathBuf,
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// The resource directory could not be listed.
    #[error("cannot list resource directory {path}: {source}")]
    ResourceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The selector is not a valid regular expression.
    #[error("invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// No resource file matched the selector.
    #[error("no {kind} file matches '{pattern}'")]
    NoMatch { kind: &'static str, pattern: String },
}
