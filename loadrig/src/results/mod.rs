//! Run results: JSON files per scenario, CSV row exports, and comparisons
//! between labelled runs.

mod compare;
mod error;
mod export;
mod json;

pub use compare::{compare_runs, Comparison, ComparisonRow};
pub use error::ResultsError;
pub use export::{export_rows, read_rows, verify_rows};
pub use json::{
    read_labelled, read_result, result_file_name, write_result, QueryResult, ScenarioResult,
};
