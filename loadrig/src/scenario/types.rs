//! Scenario data types.

use crate::store::{QueryKind, QueryRequest};
use std::fmt;
use std::path::PathBuf;

/// How the queries of a query set are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionType {
    /// One query after another, on the query workload's own slot.
    #[default]
    Serial,
    /// Fanned out on the shared pool, up to the set's concurrency.
    Parallel,
}

impl std::str::FromStr for ExecutionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serial" => Ok(Self::Serial),
            "parallel" => Ok(Self::Parallel),
            other => Err(format!("unknown execution type '{}'", other)),
        }
    }
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "serial"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

/// One query of a query set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryDef {
    pub id: String,
    pub table: String,
    pub kind: QueryKind,
}

impl QueryDef {
    /// Builds the store request, applying the run's hint.
    pub fn request(&self, hint: Option<&str>) -> QueryRequest {
        QueryRequest::new(&self.table, self.kind.clone()).with_hint(hint.map(str::to_string))
    }
}

/// A named group of queries run together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuerySet {
    pub name: String,
    pub execution: ExecutionType,
    /// Maximum queries in flight for parallel sets.
    pub concurrency: usize,
    /// Number of times the whole set is run.
    pub iterations: usize,
    pub queries: Vec<QueryDef>,
}

/// Largest row count a scenario may load. Row keys are signed 64-bit.
pub const MAX_ROW_COUNT: u64 = i64::MAX as u64;

/// Data model and query sets read from one `*.scenario.ini` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub source: PathBuf,
    pub table: String,
    pub row_count: u64,
    pub batch_size: usize,
    /// Maximum batches in flight during load.
    pub writer_threads: usize,
    pub query_sets: Vec<QuerySet>,
}

impl Scenario {
    /// Row count after applying an optional override.
    pub fn effective_row_count(&self, row_count_override: Option<u64>) -> u64 {
        row_count_override.unwrap_or(self.row_count)
    }
}
