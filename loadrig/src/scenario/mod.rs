//! Scenario and schema files.
//!
//! A scenario describes the data to load into one table and the query sets
//! to run against it. A schema file describes the tables themselves. Both
//! are INI files found in the resource directory.

mod error;
mod parser;
mod resources;
mod types;

pub use error::ScenarioError;
pub use parser::{
    load_scenario, load_schema, parse_query_kind, parse_scenario, parse_schema,
    DEFAULT_BATCH_SIZE, DEFAULT_QUERY_CONCURRENCY, DEFAULT_QUERY_ITERATIONS,
    DEFAULT_WRITER_THREADS,
};
pub use resources::{ResourceKind, ResourceList, SCENARIO_SUFFIX, SCHEMA_SUFFIX};
pub use types::{ExecutionType, QueryDef, QuerySet, Scenario, MAX_ROW_COUNT};
