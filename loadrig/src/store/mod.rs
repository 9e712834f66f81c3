//! Backing store abstraction.
//!
//! Workloads talk to the data platform under test through [`DataStore`].
//! [`MemoryStore`] is the bundled implementation.

mod error;
mod memory;
mod types;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use types::{
    ColumnDef, ColumnType, QueryKind, QueryRequest, QueryResponse, Row, StoreStats,
    TableSchema, TableStatistics, Value,
};

/// The backing store a run targets.
///
/// Implementations must be safe to call from many pool tasks at once.
pub trait DataStore: Send + Sync {
    /// Creates a table. Returns `false` if an identical table already exists.
    fn create_table(&self, schema: &TableSchema) -> Result<bool, StoreError>;

    /// Drops every table whose full name matches `pattern` (a regex).
    ///
    /// Returns the dropped names, sorted.
    fn drop_tables(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Inserts or replaces rows by key. Returns the number of rows written.
    fn upsert(&self, table: &str, rows: Vec<Row>) -> Result<u64, StoreError>;

    /// Runs a query.
    fn execute(&self, request: &QueryRequest) -> Result<QueryResponse, StoreError>;

    /// Recomputes statistics for a table.
    fn update_statistics(&self, table: &str) -> Result<TableStatistics, StoreError>;

    /// Names of all tables, sorted.
    fn table_names(&self) -> Vec<String>;

    /// Definition of a table, if it exists.
    fn schema(&self, table: &str) -> Option<TableSchema>;

    /// Current counters.
    fn stats(&self) -> StoreStats;

    /// Makes written data durable.
    fn flush(&self) -> Result<(), StoreError>;
}

/// Runs a synchronous store call on tokio's blocking threads, so a slow
/// backend does not stall the pool's workers.
pub async fn run_blocking<T, F>(call: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| StoreError::Blocking(e.to_string()))?
}
