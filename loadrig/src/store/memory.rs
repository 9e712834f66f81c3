//! In-memory [`DataStore`] with optional JSON persistence.
//!
//! Tables live in a `DashMap` so concurrent batch writers and query tasks
//! only contend per table. When opened against a data directory, each table
//! is persisted as `<data_dir>/<target>/<TABLE>.json` on `flush`, which lets
//! a load run and a later query run see the same data.

use super::error::StoreError;
use super::types::{
    ColumnType, QueryKind, QueryRequest, QueryResponse, Row, StoreStats, TableSchema,
    TableStatistics, Value,
};
use super::DataStore;
use chrono::Utc;
use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace};

const TABLE_FILE_EXTENSION: &str = "json";

/// Rows and metadata of one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableData {
    schema: TableSchema,
    rows: BTreeMap<i64, Row>,
    statistics: Option<TableStatistics>,
}

impl TableData {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            statistics: None,
        }
    }

    /// Validates a row against the schema and returns its key.
    fn check_row(&self, row: &Row) -> Result<i64, StoreError> {
        let table = &self.schema.name;
        if row.len() != self.schema.columns.len() {
            return Err(StoreError::schema(
                table,
                format!(
                    "row has {} values, table has {} columns",
                    row.len(),
                    self.schema.columns.len()
                ),
            ));
        }

        for (value, column) in row.iter().zip(&self.schema.columns) {
            let ok = matches!(
                (column.ty, value),
                (ColumnType::Key, Value::Int(_))
                    | (ColumnType::Int, Value::Int(_) | Value::Null)
                    | (ColumnType::Text, Value::Text(_) | Value::Null)
            );
            if !ok {
                return Err(StoreError::schema(
                    table,
                    format!("value {:?} does not fit column {} ({})", value, column.name, column.ty),
                ));
            }
        }

        row.first()
            .and_then(Value::as_int)
            .ok_or_else(|| StoreError::schema(table, "missing key value"))
    }
}

/// Concurrent in-memory store.
pub struct MemoryStore {
    tables: DashMap<String, TableData>,
    persist_dir: Option<PathBuf>,
    rows_upserted: AtomicU64,
    queries_executed: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            tables: DashMap::new(),
            persist_dir: None,
            rows_upserted: AtomicU64::new(0),
            queries_executed: AtomicU64::new(0),
        }
    }

    /// Opens the store for `target`, loading any tables persisted earlier.
    pub fn open(data_dir: &Path, target: &str) -> Result<Self, StoreError> {
        let dir = data_dir.join(target_dir_name(target));
        let store = Self {
            persist_dir: Some(dir.clone()),
            ..Self::in_memory()
        };

        if dir.is_dir() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(TABLE_FILE_EXTENSION) {
                    continue;
                }
                let data: TableData = serde_json::from_slice(&fs::read(&path)?)?;
                trace!(table = %data.schema.name, rows = data.rows.len(), "Loaded persisted table");
                store.tables.insert(data.schema.name.clone(), data);
            }
        }

        info!(
            connection = target,
            dir = %dir.display(),
            tables = store.tables.len(),
            "Store opened"
        );
        Ok(store)
    }

    /// Directory the store persists to, if any.
    pub fn persist_dir(&self) -> Option<&Path> {
        self.persist_dir.as_deref()
    }

    fn table_path(&self, table: &str) -> Option<PathBuf> {
        self.persist_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.{}", table, TABLE_FILE_EXTENSION)))
    }
}

impl DataStore for MemoryStore {
    fn create_table(&self, schema: &TableSchema) -> Result<bool, StoreError> {
        schema
            .validate()
            .map_err(|reason| StoreError::schema(&schema.name, reason))?;

        match self.tables.entry(schema.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                if existing.get().schema != *schema {
                    return Err(StoreError::schema(
                        &schema.name,
                        "table exists with a different definition",
                    ));
                }
                Ok(false)
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(TableData::new(schema.clone()));
                debug!(table = %schema.name, columns = schema.columns.len(), "Table created");
                Ok(true)
            }
        }
    }

    fn drop_tables(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        let mut matched: Vec<String> = self
            .tables
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|name| regex.is_match(name))
            .collect();
        matched.sort();

        for name in &matched {
            self.tables.remove(name);
            if let Some(path) = self.table_path(name) {
                if path.exists() {
                    fs::remove_file(&path)?;
                }
            }
            info!(table = %name, "Table dropped");
        }

        Ok(matched)
    }

    fn upsert(&self, table: &str, rows: Vec<Row>) -> Result<u64, StoreError> {
        let mut data = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        // Validate the whole batch first so a bad row leaves the table untouched.
        let keys = rows
            .iter()
            .map(|row| data.check_row(row))
            .collect::<Result<Vec<_>, _>>()?;

        let count = rows.len() as u64;
        for (key, row) in keys.into_iter().zip(rows) {
            data.rows.insert(key, row);
        }
        self.rows_upserted.fetch_add(count, Ordering::Relaxed);
        Ok(count)
    }

    fn execute(&self, request: &QueryRequest) -> Result<QueryResponse, StoreError> {
        let data = self
            .tables
            .get(&request.table)
            .ok_or_else(|| StoreError::TableNotFound(request.table.clone()))?;

        if let Some(hint) = &request.hint {
            trace!(table = %request.table, hint = %hint, "Query hint");
        }

        let response = match &request.kind {
            QueryKind::Count => QueryResponse {
                rows: vec![vec![Value::Int(data.rows.len() as i64)]],
                rows_examined: data.rows.len() as u64,
            },
            QueryKind::Lookup { key } => {
                let rows: Vec<Row> = data.rows.get(key).cloned().into_iter().collect();
                QueryResponse {
                    rows_examined: rows.len() as u64,
                    rows,
                }
            }
            QueryKind::Scan { limit } => {
                let rows: Vec<Row> = data
                    .rows
                    .values()
                    .take(limit.unwrap_or(usize::MAX))
                    .cloned()
                    .collect();
                QueryResponse {
                    rows_examined: rows.len() as u64,
                    rows,
                }
            }
        };

        self.queries_executed.fetch_add(1, Ordering::Relaxed);
        Ok(response)
    }

    fn update_statistics(&self, table: &str) -> Result<TableStatistics, StoreError> {
        let mut data = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        let stats = TableStatistics {
            row_count: data.rows.len() as u64,
            min_key: data.rows.keys().next().copied(),
            max_key: data.rows.keys().next_back().copied(),
            updated_at: Utc::now(),
        };
        data.statistics = Some(stats.clone());
        info!(table = table, rows = stats.row_count, "Statistics updated");
        Ok(stats)
    }

    fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn schema(&self, table: &str) -> Option<TableSchema> {
        self.tables.get(table).map(|data| data.schema.clone())
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            tables: self.tables.len(),
            total_rows: self.tables.iter().map(|e| e.rows.len() as u64).sum(),
            rows_upserted: self.rows_upserted.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
        }
    }

    fn flush(&self) -> Result<(), StoreError> {
        let Some(dir) = &self.persist_dir else {
            return Ok(());
        };
        fs::create_dir_all(dir)?;

        for entry in self.tables.iter() {
            let path = dir.join(format!("{}.{}", entry.key(), TABLE_FILE_EXTENSION));
            fs::write(&path, serde_json::to_vec(entry.value())?)?;
        }
        debug!(dir = %dir.display(), tables = self.tables.len(), "Store flushed");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("tables", &self.tables.len())
            .field("persist_dir", &self.persist_dir)
            .finish()
    }
}

/// Maps a connection target to a directory name.
fn target_dir_name(target: &str) -> String {
    target
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ColumnDef, ColumnType};
    use tempfile::TempDir;

    fn orders() -> TableSchema {
        TableSchema::new(
            "ORDERS",
            vec![
                ColumnDef::new("id", ColumnType::Key),
                ColumnDef::new("customer", ColumnType::Text),
                ColumnDef::new("amount", ColumnType::Int),
            ],
        )
    }

    fn row(id: i64) -> Row {
        vec![
            Value::Int(id),
            Value::Text(format!("c{}", id)),
            Value::Int(id * 10),
        ]
    }

    #[test]
    fn test_create_table_is_idempotent() {
        let store = MemoryStore::in_memory();
        assert!(store.create_table(&orders()).unwrap());
        assert!(!store.create_table(&orders()).unwrap());

        let mut other = orders();
        other.columns.pop();
        assert!(matches!(
            store.create_table(&other),
            Err(StoreError::Schema { .. })
        ));
    }

    #[test]
    fn test_upsert_and_query() {
        let store = MemoryStore::in_memory();
        store.create_table(&orders()).unwrap();
        assert_eq!(store.upsert("ORDERS", (0..5).map(row).collect()).unwrap(), 5);
        // Upsert replaces by key
        store.upsert("ORDERS", vec![row(2)]).unwrap();

        let count = store
            .execute(&QueryRequest::new("ORDERS", QueryKind::Count))
            .unwrap();
        assert_eq!(count.rows, vec![vec![Value::Int(5)]]);

        let lookup = store
            .execute(&QueryRequest::new("ORDERS", QueryKind::Lookup { key: 3 }))
            .unwrap();
        assert_eq!(lookup.rows, vec![row(3)]);

        let scan = store
            .execute(&QueryRequest::new("ORDERS", QueryKind::Scan { limit: Some(2) }))
            .unwrap();
        assert_eq!(scan.rows, vec![row(0), row(1)]);

        let stats = store.stats();
        assert_eq!(stats.total_rows, 5);
        assert_eq!(stats.rows_upserted, 6);
        assert_eq!(stats.queries_executed, 3);
    }

    #[test]
    fn test_bad_row_rejects_whole_batch() {
        let store = MemoryStore::in_memory();
        store.create_table(&orders()).unwrap();

        let bad = vec![row(1), vec![Value::Text("x".into()), Value::Null, Value::Null]];
        assert!(store.upsert("ORDERS", bad).is_err());
        assert_eq!(store.stats().total_rows, 0);
    }

    #[test]
    fn test_unknown_table() {
        let store = MemoryStore::in_memory();
        assert!(matches!(
            store.upsert("NOPE", vec![]),
            Err(StoreError::TableNotFound(_))
        ));
        assert!(matches!(
            store.execute(&QueryRequest::new("NOPE", QueryKind::Count)),
            Err(StoreError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_drop_tables_by_pattern() {
        let store = MemoryStore::in_memory();
        for name in ["ORDERS", "ORDERS_ARCHIVE", "CUSTOMERS"] {
            let mut schema = orders();
            schema.name = name.to_string();
            store.create_table(&schema).unwrap();
        }

        let dropped = store.drop_tables("ORDERS.*").unwrap();
        assert_eq!(dropped, vec!["ORDERS", "ORDERS_ARCHIVE"]);
        assert_eq!(store.table_names(), vec!["CUSTOMERS"]);

        assert!(matches!(
            store.drop_tables("("),
            Err(StoreError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_update_statistics() {
        let store = MemoryStore::in_memory();
        store.create_table(&orders()).unwrap();
        store.upsert("ORDERS", (3..8).map(row).collect()).unwrap();

        let stats = store.update_statistics("ORDERS").unwrap();
        assert_eq!(stats.row_count, 5);
        assert_eq!(stats.min_key, Some(3));
        assert_eq!(stats.max_key, Some(7));
    }

    #[test]
    fn test_persistence_across_opens() {
        let temp = TempDir::new().unwrap();

        {
            let store = MemoryStore::open(temp.path(), "localhost:2181").unwrap();
            store.create_table(&orders()).unwrap();
            store.upsert("ORDERS", (0..3).map(row).collect()).unwrap();
            store.flush().unwrap();
        }

        let reopened = MemoryStore::open(temp.path(), "localhost:2181").unwrap();
        assert_eq!(reopened.table_names(), vec!["ORDERS"]);
        assert_eq!(reopened.stats().total_rows, 3);
        assert!(temp.path().join("localhost_2181/ORDERS.json").exists());

        reopened.drop_tables("ORDERS").unwrap();
        assert!(!temp.path().join("localhost_2181/ORDERS.json").exists());
    }
}
