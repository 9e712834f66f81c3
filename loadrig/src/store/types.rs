//! Data types exchanged with a [`DataStore`](super::DataStore).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Values and rows
// =============================================================================

/// A single cell value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Text(String),
    Null,
}

impl Value {
    /// Returns the integer value, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Text(s) => write!(f, "{}", s),
            Self::Null => Ok(()),
        }
    }
}

/// A row: one value per schema column, key column first.
pub type Row = Vec<Value>;

// =============================================================================
// Schema
// =============================================================================

/// Column type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Integer primary key. Exactly one per table, always the first column.
    Key,
    Text,
    Int,
}

impl std::str::FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "key" => Ok(Self::Key),
            "text" => Ok(Self::Text),
            "int" => Ok(Self::Int),
            other => Err(format!("unknown column type '{}'", other)),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key => write!(f, "key"),
            Self::Text => write!(f, "text"),
            Self::Int => write!(f, "int"),
        }
    }
}

/// A named, typed column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Table definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Checks that the key column comes first and appears exactly once.
    pub fn validate(&self) -> Result<(), String> {
        match self.columns.first() {
            None => return Err("table has no columns".to_string()),
            Some(c) if c.ty != ColumnType::Key => {
                return Err(format!("first column '{}' must be of type key", c.name))
            }
            Some(_) => {}
        }
        let keys = self
            .columns
            .iter()
            .filter(|c| c.ty == ColumnType::Key)
            .count();
        if keys != 1 {
            return Err(format!("expected exactly one key column, found {}", keys));
        }
        Ok(())
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Shape of a query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QueryKind {
    /// Number of rows in the table.
    Count,
    /// Single row by key.
    Lookup { key: i64 },
    /// Rows in key order, optionally limited.
    Scan { limit: Option<usize> },
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Lookup { key } => write!(f, "lookup {}", key),
            Self::Scan { limit: Some(n) } => write!(f, "scan {}", n),
            Self::Scan { limit: None } => write!(f, "scan"),
        }
    }
}

/// A query against one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRequest {
    pub table: String,
    pub kind: QueryKind,
    /// Optional execution hint, passed through to the store.
    pub hint: Option<String>,
}

impl QueryRequest {
    pub fn new(table: impl Into<String>, kind: QueryKind) -> Self {
        Self {
            table: table.into(),
            kind,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }
}

/// Rows produced by a query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryResponse {
    pub rows: Vec<Row>,
    pub rows_examined: u64,
}

// =============================================================================
// Statistics
// =============================================================================

/// Per-table statistics, refreshed by `update_statistics`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStatistics {
    pub row_count: u64,
    pub min_key: Option<i64>,
    pub max_key: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// Point-in-time store counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub tables: usize,
    pub total_rows: u64,
    pub rows_upserted: u64,
    pub queries_executed: u64,
}
