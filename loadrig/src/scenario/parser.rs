//! INI parsing for `*.scenario.ini` and `*.schema.ini` files.
//!
//! Scenario file layout:
//!
//! ```ini
//! [scenario]
//! name = nightly
//! table = ORDERS
//! row_count = 10000
//! batch_size = 500
//! writer_threads = 4
//!
//! [query_set:lookups]
//! execution = parallel
//! concurrency = 4
//! iterations = 3
//! query.count_all = count
//! query.by_key = lookup 42
//! query.first_rows = scan 100
//! ```
//!
//! Schema file layout:
//!
//! ```ini
//! [table:ORDERS]
//! columns = id:key, customer:text, amount:int
//! ```

use ini::{Ini, Properties};
use std::path::Path;
use std::str::FromStr;

use super::error::ScenarioError;
use super::types::{ExecutionType, QueryDef, QuerySet, Scenario, MAX_ROW_COUNT};
use crate::store::{ColumnDef, ColumnType, QueryKind, TableSchema};

const SCENARIO_SECTION: &str = "scenario";
const QUERY_SET_PREFIX: &str = "query_set:";
const TABLE_PREFIX: &str = "table:";
const QUERY_KEY_PREFIX: &str = "query.";

pub const DEFAULT_BATCH_SIZE: usize = 1_000;
pub const DEFAULT_WRITER_THREADS: usize = 2;
pub const DEFAULT_QUERY_CONCURRENCY: usize = 1;
pub const DEFAULT_QUERY_ITERATIONS: usize = 1;

/// Reads and parses a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let ini = Ini::load_from_file(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenario(&ini, path)
}

/// Reads and parses a schema file.
pub fn load_schema(path: &Path) -> Result<Vec<TableSchema>, ScenarioError> {
    let ini = Ini::load_from_file(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema(&ini, path)
}

/// Parses a scenario from an already-loaded INI document.
pub fn parse_scenario(ini: &Ini, path: &Path) -> Result<Scenario, ScenarioError> {
    let fields = FieldReader { path };

    let section = ini
        .section(Some(SCENARIO_SECTION))
        .ok_or_else(|| fields.missing(SCENARIO_SECTION, "table"))?;

    let table = fields.required(section, SCENARIO_SECTION, "table")?.to_string();
    let name = section
        .get("name")
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| default_scenario_name(path));

    let mut scenario = Scenario {
        name,
        source: path.to_path_buf(),
        row_count: fields.number(section, SCENARIO_SECTION, "row_count", None)?,
        batch_size: fields.positive(section, SCENARIO_SECTION, "batch_size", DEFAULT_BATCH_SIZE)?,
        writer_threads: fields.positive(
            section,
            SCENARIO_SECTION,
            "writer_threads",
            DEFAULT_WRITER_THREADS,
        )?,
        table,
        query_sets: Vec::new(),
    };

    if scenario.row_count > MAX_ROW_COUNT {
        return Err(fields.invalid(
            SCENARIO_SECTION,
            "row_count",
            &scenario.row_count.to_string(),
            &format!("must not exceed {}", MAX_ROW_COUNT),
        ));
    }

    for (section_name, props) in ini.iter() {
        let Some(set_name) = section_name.and_then(|s| s.strip_prefix(QUERY_SET_PREFIX)) else {
            continue;
        };
        let section_name = section_name.unwrap_or_default();
        scenario
            .query_sets
            .push(parse_query_set(&fields, section_name, set_name, props, &scenario.table)?);
    }

    Ok(scenario)
}

fn parse_query_set(
    fields: &FieldReader<'_>,
    section_name: &str,
    set_name: &str,
    props: &Properties,
    default_table: &str,
) -> Result<QuerySet, ScenarioError> {
    let execution = match props.get("execution") {
        Some(v) => ExecutionType::from_str(v).map_err(|reason| {
            fields.invalid(section_name, "execution", v, &reason)
        })?,
        None => ExecutionType::default(),
    };
    let table = props
        .get("table")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(default_table);

    let mut queries = Vec::new();
    for (key, value) in props.iter() {
        let Some(id) = key.strip_prefix(QUERY_KEY_PREFIX) else {
            continue;
        };
        let kind = parse_query_kind(value)
            .map_err(|reason| fields.invalid(section_name, key, value, &reason))?;
        queries.push(QueryDef {
            id: id.to_string(),
            table: table.to_string(),
            kind,
        });
    }

    if queries.is_empty() {
        return Err(fields.missing(section_name, "query.<id>"));
    }

    Ok(QuerySet {
        name: set_name.to_string(),
        execution,
        concurrency: fields.positive(props, section_name, "concurrency", DEFAULT_QUERY_CONCURRENCY)?,
        iterations: fields.positive(props, section_name, "iterations", DEFAULT_QUERY_ITERATIONS)?,
        queries,
    })
}

/// Parses `count`, `lookup <key>`, `scan` or `scan <limit>`.
pub fn parse_query_kind(text: &str) -> Result<QueryKind, String> {
    let mut parts = text.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();
    if parts.next().is_some() {
        return Err("too many arguments".to_string());
    }

    match (verb.as_str(), arg) {
        ("count", None) => Ok(QueryKind::Count),
        ("lookup", Some(key)) => key
            .parse()
            .map(|key| QueryKind::Lookup { key })
            .map_err(|_| format!("lookup key '{}' is not an integer", key)),
        ("scan", None) => Ok(QueryKind::Scan { limit: None }),
        ("scan", Some(limit)) => limit
            .parse()
            .map(|n| QueryKind::Scan { limit: Some(n) })
            .map_err(|_| format!("scan limit '{}' is not a positive integer", limit)),
        _ => Err("expected 'count', 'lookup <key>' or 'scan [limit]'".to_string()),
    }
}

/// Parses every `[table:NAME]` section of a schema document.
pub fn parse_schema(ini: &Ini, path: &Path) -> Result<Vec<TableSchema>, ScenarioError> {
    let fields = FieldReader { path };
    let mut tables = Vec::new();

    for (section_name, props) in ini.iter() {
        let Some(section_name) = section_name else {
            continue;
        };
        let Some(table) = section_name.strip_prefix(TABLE_PREFIX) else {
            continue;
        };

        let spec = fields.required(props, section_name, "columns")?;
        let columns = spec
            .split(',')
            .map(parse_column)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| fields.invalid(section_name, "columns", spec, &reason))?;

        let schema = TableSchema::new(table.trim(), columns);
        schema
            .validate()
            .map_err(|reason| fields.invalid(section_name, "columns", spec, &reason))?;
        tables.push(schema);
    }

    Ok(tables)
}

fn parse_column(text: &str) -> Result<ColumnDef, String> {
    let (name, ty) = text
        .split_once(':')
        .ok_or_else(|| format!("column '{}' must be written as name:type", text.trim()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("column name is empty".to_string());
    }
    Ok(ColumnDef::new(name, ColumnType::from_str(ty)?))
}

/// `orders.scenario.ini` → `orders`.
fn default_scenario_name(path: &Path) -> String {
    let file = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("scenario");
    file.split('.').next().unwrap_or(file).to_string()
}

/// Builds errors that carry the file path and section.
struct FieldReader<'a> {
    path: &'a Path,
}

impl FieldReader<'_> {
    fn missing(&self, section: &str, key: &str) -> ScenarioError {
        ScenarioError::MissingKey {
            path: self.path.to_path_buf(),
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    fn invalid(&self, section: &str, key: &str, value: &str, reason: &str) -> ScenarioError {
        ScenarioError::InvalidValue {
            path: self.path.to_path_buf(),
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn required<'p>(
        &self,
        props: &'p Properties,
        section: &str,
        key: &str,
    ) -> Result<&'p str, ScenarioError> {
        props
            .get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| self.missing(section, key))
    }

    fn number<T: FromStr>(
        &self,
        props: &Properties,
        section: &str,
        key: &str,
        default: Option<T>,
    ) -> Result<T, ScenarioError> {
        match props.get(key) {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| self.invalid(section, key, v, "must be a non-negative integer")),
            None => default.ok_or_else(|| self.missing(section, key)),
        }
    }

    fn positive(
        &self,
        props: &Properties,
        section: &str,
        key: &str,
        default: usize,
    ) -> Result<usize, ScenarioError> {
        let value: usize = self.number(props, section, key, Some(default))?;
        if value == 0 {
            return Err(self.invalid(section, key, "0", "must be greater than zero"));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scenario(content: &str) -> Result<Scenario, ScenarioError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_scenario(&ini, &PathBuf::from("orders.scenario.ini"))
    }

    #[test]
    fn test_parse_full_scenario() {
        let s = scenario(
            r#"
[scenario]
name = nightly
table = ORDERS
row_count = 250
batch_size = 50
writer_threads = 3

[query_set:lookups]
execution = parallel
concurrency = 4
iterations = 2
query.count_all = count
query.by_key = lookup 42
query.first_rows = scan 10

[query_set:archive]
table = ORDERS_ARCHIVE
query.everything = scan
"#,
        )
        .unwrap();

        assert_eq!(s.name, "nightly");
        assert_eq!(s.table, "ORDERS");
        assert_eq!(s.row_count, 250);
        assert_eq!(s.batch_size, 50);
        assert_eq!(s.writer_threads, 3);
        assert_eq!(s.query_sets.len(), 2);

        let lookups = &s.query_sets[0];
        assert_eq!(lookups.name, "lookups");
        assert_eq!(lookups.execution, ExecutionType::Parallel);
        assert_eq!(lookups.concurrency, 4);
        assert_eq!(lookups.iterations, 2);
        let ids: Vec<_> = lookups.queries.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["count_all", "by_key", "first_rows"]);
        assert_eq!(lookups.queries[1].kind, QueryKind::Lookup { key: 42 });

        let archive = &s.query_sets[1];
        assert_eq!(archive.execution, ExecutionType::Serial);
        assert_eq!(archive.queries[0].table, "ORDERS_ARCHIVE");
        assert_eq!(archive.queries[0].kind, QueryKind::Scan { limit: None });
    }

    #[test]
    fn test_row_count_above_key_range_rejected() {
        let too_many = format!("[scenario]\ntable = T\nrow_count = {}\n", MAX_ROW_COUNT + 1);
        let err = scenario(&too_many).unwrap_err();
        assert!(err.to_string().contains("row_count"), "{}", err);

        let at_limit = format!("[scenario]\ntable = T\nrow_count = {}\n", MAX_ROW_COUNT);
        assert!(scenario(&at_limit).is_ok());
    }

    #[test]
    fn test_scenario_defaults() {
        let s = scenario("[scenario]\ntable = T\nrow_count = 10\n").unwrap();
        assert_eq!(s.name, "orders");
        assert_eq!(s.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(s.writer_threads, DEFAULT_WRITER_THREADS);
        assert!(s.query_sets.is_empty());
        assert_eq!(s.effective_row_count(Some(3)), 3);
        assert_eq!(s.effective_row_count(None), 10);
    }

    #[test]
    fn test_scenario_missing_table() {
        let err = scenario("[scenario]\nrow_count = 10\n").unwrap_err();
        assert!(matches!(err, ScenarioError::MissingKey { ref key, .. } if key == "table"));
    }

    #[test]
    fn test_scenario_zero_batch_size() {
        let err = scenario("[scenario]\ntable = T\nrow_count = 1\nbatch_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_query_set_without_queries() {
        let err = scenario("[scenario]\ntable = T\nrow_count = 1\n[query_set:empty]\nexecution = serial\n").unwrap_err();
        assert!(matches!(err, ScenarioError::MissingKey { .. }));
    }

    #[test]
    fn test_parse_query_kind() {
        assert_eq!(parse_query_kind("COUNT").unwrap(), QueryKind::Count);
        assert_eq!(parse_query_kind("scan 5").unwrap(), QueryKind::Scan { limit: Some(5) });
        assert!(parse_query_kind("lookup").is_err());
        assert!(parse_query_kind("lookup x").is_err());
        assert!(parse_query_kind("scan 1 2").is_err());
        assert!(parse_query_kind("delete").is_err());
    }

    #[test]
    fn test_parse_schema() {
        let ini = Ini::load_from_str(
            r#"
[table:ORDERS]
columns = id:key, customer:text, amount:int

[table:CUSTOMERS]
columns = id:key, name:text
"#,
        )
        .unwrap();

        let tables = parse_schema(&ini, Path::new("bench.schema.ini")).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "ORDERS");
        assert_eq!(tables[0].column_names(), vec!["id", "customer", "amount"]);
        assert_eq!(tables[1].columns[1].ty, ColumnType::Text);
    }

    #[test]
    fn test_parse_schema_rejects_bad_columns() {
        let ini = Ini::load_from_str("[table:T]\ncolumns = id:int, x:text\n").unwrap();
        assert!(parse_schema(&ini, Path::new("t.schema.ini")).is_err());

        let ini = Ini::load_from_str("[table:T]\ncolumns = id\n").unwrap();
        let err = parse_schema(&ini, Path::new("t.schema.ini")).unwrap_err();
        assert!(err.to_string().contains("name:type"));
    }
}
