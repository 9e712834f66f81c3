//! JSON result files, one per scenario and run label.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::ResultsError;

const RESULT_EXTENSION: &str = "json";

/// Latency and row count of one query execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query_set: String,
    pub query: String,
    pub statement: String,
    pub iteration: usize,
    pub latency_ms: f64,
    pub rows: u64,
}

/// Everything a query workload measured for one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub label: Option<String>,
    pub hint: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub queries: Vec<QueryResult>,
}

impl ScenarioResult {
    pub fn new(scenario: impl Into<String>, label: Option<String>, hint: Option<String>) -> Self {
        Self {
            scenario: scenario.into(),
            label,
            hint,
            started_at: Utc::now(),
            elapsed_ms: 0,
            queries: Vec::new(),
        }
    }

    /// Mean latency of `query` in `query_set` across iterations.
    pub fn mean_latency_ms(&self, query_set: &str, query: &str) -> Option<f64> {
        let latencies: Vec<f64> = self
            .queries
            .iter()
            .filter(|r| r.query_set == query_set && r.query == query)
            .map(|r| r.latency_ms)
            .collect();
        if latencies.is_empty() {
            return None;
        }
        Some(latencies.iter().sum::<f64>() / latencies.len() as f64)
    }
}

/// `{scenario}_{label}.json`, or `{scenario}.json` without a label.
pub fn result_file_name(scenario: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{}_{}.{}", scenario, label, RESULT_EXTENSION),
        None => format!("{}.{}", scenario, RESULT_EXTENSION),
    }
}

/// Writes a result file into `dir`, creating the directory if needed.
pub fn write_result(dir: &Path, result: &ScenarioResult) -> Result<PathBuf, ResultsError> {
    fs::create_dir_all(dir).map_err(|e| ResultsError::io(dir, e))?;
    let path = dir.join(result_file_name(&result.scenario, result.label.as_deref()));

    let json = serde_json::to_vec_pretty(result).map_err(|source| ResultsError::Json {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, json).map_err(|e| ResultsError::io(&path, e))?;
    Ok(path)
}

pub fn read_result(path: &Path) -> Result<ScenarioResult, ResultsError> {
    let bytes = fs::read(path).map_err(|e| ResultsError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|source| ResultsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads every result file in `dir` carrying `label`, sorted by scenario.
pub fn read_labelled(dir: &Path, label: &str) -> Result<Vec<ScenarioResult>, ResultsError> {
    let entries = fs::read_dir(dir).map_err(|e| ResultsError::io(dir, e))?;
    let suffix = format!("_{}.{}", label, RESULT_EXTENSION);

    let mut results = Vec::new();
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(&suffix));
        if !matches {
            continue;
        }
        let result = read_result(&path)?;
        if result.label.as_deref() == Some(label) {
            results.push(result);
        }
    }

    if results.is_empty() {
        return Err(ResultsError::NoResults {
            label: label.to_string(),
            dir: dir.to_path_buf(),
        });
    }
    results.sort_by(|a, b| a.scenario.cmp(&b.scenario));
    Ok(results)
}
