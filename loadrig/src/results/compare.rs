//! Latency comparison across labelled runs.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use super::error::ResultsError;
use super::json::read_labelled;

/// Mean latency of one query under each compared label.
#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonRow {
    pub scenario: String,
    pub query_set: String,
    pub query: String,
    /// One entry per label, `None` when that run lacks the query.
    pub mean_latency_ms: Vec<Option<f64>>,
}

impl ComparisonRow {
    /// Change of the last label relative to the first, in percent.
    pub fn delta_percent(&self) -> Option<f64> {
        let first = self.mean_latency_ms.first().copied().flatten()?;
        let last = self.mean_latency_ms.last().copied().flatten()?;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

/// Side-by-side latencies of several runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub labels: Vec<String>,
    pub rows: Vec<ComparisonRow>,
}

impl Comparison {
    /// Renders a fixed-width text table.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "{:<40}", "query");
        for label in &self.labels {
            let _ = write!(out, " {:>12}", label);
        }
        let _ = writeln!(out, " {:>9}", "delta");

        for row in &self.rows {
            let name = format!("{}/{}/{}", row.scenario, row.query_set, row.query);
            let _ = write!(out, "{:<40}", name);
            for latency in &row.mean_latency_ms {
                match latency {
                    Some(ms) => {
                        let _ = write!(out, " {:>10.3}ms", ms);
                    }
                    None => {
                        let _ = write!(out, " {:>12}", "-");
                    }
                }
            }
            match row.delta_percent() {
                Some(delta) => {
                    let _ = writeln!(out, " {:>+8.1}%", delta);
                }
                None => {
                    let _ = writeln!(out, " {:>9}", "-");
                }
            }
        }
        out
    }
}

/// Compares the result files of `labels` found in `dir`.
///
/// Every label must have at least one result file.
pub fn compare_runs(dir: &Path, labels: &[String]) -> Result<Comparison, ResultsError> {
    type Key = (String, String, String);
    let mut table: BTreeMap<Key, Vec<Option<f64>>> = BTreeMap::new();

    for (index, label) in labels.iter().enumerate() {
        for result in read_labelled(dir, label)? {
            for query in &result.queries {
                let key = (
                    result.scenario.clone(),
                    query.query_set.clone(),
                    query.query.clone(),
                );
                let entry = table
                    .entry(key)
                    .or_insert_with(|| vec![None; labels.len()]);
                if entry[index].is_none() {
                    entry[index] = result.mean_latency_ms(&query.query_set, &query.query);
                }
            }
        }
    }

    let rows = table
        .into_iter()
        .map(|((scenario, query_set, query), mean_latency_ms)| ComparisonRow {
            scenario,
            query_set,
            query,
            mean_latency_ms,
        })
        .collect();

    Ok(Comparison {
        labels: labels.to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{write_result, QueryResult, ScenarioResult};
    use tempfile::TempDir;

    fn write(dir: &Path, label: &str, latencies: &[(&str, f64)]) {
        let mut result = ScenarioResult::new("orders", Some(label.to_string()), None);
        for (query, latency) in latencies {
            result.queries.push(QueryResult {
                query_set: "s".into(),
                query: query.to_string(),
                statement: "count".into(),
                iteration: 0,
                latency_ms: *latency,
                rows: 1,
            });
        }
        write_result(dir, &result).unwrap();
    }

    #[test]
    fn test_compare_two_labels() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "before", &[("a", 10.0), ("b", 4.0)]);
        write(temp.path(), "after", &[("a", 5.0)]);

        let labels = vec!["before".to_string(), "after".to_string()];
        let comparison = compare_runs(temp.path(), &labels).unwrap();

        assert_eq!(comparison.rows.len(), 2);
        let a = &comparison.rows[0];
        assert_eq!(a.query, "a");
        assert_eq!(a.mean_latency_ms, vec![Some(10.0), Some(5.0)]);
        assert_eq!(a.delta_percent(), Some(-50.0));

        let b = &comparison.rows[1];
        assert_eq!(b.mean_latency_ms, vec![Some(4.0), None]);
        assert_eq!(b.delta_percent(), None);

        let rendered = comparison.render();
        assert!(rendered.contains("orders/s/a"));
        assert!(rendered.contains("-50.0%"));
    }

    #[test]
    fn test_compare_missing_label() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "before", &[("a", 1.0)]);

        let labels = vec!["before".to_string(), "nope".to_string()];
        assert!(matches!(
            compare_runs(temp.path(), &labels),
            Err(ResultsError::NoResults { .. })
        ));
    }
}
