//! Query execution workload.
//!
//! [`QueryWorkload`] runs every query set of every scenario, measuring the
//! latency of each query execution. Serial sets run on the workload's own
//! slot; parallel sets fan their queries out on the shared pool.
//!
//! Per scenario it writes a JSON result file (suffixed with the run label).
//! On the first iteration it can also export each query's rows to CSV, or in
//! diff mode verify them against the previous export instead.
//!
//! Query ignores stop requests and always runs to completion.

use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::executor::{
    TaskHandle, Workload, WorkloadContext, WorkloadError, WorkloadFuture, WorkloadId,
    WorkloadKind, WorkloadOutcome,
};
use crate::results::{
    export_rows, verify_rows, write_result, QueryResult, ResultsError, ScenarioResult,
};
use crate::scenario::{ExecutionType, QueryDef, QuerySet, Scenario};
use crate::store::{run_blocking, DataStore, QueryKind, QueryResponse, StoreError};

/// Workload ID used by the run driver for the query phase.
pub const QUERY_WORKLOAD_ID: &str = "query";

/// Subdirectory of the results directory holding CSV exports.
pub const EXPORT_DIR: &str = "export";

/// Settings the query workload needs from the run configuration.
#[derive(Clone, Debug, Default)]
pub struct QuerySettings {
    pub scenarios: Vec<Scenario>,
    pub hint: Option<String>,
    pub label: Option<String>,
    pub results_dir: PathBuf,
    /// Export first-iteration rows to CSV.
    pub export: bool,
    /// Verify first-iteration rows against the previous export.
    pub diff: bool,
}

/// Runs the query sets of each scenario.
pub struct QueryWorkload {
    id: WorkloadId,
    settings: QuerySettings,
    store: Arc<dyn DataStore>,
}

type TimedResponse = Result<(QueryResponse, Duration), StoreError>;

impl QueryWorkload {
    pub fn new(settings: QuerySettings, store: Arc<dyn DataStore>) -> Self {
        Self {
            id: WorkloadId::new(QUERY_WORKLOAD_ID),
            settings,
            store,
        }
    }

    async fn run_scenario(
        &self,
        scenario: &Scenario,
        ctx: &WorkloadContext,
    ) -> Result<ScenarioResult, WorkloadError> {
        let mut result = ScenarioResult::new(
            &scenario.name,
            self.settings.label.clone(),
            self.settings.hint.clone(),
        );
        let started = Instant::now();

        for set in &scenario.query_sets {
            for iteration in 0..set.iterations {
                let responses = match set.execution {
                    ExecutionType::Serial => self.run_serial(set).await,
                    ExecutionType::Parallel => self.run_parallel(set, ctx).await?,
                };

                for (query, response) in set.queries.iter().zip(responses) {
                    let (response, latency) = response?;
                    if iteration == 0 {
                        self.check_rows(scenario, set, query, &response)?;
                    }
                    result.queries.push(QueryResult {
                        query_set: set.name.clone(),
                        query: query.id.clone(),
                        statement: query.kind.to_string(),
                        iteration,
                        latency_ms: latency.as_secs_f64() * 1_000.0,
                        rows: response.rows.len() as u64,
                    });
                }
            }
            debug!(scenario = %scenario.name, query_set = %set.name, "Query set finished");
        }

        result.elapsed_ms = started.elapsed().as_millis() as u64;
        let path = write_result(&self.settings.results_dir, &result)?;
        info!(
            scenario = %scenario.name,
            executions = result.queries.len(),
            path = %path.display(),
            "Query results written"
        );
        Ok(result)
    }

    async fn run_serial(&self, set: &QuerySet) -> Vec<TimedResponse> {
        let mut responses = Vec::with_capacity(set.queries.len());
        for query in &set.queries {
            let hint = self.settings.hint.as_deref();
            responses.push(execute_blocking(&self.store, query, hint).await);
        }
        responses
    }

    /// Runs the set's queries on the pool, at most `concurrency` in flight.
    /// Responses are returned in query order.
    async fn run_parallel(
        &self,
        set: &QuerySet,
        ctx: &WorkloadContext,
    ) -> Result<Vec<TimedResponse>, WorkloadError> {
        let mut in_flight: VecDeque<TaskHandle<TimedResponse>> = VecDeque::new();
        let mut responses = Vec::with_capacity(set.queries.len());

        for query in &set.queries {
            if in_flight.len() >= set.concurrency {
                if let Some(task) = in_flight.pop_front() {
                    responses.push(task.join().await?);
                }
            }

            let hint = self.settings.hint.as_deref();
            in_flight.push_back(ctx.pool().submit(execute_blocking(&self.store, query, hint))?);
        }

        while let Some(task) = in_flight.pop_front() {
            responses.push(task.join().await?);
        }
        Ok(responses)
    }

    fn check_rows(
        &self,
        scenario: &Scenario,
        set: &QuerySet,
        query: &QueryDef,
        response: &QueryResponse,
    ) -> Result<(), WorkloadError> {
        if !self.settings.diff && !self.settings.export {
            return Ok(());
        }

        let path = self
            .settings
            .results_dir
            .join(EXPORT_DIR)
            .join(format!("{}_{}_{}.csv", scenario.name, set.name, query.id));

        if self.settings.diff {
            return verify_rows(&path, &response.rows).map_err(|e| match e {
                ResultsError::Mismatch { reason, .. } => WorkloadError::Verification {
                    query: query.id.clone(),
                    reason,
                },
                ResultsError::MissingBaseline(path) => WorkloadError::Verification {
                    query: query.id.clone(),
                    reason: format!("no baseline export at {}", path.display()),
                },
                other => other.into(),
            });
        }

        let header = self.export_header(query);
        export_rows(&path, &header, &response.rows)?;
        Ok(())
    }

    fn export_header(&self, query: &QueryDef) -> Vec<String> {
        if query.kind == QueryKind::Count {
            return vec!["count".to_string()];
        }
        self.store
            .schema(&query.table)
            .map(|schema| schema.columns.into_iter().map(|c| c.name).collect())
            .unwrap_or_default()
    }
}

impl Workload for QueryWorkload {
    fn id(&self) -> WorkloadId {
        self.id.clone()
    }

    fn name(&self) -> &str {
        "Query"
    }

    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Query
    }

    fn run<'a>(&'a self, ctx: &'a WorkloadContext) -> WorkloadFuture<'a> {
        Box::pin(async move {
            let mut executions = 0u64;
            for scenario in &self.settings.scenarios {
                let result = self.run_scenario(scenario, ctx).await?;
                executions += result.queries.len() as u64;
            }

            Ok(WorkloadOutcome::new(
                executions,
                format!(
                    "{} query executions across {} scenario(s)",
                    executions,
                    self.settings.scenarios.len()
                ),
            ))
        })
    }
}

/// Runs one query on a blocking thread and times the store call alone.
fn execute_blocking(
    store: &Arc<dyn DataStore>,
    query: &QueryDef,
    hint: Option<&str>,
) -> impl Future<Output = TimedResponse> + Send + 'static {
    let store = Arc::clone(store);
    let request = query.request(hint);
    run_blocking(move || {
        let started = Instant::now();
        let response = store.execute(&request)?;
        Ok((response, started.elapsed()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutorConfig, ExecutorError, WorkloadExecutor};
    use crate::results::{read_result, result_file_name};
    use crate::store::{ColumnDef, ColumnType, MemoryStore, TableSchema};
    use crate::workloads::load::generate_rows;
    use tempfile::TempDir;

    fn seeded_store(rows: u64) -> Arc<MemoryStore> {
        let schema = TableSchema::new(
            "ORDERS",
            vec![
                ColumnDef::new("id", ColumnType::Key),
                ColumnDef::new("customer", ColumnType::Text),
            ],
        );
        let store = Arc::new(MemoryStore::in_memory());
        store.create_table(&schema).unwrap();
        store.upsert("ORDERS", generate_rows(&schema, 0..rows)).unwrap();
        store
    }

    fn scenario(execution: ExecutionType) -> Scenario {
        let query = |id: &str, kind| QueryDef {
            id: id.to_string(),
            table: "ORDERS".to_string(),
            kind,
        };
        Scenario {
            name: "orders".into(),
            source: PathBuf::from("orders.scenario.ini"),
            table: "ORDERS".into(),
            row_count: 0,
            batch_size: 10,
            writer_threads: 1,
            query_sets: vec![QuerySet {
                name: "basic".into(),
                execution,
                concurrency: 2,
                iterations: 2,
                queries: vec![
                    query("total", QueryKind::Count),
                    query("one", QueryKind::Lookup { key: 3 }),
                    query("head", QueryKind::Scan { limit: Some(5) }),
                ],
            }],
        }
    }

    async fn run(
        settings: QuerySettings,
        store: Arc<MemoryStore>,
    ) -> Result<crate::executor::WorkloadReport, ExecutorError> {
        let executor = WorkloadExecutor::new(ExecutorConfig::with_pool_size(3));
        let id = executor.add(QueryWorkload::new(settings, store)).unwrap();
        let result = executor.get(&id).await;
        executor.shutdown().await;
        result
    }

    #[tokio::test]
    async fn test_serial_and_parallel_write_results() {
        for execution in [ExecutionType::Serial, ExecutionType::Parallel] {
            let temp = TempDir::new().unwrap();
            let settings = QuerySettings {
                scenarios: vec![scenario(execution)],
                label: Some("base".into()),
                hint: Some("NO_CACHE".into()),
                results_dir: temp.path().to_path_buf(),
                ..Default::default()
            };

            let report = run(settings, seeded_store(20)).await.unwrap();
            assert_eq!(report.outcome.items, 6);

            let written =
                read_result(&temp.path().join(result_file_name("orders", Some("base")))).unwrap();
            assert_eq!(written.hint.as_deref(), Some("NO_CACHE"));
            assert_eq!(written.queries.len(), 6);
            let head = written.queries.iter().find(|q| q.query == "head").unwrap();
            assert_eq!(head.rows, 5);
        }
    }

    #[tokio::test]
    async fn test_export_then_diff() {
        let temp = TempDir::new().unwrap();
        let base = QuerySettings {
            scenarios: vec![scenario(ExecutionType::Serial)],
            results_dir: temp.path().to_path_buf(),
            ..Default::default()
        };

        let export = QuerySettings {
            export: true,
            ..base.clone()
        };
        run(export, seeded_store(20)).await.unwrap();
        assert!(temp.path().join("export/orders_basic_head.csv").exists());

        let diff = QuerySettings {
            diff: true,
            ..base.clone()
        };
        run(diff.clone(), seeded_store(20)).await.unwrap();

        // Fewer rows changes the count query's answer.
        let err = run(diff, seeded_store(10)).await.unwrap_err();
        match err {
            ExecutorError::Workload { source, .. } => {
                assert!(matches!(source, WorkloadError::Verification { .. }))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_diff_without_baseline_fails() {
        let temp = TempDir::new().unwrap();
        let settings = QuerySettings {
            scenarios: vec![scenario(ExecutionType::Serial)],
            results_dir: temp.path().to_path_buf(),
            diff: true,
            ..Default::default()
        };
        assert!(run(settings, seeded_store(5)).await.is_err());
    }
}
