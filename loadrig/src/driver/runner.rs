//! Run driver - sequences one benchmark run.
//!
//! ```text
//! Start → Prepare → MonitorActive? → LoadInProgress? → LoadDone?
//!       → QuerySubmitted? → Drain → MonitorStopped? → Shutdown → Terminal
//! ```
//!
//! Load is joined as soon as it is submitted, so queries never start before
//! the data they read is in place. Query is submitted without joining and
//! is collected at drain time. The monitor runs beside both and is stopped
//! only after everything else has been joined.
//!
//! Once the executor exists, shutdown runs on every path, including when
//! an earlier phase failed.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info};

use super::config::{RunConfig, DEFAULT_SCHEMA_SELECTOR};
use super::environment::BenchEnvironment;
use super::error::DriverError;
use super::phase::{RunPhase, RunSummary};
use crate::executor::{
    ExecutorConfig, TelemetrySink, TracingTelemetrySink, Workload, WorkloadExecutor, WorkloadId,
};
use crate::scenario::ScenarioError;

/// Drives one benchmark run.
pub struct RunDriver {
    config: RunConfig,
    env: Arc<dyn BenchEnvironment>,
    telemetry: Arc<dyn TelemetrySink>,
    phases: Mutex<Vec<RunPhase>>,
}

/// Workloads built during preparation, submitted in later phases.
struct PreparedWorkloads {
    monitor: Option<Box<dyn Workload>>,
    load: Option<Box<dyn Workload>>,
    query: Option<Box<dyn Workload>>,
}

impl RunDriver {
    pub fn new(config: RunConfig, env: Arc<dyn BenchEnvironment>) -> Self {
        Self {
            config,
            env,
            telemetry: Arc::new(TracingTelemetrySink),
            phases: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the executor's telemetry sink.
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Phases entered so far, including by a run that failed.
    pub fn phases(&self) -> Vec<RunPhase> {
        self.phases.lock().clone()
    }

    fn enter(&self, phase: RunPhase) {
        info!(phase = %phase, "Run phase");
        self.phases.lock().push(phase);
    }

    /// Runs the configured benchmark.
    ///
    /// Configuration errors are returned before any workload is submitted.
    /// A run failure is returned after the executor has been shut down.
    pub async fn run(&self) -> Result<RunSummary, DriverError> {
        self.phases.lock().clear();
        self.enter(RunPhase::Start);
        self.config.validate()?;

        let mut summary = RunSummary::default();

        if self.config.is_side_mode() {
            self.run_side_modes(&mut summary)?;
            self.enter(RunPhase::Terminal);
            summary.phases = self.phases();
            return Ok(summary);
        }

        let executor = WorkloadExecutor::with_telemetry(
            ExecutorConfig::with_pool_size(self.config.thread_pool_size),
            Arc::clone(&self.telemetry),
        );

        let result = self.run_phases(&executor, &mut summary).await;

        self.enter(RunPhase::Shutdown);
        executor.shutdown().await;
        self.enter(RunPhase::Terminal);

        match result {
            Ok(()) => {
                summary.phases = self.phases();
                info!(
                    workloads = summary.reports.len(),
                    "Run completed"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "Run failed");
                Err(e)
            }
        }
    }

    fn run_side_modes(&self, summary: &mut RunSummary) -> Result<(), DriverError> {
        if self.config.list_files {
            summary.listed_files = self.env.list_resources()?;
            info!(files = summary.listed_files.len(), "Resource files listed");
        }
        if !self.config.compare.is_empty() {
            summary.comparison = Some(self.env.compare_results(&self.config.compare)?);
        }
        Ok(())
    }

    async fn run_phases(
        &self,
        executor: &WorkloadExecutor,
        summary: &mut RunSummary,
    ) -> Result<(), DriverError> {
        self.enter(RunPhase::Prepare);
        let prepared = self.prepare(summary)?;

        let monitor_id = match prepared.monitor {
            Some(monitor) => {
                self.enter(RunPhase::MonitorActive);
                Some(executor.add_boxed(monitor)?)
            }
            None => None,
        };

        if let Some(load) = prepared.load {
            self.enter(RunPhase::LoadInProgress);
            let id = executor.add_boxed(load)?;
            summary.reports.push(executor.get(&id).await?);
            self.enter(RunPhase::LoadDone);
        }

        let query_id = match prepared.query {
            Some(query) => {
                self.enter(RunPhase::QuerySubmitted);
                Some(executor.add_boxed(query)?)
            }
            None => None,
        };

        self.enter(RunPhase::Drain);
        match monitor_id {
            Some(monitor_id) => {
                // The monitor only ends when stopped, so the remaining work is
                // joined by ID before it is stopped.
                if let Some(query_id) = query_id {
                    summary.reports.push(executor.get(&query_id).await?);
                }
                self.stop_monitor(executor, &monitor_id)?;
                summary.reports.extend(executor.get_all().await?);
            }
            None => summary.reports.extend(executor.get_all().await?),
        }

        Ok(())
    }

    fn stop_monitor(
        &self,
        executor: &WorkloadExecutor,
        monitor_id: &WorkloadId,
    ) -> Result<(), DriverError> {
        self.enter(RunPhase::MonitorStopped);
        executor.request_stop(monitor_id)?;
        Ok(())
    }

    /// Drops tables, applies schemas and builds every workload up front, so
    /// a bad selector fails the run before anything is submitted.
    fn prepare(&self, summary: &mut RunSummary) -> Result<PreparedWorkloads, DriverError> {
        if let Some(pattern) = &self.config.drop_pattern {
            summary.dropped_tables = self.env.drop_tables(pattern)?;
        }

        if self.config.apply_schema {
            summary.tables_created = self.apply_schema()?;
        }

        Ok(PreparedWorkloads {
            monitor: self
                .config
                .monitor
                .then(|| self.env.monitor_workload(&self.config))
                .transpose()?,
            load: self
                .config
                .load
                .then(|| self.env.load_workload(&self.config))
                .transpose()?,
            query: self
                .config
                .query
                .then(|| self.env.query_workload(&self.config))
                .transpose()?,
        })
    }

    /// Applies the selected schema files, or every schema file when load or
    /// query runs without a selector. An empty resource directory is only an
    /// error for an explicit selector.
    fn apply_schema(&self) -> Result<usize, DriverError> {
        if let Some(selector) = &self.config.schema_file {
            return self.env.apply_schema(selector);
        }
        if !(self.config.load || self.config.query) {
            return Ok(0);
        }

        match self.env.apply_schema(DEFAULT_SCHEMA_SELECTOR) {
            Err(DriverError::Scenario(ScenarioError::NoMatch { .. })) => {
                info!("No schema files found, skipping schema apply");
                Ok(0)
            }
            result => result,
        }
    }
}

impl std::fmt::Debug for RunDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunDriver")
            .field("config", &self.config)
            .field("phases", &self.phases())
            .finish()
    }
}
