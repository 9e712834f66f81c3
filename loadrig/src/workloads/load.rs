//! Data load workload.
//!
//! [`LoadWorkload`] fills the table of each scenario with generated rows:
//!
//! 1. Looks up the table definition in the store (the schema must exist)
//! 2. Splits the row range into batches of the scenario's batch size
//! 3. Fans the batches out on the shared pool, at most `writer_threads`
//!    in flight at once
//! 4. Optionally refreshes table statistics, then flushes the store
//!
//! Rows are generated from their key alone, so two loads of the same
//! scenario produce identical data and diff-mode query runs stay stable.
//!
//! Load ignores stop requests and always runs to completion.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::executor::{
    TaskHandle, Workload, WorkloadContext, WorkloadError, WorkloadFuture, WorkloadId,
    WorkloadKind, WorkloadOutcome,
};
use crate::scenario::{Scenario, MAX_ROW_COUNT};
use crate::store::{run_blocking, ColumnType, DataStore, Row, StoreError, TableSchema, Value};

/// Workload ID used by the run driver for the load phase.
pub const LOAD_WORKLOAD_ID: &str = "load";

/// Settings the load workload needs from the run configuration.
#[derive(Clone, Debug, Default)]
pub struct LoadSettings {
    pub scenarios: Vec<Scenario>,
    /// Replaces every scenario's row count when set.
    pub row_count_override: Option<u64>,
    /// Refresh table statistics after loading.
    pub update_statistics: bool,
}

/// Loads generated rows for each scenario.
pub struct LoadWorkload {
    id: WorkloadId,
    settings: LoadSettings,
    store: Arc<dyn DataStore>,
}

impl LoadWorkload {
    pub fn new(settings: LoadSettings, store: Arc<dyn DataStore>) -> Self {
        Self {
            id: WorkloadId::new(LOAD_WORKLOAD_ID),
            settings,
            store,
        }
    }

    async fn load_scenario(
        &self,
        scenario: &Scenario,
        ctx: &WorkloadContext,
    ) -> Result<u64, WorkloadError> {
        let schema = self.store.schema(&scenario.table).ok_or_else(|| {
            WorkloadError::Store(format!(
                "table {} does not exist (apply its schema before loading)",
                scenario.table
            ))
        })?;
        let schema = Arc::new(schema);

        let row_count = scenario.effective_row_count(self.settings.row_count_override);
        if row_count > MAX_ROW_COUNT {
            return Err(WorkloadError::failed(format!(
                "scenario {} asks for {} rows, more than the {} keys available",
                scenario.name, row_count, MAX_ROW_COUNT
            )));
        }
        let batch_size = scenario.batch_size as u64;
        let started = Instant::now();

        info!(
            scenario = %scenario.name,
            table = %scenario.table,
            rows = row_count,
            batch_size,
            writers = scenario.writer_threads,
            "Loading scenario"
        );

        let mut in_flight: VecDeque<TaskHandle<Result<u64, StoreError>>> = VecDeque::new();
        let mut written = 0u64;
        let mut next = 0u64;

        while next < row_count {
            if in_flight.len() >= scenario.writer_threads {
                if let Some(batch) = in_flight.pop_front() {
                    written += batch.join().await??;
                }
            }

            let range = next..(next + batch_size).min(row_count);
            next = range.end;

            let store = Arc::clone(&self.store);
            let schema = Arc::clone(&schema);
            in_flight.push_back(ctx.pool().submit(run_blocking(move || {
                let rows = generate_rows(&schema, range);
                store.upsert(&schema.name, rows)
            }))?);
        }

        while let Some(batch) = in_flight.pop_front() {
            written += batch.join().await??;
        }

        if self.settings.update_statistics {
            self.store.update_statistics(&scenario.table)?;
        }

        let elapsed = started.elapsed();
        info!(
            scenario = %scenario.name,
            rows = written,
            elapsed_ms = elapsed.as_millis(),
            rows_per_sec = (written as f64 / elapsed.as_secs_f64().max(f64::EPSILON)) as u64,
            "Scenario loaded"
        );
        Ok(written)
    }
}

impl Workload for LoadWorkload {
    fn id(&self) -> WorkloadId {
        self.id.clone()
    }

    fn name(&self) -> &str {
        "Load"
    }

    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Load
    }

    fn run<'a>(&'a self, ctx: &'a WorkloadContext) -> WorkloadFuture<'a> {
        Box::pin(async move {
            let mut total = 0u64;
            for scenario in &self.settings.scenarios {
                total += self.load_scenario(scenario, ctx).await?;
            }
            self.store.flush()?;
            debug!("Store flushed after load");

            Ok(WorkloadOutcome::new(
                total,
                format!(
                    "loaded {} rows across {} scenario(s)",
                    total,
                    self.settings.scenarios.len()
                ),
            ))
        })
    }
}

/// Generates the rows for a key range. Keys above `i64::MAX` are skipped.
pub fn generate_rows(schema: &TableSchema, keys: Range<u64>) -> Vec<Row> {
    keys.map_while(|key| i64::try_from(key).ok())
        .map(|key| generate_row(schema, key))
        .collect()
}

/// Generates one row from its key.
pub fn generate_row(schema: &TableSchema, key: i64) -> Row {
    schema
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| match column.ty {
            ColumnType::Key => Value::Int(key),
            ColumnType::Int => Value::Int(
                key.wrapping_mul(31)
                    .wrapping_add(index as i64 * 7)
                    .rem_euclid(10_000),
            ),
            ColumnType::Text => Value::Text(format!("{}-{}", column.name, key)),
        })
        .collect()
}
