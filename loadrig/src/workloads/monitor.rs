//! Monitoring workload.
//!
//! [`MonitorWorkload`] takes a sample on start and then every interval until
//! a stop is requested. Samples are buffered and written to a [`SampleSink`]
//! every `flush_every` samples and once more when the workload stops.
//!
//! A stop request never interrupts a sample in progress: the sample is
//! finished, buffered and flushed before the workload completes.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::executor::{
    Workload, WorkloadContext, WorkloadError, WorkloadFuture, WorkloadId, WorkloadKind,
    WorkloadOutcome,
};
use crate::store::DataStore;

/// Workload ID used by the run driver for the monitor.
pub const MONITOR_WORKLOAD_ID: &str = "monitor";

/// File name of the monitor output under the results directory.
pub const MONITOR_FILE: &str = "monitor.csv";

// =============================================================================
// Settings and samples
// =============================================================================

/// Settings the monitor workload needs from the run configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorSettings {
    pub frequency: Duration,
    pub flush_every: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            frequency: Duration::from_millis(crate::config::DEFAULT_MONITOR_FREQUENCY_MS),
            flush_every: crate::config::DEFAULT_MONITOR_FLUSH_EVERY,
        }
    }
}

/// One monitor observation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sample {
    pub sequence: u64,
    pub taken_at: DateTime<Utc>,
    pub pool_active: usize,
    pub pool_queued: usize,
    pub metrics: BTreeMap<String, f64>,
}

pub type SampleFuture<'a> =
    Pin<Box<dyn Future<Output = Result<BTreeMap<String, f64>, WorkloadError>> + Send + 'a>>;

/// Source of metrics for each sample.
pub trait Sampler: Send + Sync {
    fn sample(&self) -> SampleFuture<'_>;
}

/// Destination of flushed samples.
pub trait SampleSink: Send + Sync {
    fn write(&self, samples: &[Sample]) -> Result<(), WorkloadError>;
}

// =============================================================================
// Built-in samplers and sinks
// =============================================================================

/// Samples the store's counters.
pub struct StoreSampler {
    store: Arc<dyn DataStore>,
}

impl StoreSampler {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }
}

impl Sampler for StoreSampler {
    fn sample(&self) -> SampleFuture<'_> {
        Box::pin(async move {
            let stats = self.store.stats();
            Ok(BTreeMap::from([
                ("tables".to_string(), stats.tables as f64),
                ("total_rows".to_string(), stats.total_rows as f64),
                ("rows_upserted".to_string(), stats.rows_upserted as f64),
                ("queries_executed".to_string(), stats.queries_executed as f64),
            ]))
        })
    }
}

/// Appends samples to a CSV file, one line per metric.
#[derive(Debug)]
pub struct CsvSampleSink {
    path: PathBuf,
    header_written: Mutex<bool>,
}

impl CsvSampleSink {
    /// Creates a sink writing to `path`. An existing file is appended to.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let header_written = Mutex::new(path.exists());
        Self {
            path,
            header_written,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSink for CsvSampleSink {
    fn write(&self, samples: &[Sample]) -> Result<(), WorkloadError> {
        let mut header_written = self.header_written.lock();

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let csv_err = |e: csv::Error| WorkloadError::Io(e.to_string());
        if !*header_written {
            writer
                .write_record([
                    "sequence",
                    "taken_at",
                    "pool_active",
                    "pool_queued",
                    "metric",
                    "value",
                ])
                .map_err(csv_err)?;
            *header_written = true;
        }

        for sample in samples {
            let taken_at = sample.taken_at.to_rfc3339();
            for (metric, value) in &sample.metrics {
                writer
                    .write_record([
                        sample.sequence.to_string(),
                        taken_at.clone(),
                        sample.pool_active.to_string(),
                        sample.pool_queued.to_string(),
                        metric.clone(),
                        value.to_string(),
                    ])
                    .map_err(csv_err)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// Keeps flushed samples in memory.
#[derive(Debug, Default)]
pub struct MemorySampleSink {
    samples: Mutex<Vec<Sample>>,
    flushes: Mutex<usize>,
}

impl MemorySampleSink {
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().clone()
    }

    /// Number of `write` calls received.
    pub fn flushes(&self) -> usize {
        *self.flushes.lock()
    }
}

impl SampleSink for MemorySampleSink {
    fn write(&self, samples: &[Sample]) -> Result<(), WorkloadError> {
        self.samples.lock().extend_from_slice(samples);
        *self.flushes.lock() += 1;
        Ok(())
    }
}

// =============================================================================
// Monitor workload
// =============================================================================

/// Periodic sampler that runs until stopped.
pub struct MonitorWorkload {
    id: WorkloadId,
    settings: MonitorSettings,
    sampler: Arc<dyn Sampler>,
    sink: Arc<dyn SampleSink>,
}

impl MonitorWorkload {
    pub fn new(
        settings: MonitorSettings,
        sampler: Arc<dyn Sampler>,
        sink: Arc<dyn SampleSink>,
    ) -> Self {
        Self {
            id: WorkloadId::new(MONITOR_WORKLOAD_ID),
            settings,
            sampler,
            sink,
        }
    }

    fn flush(&self, buffer: &mut Vec<Sample>) -> Result<(), WorkloadError> {
        if buffer.is_empty() {
            return Ok(());
        }
        self.sink.write(buffer)?;
        debug!(samples = buffer.len(), "Monitor samples flushed");
        buffer.clear();
        Ok(())
    }

    async fn sample_until_stopped(
        &self,
        ctx: &WorkloadContext,
        buffer: &mut Vec<Sample>,
    ) -> Result<u64, WorkloadError> {
        let period = self.settings.frequency.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut taken = 0u64;

        // The first sample is taken before the first stop check, so a monitor
        // stopped right after it starts still records one observation.
        loop {
            let metrics = self.sampler.sample().await?;
            let pool = ctx.pool().stats();
            buffer.push(Sample {
                sequence: taken,
                taken_at: Utc::now(),
                pool_active: pool.active,
                pool_queued: pool.queued,
                metrics,
            });
            taken += 1;

            if buffer.len() >= self.settings.flush_every {
                self.flush(buffer)?;
            }

            tokio::select! {
                biased;
                _ = ctx.stopped() => break,
                _ = interval.tick() => {}
            }
        }

        Ok(taken)
    }
}

impl Workload for MonitorWorkload {
    fn id(&self) -> WorkloadId {
        self.id.clone()
    }

    fn name(&self) -> &str {
        "Monitor"
    }

    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Monitor
    }

    fn run<'a>(&'a self, ctx: &'a WorkloadContext) -> WorkloadFuture<'a> {
        Box::pin(async move {
            info!(
                frequency_ms = self.settings.frequency.as_millis(),
                flush_every = self.settings.flush_every,
                "Monitor started"
            );

            let mut buffer = Vec::with_capacity(self.settings.flush_every);
            let sampled = self.sample_until_stopped(ctx, &mut buffer).await;

            // Buffered samples are written even when sampling failed.
            let flushed = self.flush(&mut buffer);
            let taken = match (sampled, flushed) {
                (Ok(taken), Ok(())) => taken,
                (Err(e), flushed) => {
                    if let Err(flush_err) = flushed {
                        warn!(error = %flush_err, "Monitor flush failed after sampling error");
                    }
                    return Err(e);
                }
                (Ok(_), Err(e)) => return Err(e),
            };

            info!(samples = taken, "Monitor stopped");
            Ok(WorkloadOutcome::new(taken, format!("{} samples", taken)))
        })
    }
}
