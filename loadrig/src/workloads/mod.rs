//! Benchmark workloads.
//!
//! Each workload implements [`crate::executor::Workload`] and receives only
//! the settings struct it needs:
//!
//! - [`LoadWorkload`] / [`LoadSettings`] - generated rows, batched writes
//! - [`QueryWorkload`] / [`QuerySettings`] - timed query sets, result files
//! - [`MonitorWorkload`] / [`MonitorSettings`] - periodic samples until stopped

mod load;
mod monitor;
mod query;

pub use load::{generate_row, generate_rows, LoadSettings, LoadWorkload, LOAD_WORKLOAD_ID};
pub use monitor::{
    CsvSampleSink, MemorySampleSink, MonitorSettings, MonitorWorkload, Sample, SampleFuture,
    SampleSink, Sampler, StoreSampler, MONITOR_FILE, MONITOR_WORKLOAD_ID,
};
pub use query::{QuerySettings, QueryWorkload, EXPORT_DIR, QUERY_WORKLOAD_ID};
