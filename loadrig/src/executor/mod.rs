//! Workload Executor Framework
//!
//! This module runs the independent workloads of a benchmark run (data load,
//! query execution, monitoring) concurrently on one bounded worker pool and
//! lets the caller join each of them individually or all at once.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     WorkloadExecutor                         │
//! │  add / get / get_all / request_stop / shutdown              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │ Registry        │  │ WorkerPool  │  │ Telemetry       │  │
//! │  │ id -> handle    │  │ FIFO, N     │  │ Sink            │  │
//! │  └─────────────────┘  └─────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Workload**: A named unit of work with a single result. Implementations
//!   receive a [`WorkloadContext`] carrying their stop token and the shared
//!   pool, so they can fan out sub-tasks.
//!
//! - **Pool**: A fixed number of slots. Submissions beyond the number of free
//!   slots queue in FIFO order.
//!
//! - **Stop**: Cooperative. Only workloads that poll their context observe a
//!   stop request; load and query workloads run to completion.
//!
//! # Example
//!
//! ```ignore
//! use loadrig::executor::{ExecutorConfig, WorkloadExecutor};
//!
//! let executor = WorkloadExecutor::new(ExecutorConfig::with_pool_size(4));
//! let load = executor.add(load_workload)?;
//! executor.add(monitor_workload)?;
//!
//! executor.get(&load).await?;
//! executor.request_stop(&monitor_id)?;
//! executor.get_all().await?;
//! executor.shutdown().await;
//! ```

mod config;
mod context;
mod core;
mod error;
mod handle;
mod pool;
mod telemetry;
mod workload;

// Workload types
pub use workload::{
    Workload, WorkloadFuture, WorkloadId, WorkloadKind, WorkloadOutcome, WorkloadReport,
};

// Context
pub use context::WorkloadContext;

// Handle and status
pub use handle::{WorkloadHandle, WorkloadStatus};

// Pool
pub use pool::{PoolStats, TaskHandle, WorkerPool};

// Errors
pub use error::{ExecutorError, PoolError, WorkloadError};

// Telemetry
pub use telemetry::{
    MultiplexTelemetrySink, NullTelemetrySink, TelemetryEvent, TelemetrySink, TracingTelemetrySink,
};

// Executor
pub use config::ExecutorConfig;
pub use core::{DrainOutcome, WorkloadExecutor};
