//! Workload trait and related types.
//!
//! A workload is a named unit of benchmark work (data load, query execution,
//! monitoring, or anything else implementing [`Workload`]). The executor runs
//! it on the shared worker pool and never inspects how it computes its result.
//!
//! # Example
//!
//! ```ignore
//! use loadrig::executor::{Workload, WorkloadContext, WorkloadId, WorkloadOutcome};
//!
//! struct Warmup { id: WorkloadId }
//!
//! impl Workload for Warmup {
//!     fn id(&self) -> WorkloadId { self.id.clone() }
//!     fn name(&self) -> &str { "Warmup" }
//!     fn run<'a>(&'a self, _ctx: &'a WorkloadContext) -> WorkloadFuture<'a> {
//!         Box::pin(async { Ok(WorkloadOutcome::new(0, "warmed up")) })
//!     }
//! }
//! ```

use super::context::WorkloadContext;
use super::error::WorkloadError;
use super::handle::WorkloadStatus;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Global counter for generating unique workload IDs.
static WORKLOAD_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Boxed future returned by [`Workload::run`].
pub type WorkloadFuture<'a> =
    Pin<Box<dyn Future<Output = Result<WorkloadOutcome, WorkloadError>> + Send + 'a>>;

/// Unique identifier for a workload, used for targeted joins.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct WorkloadId(String);

impl WorkloadId {
    /// Creates a workload ID with the given string value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a unique auto-generated ID of the form `{prefix}-{counter}`.
    pub fn auto(prefix: &str) -> Self {
        let counter = WORKLOAD_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{}", prefix, counter))
    }

    /// Returns the string value of this ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkloadId({})", self.0)
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WorkloadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WorkloadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Coarse classification used for logging and telemetry only.
///
/// The executor never branches on the kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    Load,
    Query,
    Monitor,
    #[default]
    Custom,
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Query => write!(f, "query"),
            Self::Monitor => write!(f, "monitor"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// A unit of benchmark work with a start/await/stop contract.
///
/// # Lifecycle
///
/// 1. Created by the run driver from configuration
/// 2. Added to the executor, which submits [`run`](Workload::run) to the pool
/// 3. Joined through the executor (`get` or `get_all`)
///
/// A workload is moved into the executor on `add`, so the same instance can
/// never be submitted twice.
///
/// # Stopping
///
/// Stop requests arrive through [`WorkloadContext::stop_requested`]. Workloads
/// that run to completion simply ignore it.
///
/// # Isolation
///
/// Workloads may write to shared output (files, logs) but must not share
/// in-memory mutable state with other workloads.
pub trait Workload: Send + Sync + 'static {
    /// Returns the identity used to look the workload up for targeted joins.
    fn id(&self) -> WorkloadId;

    /// Returns a human-readable name for logging.
    fn name(&self) -> &str;

    /// Returns the workload's classification. Defaults to `Custom`.
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Custom
    }

    /// Runs the workload to a terminal state.
    ///
    /// Called exactly once, on a pool worker.
    fn run<'a>(&'a self, ctx: &'a WorkloadContext) -> WorkloadFuture<'a>;
}

/// What a workload reports on success.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkloadOutcome {
    /// Units of work processed (rows written, queries run, samples taken).
    pub items: u64,
    /// Short human-readable summary.
    pub summary: String,
}

impl WorkloadOutcome {
    /// Creates an outcome.
    pub fn new(items: u64, summary: impl Into<String>) -> Self {
        Self {
            items,
            summary: summary.into(),
        }
    }
}

/// Terminal report for a joined workload.
#[derive(Clone, Debug)]
pub struct WorkloadReport {
    /// Workload identity.
    pub id: WorkloadId,
    /// Workload name.
    pub name: String,
    /// Workload classification.
    pub kind: WorkloadKind,
    /// Terminal status (`Succeeded` or `Stopped`).
    pub status: WorkloadStatus,
    /// Time spent running on a pool worker.
    pub elapsed: Duration,
    /// What the workload returned.
    pub outcome: WorkloadOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_id_new() {
        let id = WorkloadId::new("load");
        assert_eq!(id.as_str(), "load");
    }

    #[test]
    fn test_workload_id_auto_is_unique() {
        let id1 = WorkloadId::auto("query");
        let id2 = WorkloadId::auto("query");
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("query-"));
    }

    #[test]
    fn test_workload_id_display_and_from() {
        let id: WorkloadId = "monitor".into();
        assert_eq!(format!("{}", id), "monitor");
        assert_eq!(format!("{:?}", id), "WorkloadId(monitor)");
        let owned: WorkloadId = String::from("x").into();
        assert_eq!(owned.as_str(), "x");
    }

    #[test]
    fn test_workload_kind_display() {
        assert_eq!(WorkloadKind::Load.to_string(), "load");
        assert_eq!(WorkloadKind::Monitor.to_string(), "monitor");
        assert_eq!(WorkloadKind::default(), WorkloadKind::Custom);
    }
}
