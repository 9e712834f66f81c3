//! Error types for the worker pool, workloads and the workload executor.

use super::workload::WorkloadId;
use thiserror::Error;

/// Errors raised by the [`WorkerPool`](super::WorkerPool).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The pool has begun shutdown and no longer accepts work.
    #[error("worker pool is closed")]
    Closed,

    /// The submitted task panicked while running.
    #[error("pool task panicked: {0}")]
    Panicked(String),

    /// The task was discarded before producing a result.
    #[error("pool task was dropped before completion")]
    Dropped,
}

/// Failure reported by a workload's own logic.
///
/// Workload implementations map their collaborator errors into this type so
/// the executor can report them without knowing what the workload does.
#[derive(Debug, Clone, Error)]
pub enum WorkloadError {
    /// Generic failure with a message.
    #[error("{0}")]
    Failed(String),

    /// The backing store rejected an operation.
    #[error("store error: {0}")]
    Store(String),

    /// Reading or writing workload output failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Functional verification found a mismatch.
    #[error("verification failed for {query}: {reason}")]
    Verification { query: String, reason: String },

    /// A task the workload fanned out on the shared pool failed.
    #[error("fan-out task failed: {0}")]
    Pool(#[from] PoolError),
}

impl WorkloadError {
    /// Creates a generic failure.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

impl From<std::io::Error> for WorkloadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Errors surfaced by the [`WorkloadExecutor`](super::WorkloadExecutor).
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    /// Submission after shutdown began.
    #[error("workload executor is shut down")]
    Closed,

    /// `get` on a workload that was never added or was already joined.
    #[error("workload '{0}' is not registered")]
    UnknownWorkload(WorkloadId),

    /// `add` with an id that is still registered.
    #[error("workload '{0}' is already registered")]
    DuplicateWorkload(WorkloadId),

    /// The workload ran and reported a failure.
    #[error("workload '{id}' failed: {source}")]
    Workload {
        id: WorkloadId,
        #[source]
        source: WorkloadError,
    },

    /// The pool could not run the workload to completion.
    #[error("workload '{id}' did not complete: {source}")]
    Pool {
        id: WorkloadId,
        #[source]
        source: PoolError,
    },
}

impl ExecutorError {
    /// Returns the workload this error refers to, if any.
    pub fn workload_id(&self) -> Option<&WorkloadId> {
        match self {
            Self::Closed => None,
            Self::UnknownWorkload(id)
            | Self::DuplicateWorkload(id)
            | Self::Workload { id, .. }
            | Self::Pool { id, .. } => Some(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_display() {
        assert_eq!(PoolError::Closed.to_string(), "worker pool is closed");
        assert_eq!(
            PoolError::Panicked("boom".into()).to_string(),
            "pool task panicked: boom"
        );
    }

    #[test]
    fn test_workload_error_from_pool_error() {
        let err: WorkloadError = PoolError::Closed.into();
        assert!(matches!(err, WorkloadError::Pool(PoolError::Closed)));
    }

    #[test]
    fn test_executor_error_workload_id() {
        let id = WorkloadId::new("load");
        let err = ExecutorError::Workload {
            id: id.clone(),
            source: WorkloadError::failed("disk full"),
        };
        assert_eq!(err.workload_id(), Some(&id));
        assert_eq!(err.to_string(), "workload 'load' failed: disk full");
        assert!(ExecutorError::Closed.workload_id().is_none());
    }
}
