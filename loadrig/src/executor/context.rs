//! Workload execution context.
//!
//! The [`WorkloadContext`] gives a running workload:
//! - its own ID for logging
//! - cooperative stop checking via a `CancellationToken`
//! - the shared [`WorkerPool`] for fanning out sub-tasks
//!
//! # Example
//!
//! ```ignore
//! fn run<'a>(&'a self, ctx: &'a WorkloadContext) -> WorkloadFuture<'a> {
//!     Box::pin(async move {
//!         while !ctx.stop_requested() {
//!             take_sample().await;
//!         }
//!         Ok(WorkloadOutcome::default())
//!     })
//! }
//! ```

use super::pool::WorkerPool;
use super::workload::WorkloadId;
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Execution context passed to [`Workload::run`](super::Workload::run).
///
/// Created by the executor when the workload is added. The stop token is
/// shared with the workload's handle so `request_stop` reaches the running
/// code.
#[derive(Clone)]
pub struct WorkloadContext {
    workload_id: WorkloadId,
    stop: CancellationToken,
    pool: Arc<WorkerPool>,
}

impl WorkloadContext {
    /// Creates a new context.
    pub fn new(workload_id: WorkloadId, stop: CancellationToken, pool: Arc<WorkerPool>) -> Self {
        Self {
            workload_id,
            stop,
            pool,
        }
    }

    /// Returns the workload's ID.
    pub fn workload_id(&self) -> &WorkloadId {
        &self.workload_id
    }

    /// Returns true once a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Resolves when a stop is requested.
    ///
    /// Intended for `tokio::select!` between sampling ticks.
    pub fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.stop.cancelled()
    }

    /// Returns the pool shared by every workload of the run.
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }
}

impl std::fmt::Debug for WorkloadContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkloadContext")
            .field("workload_id", &self.workload_id)
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_stop_flag() {
        let token = CancellationToken::new();
        let pool = Arc::new(WorkerPool::new(1));
        let ctx = WorkloadContext::new(WorkloadId::new("monitor"), token.clone(), pool.clone());

        assert_eq!(ctx.workload_id().as_str(), "monitor");
        assert!(!ctx.stop_requested());

        token.cancel();
        assert!(ctx.stop_requested());
        ctx.stopped().await;

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_context_exposes_shared_pool() {
        let pool = Arc::new(WorkerPool::new(3));
        let ctx = WorkloadContext::new(WorkloadId::new("q"), CancellationToken::new(), pool.clone());

        assert!(Arc::ptr_eq(ctx.pool(), &pool));
        assert_eq!(ctx.pool().size(), 3);

        pool.shutdown().await;
    }
}
