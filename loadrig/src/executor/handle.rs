//! Workload handle for status queries, stop requests and joining.
//!
//! A [`WorkloadHandle`] is created when a workload is added to the executor
//! and lives in the executor's registry until the workload is joined.

use super::error::{ExecutorError, WorkloadError};
use super::pool::TaskHandle;
use super::workload::{WorkloadId, WorkloadKind, WorkloadOutcome, WorkloadReport};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// What the pool task hands back when a workload finishes.
pub(crate) type WorkloadCompletion = (Result<WorkloadOutcome, WorkloadError>, Duration);

/// Handle to a submitted workload.
pub struct WorkloadHandle {
    id: WorkloadId,
    name: String,
    kind: WorkloadKind,
    status_rx: watch::Receiver<WorkloadStatus>,
    stop: CancellationToken,
    completion: TaskHandle<WorkloadCompletion>,
}

impl WorkloadHandle {
    pub(crate) fn new(
        id: WorkloadId,
        name: String,
        kind: WorkloadKind,
        status_rx: watch::Receiver<WorkloadStatus>,
        stop: CancellationToken,
        completion: TaskHandle<WorkloadCompletion>,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            status_rx,
            stop,
            completion,
        }
    }

    /// Returns the workload's ID.
    pub fn id(&self) -> &WorkloadId {
        &self.id
    }

    /// Returns the workload's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the workload's kind.
    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }

    /// Returns the most recent status without waiting.
    pub fn status(&self) -> WorkloadStatus {
        *self.status_rx.borrow()
    }

    /// Returns a receiver that observes status changes.
    pub(crate) fn status_receiver(&self) -> watch::Receiver<WorkloadStatus> {
        self.status_rx.clone()
    }

    /// Requests a cooperative stop. Workloads without a stop contract ignore it.
    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    /// Returns true once a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Waits for the workload to reach a terminal state.
    ///
    /// Success yields a [`WorkloadReport`]; a workload failure or a pool
    /// failure is returned as the matching [`ExecutorError`].
    pub async fn join(self) -> Result<WorkloadReport, ExecutorError> {
        let Self {
            id,
            name,
            kind,
            status_rx,
            completion,
            ..
        } = self;

        let completion = completion.join().await;
        // The pool task publishes the terminal status before its result.
        let status = match *status_rx.borrow() {
            WorkloadStatus::Stopped => WorkloadStatus::Stopped,
            _ => WorkloadStatus::Succeeded,
        };

        match completion {
            Ok((Ok(outcome), elapsed)) => Ok(WorkloadReport {
                id,
                name,
                kind,
                status,
                elapsed,
                outcome,
            }),
            Ok((Err(source), _)) => Err(ExecutorError::Workload { id, source }),
            Err(source) => Err(ExecutorError::Pool { id, source }),
        }
    }
}

impl std::fmt::Debug for WorkloadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkloadHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("status", &self.status())
            .finish()
    }
}

/// Workload execution status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WorkloadStatus {
    /// Submitted, waiting for a pool worker.
    #[default]
    Queued,

    /// Running on a pool worker.
    Running,

    /// Finished successfully.
    Succeeded,

    /// Finished after a stop request.
    Stopped,

    /// Finished with a failure.
    Failed,
}

impl WorkloadStatus {
    /// Returns true if the workload has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Stopped | Self::Failed)
    }

    /// Returns true if the workload finished without failure.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Stopped)
    }
}

impl std::fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "Queued"),
            Self::Running => write!(f, "Running"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Stopped => write!(f, "Stopped"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}
