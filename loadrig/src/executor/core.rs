//! Workload executor - registry, submission and join primitives.
//!
//! The [`WorkloadExecutor`] owns the run's [`WorkerPool`] and a registry of
//! in-flight workloads keyed by [`WorkloadId`]. Every registry mutation goes
//! through the executor's methods under one mutex, and the lock is never
//! held across an `.await`.
//!
//! # Failure semantics
//!
//! A workload failure is returned by whichever join observes it. It is never
//! retried and never cancels sibling workloads.

use super::config::ExecutorConfig;
use super::context::WorkloadContext;
use super::error::ExecutorError;
use super::handle::{WorkloadCompletion, WorkloadHandle, WorkloadStatus};
use super::pool::WorkerPool;
use super::telemetry::{NullTelemetrySink, TelemetryEvent, TelemetrySink};
use super::workload::{Workload, WorkloadId, WorkloadReport};
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

// =============================================================================
// Workload Executor
// =============================================================================

/// Scheduler and registry for the workloads of a single run.
pub struct WorkloadExecutor {
    pool: Arc<WorkerPool>,
    registry: Mutex<HashMap<WorkloadId, WorkloadHandle>>,
    closed: AtomicBool,
    telemetry: Arc<dyn TelemetrySink>,
}

impl WorkloadExecutor {
    /// Creates an executor and its worker pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_telemetry(config, Arc::new(NullTelemetrySink))
    }

    /// Creates an executor that reports lifecycle events to `telemetry`.
    pub fn with_telemetry(config: ExecutorConfig, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            pool: Arc::new(WorkerPool::new(config.pool_size)),
            registry: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
            telemetry,
        }
    }

    /// Registers a workload and submits it to the pool. Returns immediately.
    pub fn add(&self, workload: impl Workload) -> Result<WorkloadId, ExecutorError> {
        self.add_boxed(Box::new(workload))
    }

    /// Registers a boxed workload and submits it to the pool.
    ///
    /// Fails with [`ExecutorError::Closed`] once shutdown has begun and with
    /// [`ExecutorError::DuplicateWorkload`] if the ID is still registered.
    pub fn add_boxed(&self, workload: Box<dyn Workload>) -> Result<WorkloadId, ExecutorError> {
        let mut registry = self.registry.lock();

        if self.closed.load(Ordering::SeqCst) {
            return Err(ExecutorError::Closed);
        }

        let id = workload.id();
        if registry.contains_key(&id) {
            return Err(ExecutorError::DuplicateWorkload(id));
        }

        let name = workload.name().to_string();
        let kind = workload.kind();
        let (status_tx, status_rx) = watch::channel(WorkloadStatus::Queued);
        let stop = CancellationToken::new();
        let ctx = WorkloadContext::new(id.clone(), stop.clone(), Arc::clone(&self.pool));
        let telemetry = Arc::clone(&self.telemetry);

        // Emitted before submission so it always precedes WorkloadStarted.
        self.telemetry.emit(TelemetryEvent::WorkloadAdded {
            id: id.clone(),
            name: name.clone(),
            kind,
        });

        let completion = self
            .pool
            .submit(run_workload(workload, ctx, status_tx, telemetry))
            .map_err(|_| ExecutorError::Closed)?;

        registry.insert(
            id.clone(),
            WorkloadHandle::new(id.clone(), name, kind, status_rx, stop, completion),
        );

        Ok(id)
    }

    /// Waits for one workload to finish and removes it from the registry.
    ///
    /// The workload's failure is returned, not swallowed. Joining an ID that
    /// was never added, or was already joined, is
    /// [`ExecutorError::UnknownWorkload`].
    ///
    /// The handle stays registered until the workload is terminal, so a
    /// caller that drops this future mid-wait leaves the workload to a later
    /// join or to shutdown.
    pub async fn get(&self, id: &WorkloadId) -> Result<WorkloadReport, ExecutorError> {
        let mut status_rx = self
            .registry
            .lock()
            .get(id)
            .map(WorkloadHandle::status_receiver)
            .ok_or_else(|| ExecutorError::UnknownWorkload(id.clone()))?;

        // A closed channel means the pool task is gone; the join reports why.
        let _ = status_rx.wait_for(WorkloadStatus::is_terminal).await;

        let handle = self
            .registry
            .lock()
            .remove(id)
            .ok_or_else(|| ExecutorError::UnknownWorkload(id.clone()))?;

        let result = handle.join().await;
        self.telemetry
            .emit(TelemetryEvent::WorkloadJoined { id: id.clone() });
        result
    }

    /// Waits for every registered workload and empties the registry.
    ///
    /// All workloads are allowed to finish. The first failure to be observed
    /// is returned; every other failure is logged.
    pub async fn get_all(&self) -> Result<Vec<WorkloadReport>, ExecutorError> {
        self.drain().await.into_result()
    }

    /// Waits for every registered workload and returns all outcomes.
    ///
    /// Workloads added while the drain is in progress are drained too.
    pub async fn drain(&self) -> DrainOutcome {
        let mut outcome = DrainOutcome::default();

        loop {
            let handles: Vec<WorkloadHandle> =
                self.registry.lock().drain().map(|(_, h)| h).collect();
            if handles.is_empty() {
                break;
            }

            let mut pending: FuturesUnordered<_> = handles
                .into_iter()
                .map(|handle| {
                    let id = handle.id().clone();
                    async move { (id, handle.join().await) }
                })
                .collect();

            while let Some((id, result)) = pending.next().await {
                self.telemetry.emit(TelemetryEvent::WorkloadJoined { id });
                match result {
                    Ok(report) => outcome.reports.push(report),
                    Err(e) => outcome.failures.push(e),
                }
            }
        }

        outcome
    }

    /// Requests a cooperative stop of one registered workload.
    pub fn request_stop(&self, id: &WorkloadId) -> Result<(), ExecutorError> {
        let registry = self.registry.lock();
        let handle = registry
            .get(id)
            .ok_or_else(|| ExecutorError::UnknownWorkload(id.clone()))?;
        handle.request_stop();
        drop(registry);

        self.telemetry
            .emit(TelemetryEvent::StopRequested { id: id.clone() });
        Ok(())
    }

    /// Returns the pool shared by all workloads of this run.
    pub fn pool(&self) -> Arc<WorkerPool> {
        Arc::clone(&self.pool)
    }

    /// Returns the number of registered (not yet joined) workloads.
    pub fn outstanding(&self) -> usize {
        self.registry.lock().len()
    }

    /// Returns the current status of a registered workload.
    pub fn status(&self, id: &WorkloadId) -> Option<WorkloadStatus> {
        self.registry.lock().get(id).map(|h| h.status())
    }

    /// Returns true once shutdown has begun.
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops admission and releases the worker pool.
    ///
    /// Irreversible and idempotent. Workloads still registered are asked to
    /// stop, allowed to finish, and their outcomes are logged since nobody
    /// joined them. The pool is closed only after they have finished, so
    /// work they still fan out is admitted.
    pub async fn shutdown(&self) {
        let abandoned: Vec<WorkloadHandle> = {
            let mut registry = self.registry.lock();
            if self.closed.swap(true, Ordering::SeqCst) {
                return;
            }
            registry.drain().map(|(_, h)| h).collect()
        };

        self.telemetry.emit(TelemetryEvent::ShutdownStarted {
            outstanding: abandoned.len(),
        });

        for handle in &abandoned {
            warn!(
                workload = %handle.id(),
                status = %handle.status(),
                "Workload was never joined, requesting stop before shutdown"
            );
            handle.request_stop();
        }

        for handle in abandoned {
            let id = handle.id().clone();
            match handle.join().await {
                Ok(report) => warn!(
                    workload = %id,
                    status = %report.status,
                    "Unjoined workload finished during shutdown"
                ),
                Err(e) => error!(workload = %id, error = %e, "Unjoined workload failed"),
            }
        }

        self.pool.shutdown().await;

        self.telemetry.emit(TelemetryEvent::ShutdownCompleted);
    }
}

impl Drop for WorkloadExecutor {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            warn!(
                outstanding = self.registry.get_mut().len(),
                "Workload executor dropped without shutdown"
            );
        }
    }
}

impl std::fmt::Debug for WorkloadExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkloadExecutor")
            .field("pool", &self.pool)
            .field("outstanding", &self.outstanding())
            .field("closed", &self.is_shut_down())
            .finish()
    }
}

/// Pool task wrapping a workload's run with status and telemetry updates.
async fn run_workload(
    workload: Box<dyn Workload>,
    ctx: WorkloadContext,
    status_tx: watch::Sender<WorkloadStatus>,
    telemetry: Arc<dyn TelemetrySink>,
) -> WorkloadCompletion {
    let status = StatusPublisher(status_tx);
    let id = ctx.workload_id().clone();

    status.publish(WorkloadStatus::Running);
    telemetry.emit(TelemetryEvent::WorkloadStarted { id: id.clone() });

    let started = Instant::now();
    let result = workload.run(&ctx).await;
    let elapsed = started.elapsed();

    let terminal = match &result {
        Ok(_) if ctx.stop_requested() => WorkloadStatus::Stopped,
        Ok(_) => WorkloadStatus::Succeeded,
        Err(_) => WorkloadStatus::Failed,
    };
    status.publish(terminal);
    telemetry.emit(TelemetryEvent::WorkloadFinished {
        id,
        status: terminal,
        duration: elapsed,
    });

    (result, elapsed)
}

/// Publishes workload status; marks the workload failed if dropped early
/// (the run panicked).
struct StatusPublisher(watch::Sender<WorkloadStatus>);

impl StatusPublisher {
    fn publish(&self, status: WorkloadStatus) {
        self.0.send_replace(status);
    }
}

impl Drop for StatusPublisher {
    fn drop(&mut self) {
        if !self.0.borrow().is_terminal() {
            self.0.send_replace(WorkloadStatus::Failed);
        }
    }
}

// =============================================================================
// Drain Outcome
// =============================================================================

/// Everything observed by a drain.
#[derive(Debug, Default)]
pub struct DrainOutcome {
    /// Reports of workloads that finished without failure.
    pub reports: Vec<WorkloadReport>,
    /// Failures in the order they were observed.
    pub failures: Vec<ExecutorError>,
}

impl DrainOutcome {
    /// Returns the first observed failure, if any.
    pub fn first_failure(&self) -> Option<&ExecutorError> {
        self.failures.first()
    }

    /// Returns true if no workload failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts into a result carrying the first failure.
    ///
    /// Later failures are logged so that none disappear silently.
    pub fn into_result(self) -> Result<Vec<WorkloadReport>, ExecutorError> {
        let mut failures = self.failures.into_iter();
        match failures.next() {
            None => Ok(self.reports),
            Some(first) => {
                for other in failures {
                    error!(error = %other, "Additional workload failure during drain");
                }
                if !self.reports.is_empty() {
                    warn!(
                        completed = self.reports.len(),
                        "Drain failed; other workloads completed and produced partial results"
                    );
                }
                Err(first)
            }
        }
    }
}
