//! Bounded worker pool shared by every workload of a run.
//!
//! The pool owns a fixed number of worker tasks that pull submitted futures
//! from a single FIFO queue. At most `size` submitted futures run at once;
//! the rest wait in submission order.
//!
//! # Shutdown
//!
//! [`WorkerPool::shutdown`] stops admission and then waits for every queued
//! and running task to finish. Benchmark measurements must complete, so
//! tasks are never interrupted. Calling it again is a no-op.
//!
//! Shutting down from inside a pool task would wait on itself; only the
//! owner of the pool (the workload executor) calls it.
//!
//! # Example
//!
//! ```ignore
//! use loadrig::executor::WorkerPool;
//!
//! let pool = WorkerPool::new(4);
//! let handle = pool.submit(async { 40 + 2 })?;
//! assert_eq!(handle.join().await?, 42);
//! pool.shutdown().await;
//! ```

use super::error::PoolError;
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

type QueuedTask = Pin<Box<dyn Future<Output = ()> + Send>>;
type SharedQueue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<QueuedTask>>>;

// =============================================================================
// Counters
// =============================================================================

#[derive(Debug, Default)]
struct PoolCounters {
    queued: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
    completed: AtomicU64,
}

impl PoolCounters {
    fn begin(&self) {
        self.queued.fetch_sub(1, Ordering::SeqCst);
        let current = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.update_peak(current);
    }

    fn finish(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Updates the peak counter if current exceeds it.
    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_active.load(Ordering::SeqCst);
        while current > peak {
            match self.peak_active.compare_exchange_weak(
                peak,
                current,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }
}

/// Point-in-time view of pool occupancy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Configured number of workers.
    pub size: usize,
    /// Tasks currently running.
    pub active: usize,
    /// Tasks submitted but not yet started.
    pub queued: usize,
    /// Highest number of simultaneously running tasks observed.
    pub peak_active: usize,
    /// Tasks that have finished (successfully or not).
    pub completed: u64,
}

// =============================================================================
// Worker Pool
// =============================================================================

/// Fixed-size pool of worker tasks with FIFO admission.
pub struct WorkerPool {
    size: usize,
    sender: Mutex<Option<mpsc::UnboundedSender<QueuedTask>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<PoolCounters>,
}

impl WorkerPool {
    /// Creates a pool with `size` workers.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "pool size must be > 0");

        let (sender, receiver) = mpsc::unbounded_channel();
        let queue: SharedQueue = Arc::new(tokio::sync::Mutex::new(receiver));
        let counters = Arc::new(PoolCounters::default());

        let workers = (0..size)
            .map(|index| {
                tokio::spawn(worker_loop(
                    index,
                    Arc::clone(&queue),
                    Arc::clone(&counters),
                ))
            })
            .collect();

        debug!(size, "Worker pool started");

        Self {
            size,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            counters,
        }
    }

    /// Enqueues a future and returns immediately.
    ///
    /// Fails with [`PoolError::Closed`] once shutdown has begun. A panic in
    /// the future is caught and reported through the returned handle.
    pub fn submit<F, T>(&self, future: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(PoolError::Closed)?;

        let (result_tx, result_rx) = oneshot::channel();
        let task: QueuedTask = Box::pin(async move {
            let result = AssertUnwindSafe(future)
                .catch_unwind()
                .await
                .map_err(|panic| PoolError::Panicked(panic_message(panic.as_ref())));
            // Receiver may have been dropped by a caller that stopped caring.
            let _ = result_tx.send(result);
        });

        self.counters.queued.fetch_add(1, Ordering::SeqCst);
        if sender.send(task).is_err() {
            self.counters.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(PoolError::Closed);
        }

        Ok(TaskHandle { result: result_rx })
    }

    /// Stops admission and waits for queued and running tasks to finish.
    ///
    /// Idempotent: later calls return immediately.
    pub async fn shutdown(&self) {
        let sender = self.sender.lock().take();
        let workers = std::mem::take(&mut *self.workers.lock());

        if sender.is_none() && workers.is_empty() {
            trace!("Worker pool already shut down");
            return;
        }

        // Closing the channel lets workers drain the queue and exit.
        drop(sender);

        debug!(
            queued = self.queued(),
            active = self.active(),
            "Worker pool draining"
        );

        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "Pool worker terminated abnormally");
            }
        }

        debug!(completed = self.stats().completed, "Worker pool shut down");
    }

    /// Returns true once shutdown has begun.
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Returns the configured number of workers.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of running tasks.
    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    /// Returns the number of tasks waiting for a worker.
    pub fn queued(&self) -> usize {
        self.counters.queued.load(Ordering::SeqCst)
    }

    /// Returns the highest number of simultaneously running tasks observed.
    pub fn peak_active(&self) -> usize {
        self.counters.peak_active.load(Ordering::SeqCst)
    }

    /// Returns a snapshot of all counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.size,
            active: self.active(),
            queued: self.queued(),
            peak_active: self.peak_active(),
            completed: self.counters.completed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("active", &self.active())
            .field("queued", &self.queued())
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn worker_loop(index: usize, queue: SharedQueue, counters: Arc<PoolCounters>) {
    trace!(worker = index, "Pool worker started");

    loop {
        // Only one idle worker waits on the channel at a time; tokio's mutex
        // hands the receiver to the others in arrival order.
        let next = {
            let mut receiver = queue.lock().await;
            receiver.recv().await
        };

        let Some(task) = next else {
            break;
        };

        counters.begin();
        task.await;
        counters.finish();
    }

    trace!(worker = index, "Pool worker stopped");
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// =============================================================================
// Task Handle
// =============================================================================

/// Handle to a task submitted to the pool.
pub struct TaskHandle<T> {
    result: oneshot::Receiver<Result<T, PoolError>>,
}

impl<T> TaskHandle<T> {
    /// Waits for the task to finish and returns its output.
    pub async fn join(self) -> Result<T, PoolError> {
        match self.result.await {
            Ok(result) => result,
            Err(_) => Err(PoolError::Dropped),
        }
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_submit_and_join() {
        let pool = WorkerPool::new(2);
        let handle = pool.submit(async { 40 + 2 }).unwrap();
        assert_eq!(handle.join().await, Ok(42));
        pool.shutdown().await;
    }

    #[tokio::test]
    #[should_panic(expected = "pool size must be > 0")]
    async fn test_zero_size_panics() {
        let _ = WorkerPool::new(0);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let pool = WorkerPool::new(1);
        pool.shutdown().await;

        assert!(pool.is_closed());
        let result = pool.submit(async {});
        assert!(matches!(result, Err(PoolError::Closed)));
    }

    #[tokio::test]
    async fn test_panicking_task_is_reported() {
        let pool = WorkerPool::new(1);
        let handle = pool
            .submit(async {
                panic!("sample exploded");
            })
            .unwrap();

        let result: Result<(), PoolError> = handle.join().await;
        assert_eq!(result, Err(PoolError::Panicked("sample exploded".into())));

        // The worker survives the panic.
        let after = pool.submit(async { "still alive" }).unwrap();
        assert_eq!(after.join().await, Ok("still alive"));

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_active_never_exceeds_size() {
        let pool = WorkerPool::new(3);
        let running = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let running = Arc::clone(&running);
                let max_seen = Arc::clone(&max_seen);
                pool.submit(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();

        for handle in handles {
            handle.join().await.unwrap();
        }

        assert!(max_seen.load(Ordering::SeqCst) <= 3);
        assert!(pool.peak_active() <= 3);
        assert_eq!(pool.stats().completed, 12);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_queued_tasks_start_in_submission_order() {
        let pool = WorkerPool::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let order = Arc::clone(&order);
                pool.submit(async move {
                    order.lock().push(i);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                })
                .unwrap()
            })
            .collect();

        for handle in handles {
            handle.join().await.unwrap();
        }

        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_tasks() {
        let pool = WorkerPool::new(1);
        let finished = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let finished = Arc::clone(&finished);
            pool.submit(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.shutdown().await;

        assert_eq!(finished.load(Ordering::SeqCst), 4);
        assert_eq!(pool.active(), 0);
        assert_eq!(pool.queued(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_twice_is_noop() {
        let pool = WorkerPool::new(2);
        pool.submit(async {}).unwrap().join().await.unwrap();

        pool.shutdown().await;
        let before = pool.stats();
        pool.shutdown().await;

        assert_eq!(pool.stats(), before);
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn test_stats_report_queue_depth() {
        let pool = WorkerPool::new(1);
        let gate = Arc::new(tokio::sync::Notify::new());

        let blocker = {
            let gate = Arc::clone(&gate);
            pool.submit(async move { gate.notified().await }).unwrap()
        };
        let waiting = pool.submit(async {}).unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let stats = pool.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.queued, 1);

        gate.notify_one();
        blocker.join().await.unwrap();
        waiting.join().await.unwrap();
        pool.shutdown().await;
    }
}
