//! Telemetry for workload execution observability.
//!
//! The executor emits structured lifecycle events through a sink. It doesn't
//! know how events are consumed: the CLI logs them through `tracing`, tests
//! record them to assert on ordering.
//!
//! # Example
//!
//! ```ignore
//! use loadrig::executor::{TelemetryEvent, TelemetrySink};
//!
//! struct CountingSink(AtomicUsize);
//!
//! impl TelemetrySink for CountingSink {
//!     fn emit(&self, _event: TelemetryEvent) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```

use super::handle::WorkloadStatus;
use super::workload::{WorkloadId, WorkloadKind};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Telemetry Events
// =============================================================================

/// Events emitted during workload execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// A workload was registered and submitted to the pool.
    WorkloadAdded {
        id: WorkloadId,
        name: String,
        kind: WorkloadKind,
    },

    /// A workload began running on a pool worker.
    WorkloadStarted { id: WorkloadId },

    /// A workload reached a terminal state.
    WorkloadFinished {
        id: WorkloadId,
        status: WorkloadStatus,
        duration: Duration,
    },

    /// A stop was requested for a workload.
    StopRequested { id: WorkloadId },

    /// A workload was joined and removed from the registry.
    WorkloadJoined { id: WorkloadId },

    /// The executor began shutdown.
    ShutdownStarted { outstanding: usize },

    /// The executor released its pool.
    ShutdownCompleted,
}

impl TelemetryEvent {
    /// Returns the workload ID associated with this event, if any.
    pub fn workload_id(&self) -> Option<&WorkloadId> {
        match self {
            Self::WorkloadAdded { id, .. }
            | Self::WorkloadStarted { id }
            | Self::WorkloadFinished { id, .. }
            | Self::StopRequested { id }
            | Self::WorkloadJoined { id } => Some(id),
            Self::ShutdownStarted { .. } | Self::ShutdownCompleted => None,
        }
    }

    /// Returns a short name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::WorkloadAdded { .. } => "workload_added",
            Self::WorkloadStarted { .. } => "workload_started",
            Self::WorkloadFinished { .. } => "workload_finished",
            Self::StopRequested { .. } => "stop_requested",
            Self::WorkloadJoined { .. } => "workload_joined",
            Self::ShutdownStarted { .. } => "shutdown_started",
            Self::ShutdownCompleted => "shutdown_completed",
        }
    }
}

// =============================================================================
// Telemetry Sink Trait
// =============================================================================

/// Sink for telemetry events.
///
/// Events may be emitted from pool workers concurrently, so implementations
/// must be thread-safe and should not block.
pub trait TelemetrySink: Send + Sync {
    /// Called when a telemetry event occurs.
    fn emit(&self, event: TelemetryEvent);
}

// =============================================================================
// Built-in Sink Implementations
// =============================================================================

/// No-op sink for when telemetry is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetrySink;

impl TelemetrySink for NullTelemetrySink {
    fn emit(&self, _event: TelemetryEvent) {}
}

/// Sink that logs events using the `tracing` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        match &event {
            TelemetryEvent::WorkloadAdded { id, name, kind } => {
                tracing::info!(workload = %id, name = %name, kind = %kind, "Workload added");
            }
            TelemetryEvent::WorkloadStarted { id } => {
                tracing::debug!(workload = %id, "Workload started");
            }
            TelemetryEvent::WorkloadFinished {
                id,
                status,
                duration,
            } => {
                if *status == WorkloadStatus::Failed {
                    tracing::warn!(
                        workload = %id,
                        status = %status,
                        duration_ms = duration.as_millis(),
                        "Workload finished"
                    );
                } else {
                    tracing::info!(
                        workload = %id,
                        status = %status,
                        duration_ms = duration.as_millis(),
                        "Workload finished"
                    );
                }
            }
            TelemetryEvent::StopRequested { id } => {
                tracing::info!(workload = %id, "Stop requested");
            }
            TelemetryEvent::WorkloadJoined { id } => {
                tracing::debug!(workload = %id, "Workload joined");
            }
            TelemetryEvent::ShutdownStarted { outstanding } => {
                tracing::info!(outstanding = outstanding, "Executor shutting down");
            }
            TelemetryEvent::ShutdownCompleted => {
                tracing::info!("Executor shut down, worker pool released");
            }
        }
    }
}

/// Sink that forwards events to multiple sinks.
#[derive(Default)]
pub struct MultiplexTelemetrySink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl MultiplexTelemetrySink {
    /// Creates a new multiplex sink with the given sinks.
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self { sinks }
    }

    /// Adds a sink to the multiplex.
    pub fn add_sink(&mut self, sink: Arc<dyn TelemetrySink>) {
        self.sinks.push(sink);
    }
}

impl TelemetrySink for MultiplexTelemetrySink {
    fn emit(&self, event: TelemetryEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

impl std::fmt::Debug for MultiplexTelemetrySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplexTelemetrySink")
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(AtomicUsize);

    impl TelemetrySink for CountingSink {
        fn emit(&self, _event: TelemetryEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_null_and_tracing_sinks_accept_events() {
        NullTelemetrySink.emit(TelemetryEvent::ShutdownCompleted);
        TracingTelemetrySink.emit(TelemetryEvent::WorkloadStarted {
            id: WorkloadId::new("load"),
        });
    }

    #[test]
    fn test_event_workload_id() {
        let event = TelemetryEvent::StopRequested {
            id: WorkloadId::new("monitor"),
        };
        assert_eq!(event.workload_id().map(|id| id.as_str()), Some("monitor"));
        assert!(TelemetryEvent::ShutdownStarted { outstanding: 2 }
            .workload_id()
            .is_none());
    }

    #[test]
    fn test_event_type() {
        let event = TelemetryEvent::WorkloadFinished {
            id: WorkloadId::new("q"),
            status: WorkloadStatus::Succeeded,
            duration: Duration::from_millis(5),
        };
        assert_eq!(event.event_type(), "workload_finished");
        assert_eq!(
            TelemetryEvent::ShutdownCompleted.event_type(),
            "shutdown_completed"
        );
    }

    #[test]
    fn test_multiplex_sink_fans_out() {
        let sink1 = Arc::new(CountingSink(AtomicUsize::new(0)));
        let sink2 = Arc::new(CountingSink(AtomicUsize::new(0)));

        let mut multiplex = MultiplexTelemetrySink::new(vec![sink1.clone() as Arc<dyn TelemetrySink>]);
        multiplex.add_sink(sink2.clone());

        multiplex.emit(TelemetryEvent::ShutdownCompleted);
        multiplex.emit(TelemetryEvent::ShutdownStarted { outstanding: 0 });

        assert_eq!(sink1.0.load(Ordering::SeqCst), 2);
        assert_eq!(sink2.0.load(Ordering::SeqCst), 2);
    }
}
