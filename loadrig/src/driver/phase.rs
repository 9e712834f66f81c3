//! Run phases and the summary of a finished run.

use std::fmt;
use std::path::PathBuf;

use crate::executor::WorkloadReport;
use crate::results::Comparison;

/// Phases of a run, in the order they can occur.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunPhase {
    Start,
    /// Tables dropped, schemas applied, workloads built.
    Prepare,
    MonitorActive,
    LoadInProgress,
    LoadDone,
    QuerySubmitted,
    Drain,
    MonitorStopped,
    Shutdown,
    Terminal,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Prepare => "prepare",
            Self::MonitorActive => "monitor-active",
            Self::LoadInProgress => "load-in-progress",
            Self::LoadDone => "load-done",
            Self::QuerySubmitted => "query-submitted",
            Self::Drain => "drain",
            Self::MonitorStopped => "monitor-stopped",
            Self::Shutdown => "shutdown",
            Self::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// What a successful run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub phases: Vec<RunPhase>,
    /// Reports of every joined workload, in join order.
    pub reports: Vec<WorkloadReport>,
    pub dropped_tables: Vec<String>,
    pub tables_created: usize,
    /// Set by `--list-files`.
    pub listed_files: Vec<PathBuf>,
    /// Set by `--compare`.
    pub comparison: Option<Comparison>,
}

impl RunSummary {
    /// Report of the workload with the given ID, if it was joined.
    pub fn report(&self, id: &str) -> Option<&WorkloadReport> {
        self.reports.iter().find(|r| r.id.as_str() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(RunPhase::LoadInProgress.to_string(), "load-in-progress");
        assert_eq!(RunPhase::MonitorStopped.to_string(), "monitor-stopped");
    }
}
