//! Run configuration.
//!
//! [`RunConfig`] is built once from the user config file with command-line
//! overrides applied on top, validated, and then only read. Workloads never
//! see it: each receives the settings struct it needs.

use std::path::PathBuf;
use std::time::Duration;

use super::error::DriverError;
use crate::config::ConfigFile;
use crate::scenario::{Scenario, MAX_ROW_COUNT};
use crate::workloads::{LoadSettings, MonitorSettings, QuerySettings};

/// Default connection target.
pub const DEFAULT_TARGET: &str = "localhost";

/// Schema selector used when schema apply is on but no selector was given.
pub const DEFAULT_SCHEMA_SELECTOR: &str = ".*";

/// Every parameter of one benchmark run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Connection target of the backing store.
    pub target: String,
    pub load: bool,
    pub query: bool,
    pub monitor: bool,
    pub thread_pool_size: usize,
    pub monitor_frequency: Duration,
    pub monitor_flush_every: usize,
    /// Regex selecting scenario files.
    pub scenario_file: Option<String>,
    /// Regex selecting schema files.
    pub schema_file: Option<String>,
    /// Regex of tables to drop before the run.
    pub drop_pattern: Option<String>,
    pub row_count_override: Option<u64>,
    pub hint: Option<String>,
    /// Suffix of this run's result files.
    pub label: Option<String>,
    pub export: bool,
    pub diff: bool,
    /// Labels whose results are compared instead of running.
    pub compare: Vec<String>,
    pub list_files: bool,
    pub apply_schema: bool,
    pub update_statistics: bool,
    pub resource_dir: PathBuf,
    pub results_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl RunConfig {
    /// Starts from the user config file; no action is selected yet.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            load: false,
            query: false,
            monitor: false,
            thread_pool_size: config.runner.thread_pool_size,
            monitor_frequency: Duration::from_millis(config.runner.monitor_frequency_ms),
            monitor_flush_every: config.runner.monitor_flush_every,
            scenario_file: None,
            schema_file: None,
            drop_pattern: None,
            row_count_override: None,
            hint: None,
            label: None,
            export: false,
            diff: false,
            compare: Vec::new(),
            list_files: false,
            apply_schema: true,
            update_statistics: false,
            resource_dir: config.paths.resource_dir.clone(),
            results_dir: config.paths.results_dir.clone(),
            data_dir: config.paths.data_dir.clone(),
        }
    }

    /// True when the run only lists files or compares results.
    pub fn is_side_mode(&self) -> bool {
        self.list_files || !self.compare.is_empty()
    }

    /// True when at least one workload will be submitted.
    pub fn runs_workloads(&self) -> bool {
        self.load || self.query || self.monitor
    }

    /// Pool slots the run needs at its busiest: the monitor, the active
    /// load or query workload, and one slot for what it fans out.
    pub fn required_pool_slots(&self) -> usize {
        let monitor = usize::from(self.monitor);
        let active = if self.load || self.query { 2 } else { 0 };
        (monitor + active).max(1)
    }

    /// Checks the configuration before anything runs.
    pub fn validate(&self) -> Result<(), DriverError> {
        if !self.is_side_mode() && !self.runs_workloads() && self.drop_pattern.is_none() {
            return Err(DriverError::NothingToDo);
        }

        if self.compare.len() == 1 {
            return Err(DriverError::invalid("--compare needs at least two labels"));
        }

        if self.target.trim().is_empty() {
            return Err(DriverError::invalid("target must not be empty"));
        }

        if (self.load || self.query) && self.scenario_file.is_none() {
            return Err(DriverError::invalid(
                "--scenario-file is required with --load or --query",
            ));
        }

        if self.export && self.diff {
            return Err(DriverError::invalid("--export and --diff are mutually exclusive"));
        }

        if self.monitor && self.monitor_frequency.is_zero() {
            return Err(DriverError::invalid("monitor frequency must be greater than zero"));
        }

        if self.monitor && self.monitor_flush_every == 0 {
            return Err(DriverError::invalid("monitor flush interval must be greater than zero"));
        }

        if self.row_count_override == Some(0) {
            return Err(DriverError::invalid("row count override must be greater than zero"));
        }

        if self.row_count_override.is_some_and(|rows| rows > MAX_ROW_COUNT) {
            return Err(DriverError::invalid(format!(
                "row count override must not exceed {}",
                MAX_ROW_COUNT
            )));
        }

        let required = self.required_pool_slots();
        if self.thread_pool_size < required {
            return Err(DriverError::invalid(format!(
                "thread pool size {} is too small for this run (needs at least {})",
                self.thread_pool_size, required
            )));
        }

        for label in self.label.iter().chain(&self.compare) {
            if !is_valid_label(label) {
                return Err(DriverError::invalid(format!(
                    "label '{}' may only contain letters, digits, '-' and '_'",
                    label
                )));
            }
        }

        Ok(())
    }

    pub fn load_settings(&self, scenarios: Vec<Scenario>) -> LoadSettings {
        LoadSettings {
            scenarios,
            row_count_override: self.row_count_override,
            update_statistics: self.update_statistics,
        }
    }

    pub fn query_settings(&self, scenarios: Vec<Scenario>) -> QuerySettings {
        QuerySettings {
            scenarios,
            hint: self.hint.clone(),
            label: self.label.clone(),
            results_dir: self.results_dir.clone(),
            export: self.export,
            diff: self.diff,
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            frequency: self.monitor_frequency,
            flush_every: self.monitor_flush_every,
        }
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RunConfig {
        let mut config = RunConfig::from_config_file(&ConfigFile::default());
        config.thread_pool_size = 3;
        config
    }

    fn running(mut config: RunConfig) -> RunConfig {
        config.load = true;
        config.query = true;
        config.scenario_file = Some(".*".into());
        config
    }

    #[test]
    fn test_nothing_to_do() {
        assert!(matches!(base().validate(), Err(DriverError::NothingToDo)));
    }

    #[test]
    fn test_valid_full_run() {
        let mut config = running(base());
        config.monitor = true;
        assert_eq!(config.required_pool_slots(), 3);
        config.validate().unwrap();
    }

    #[test]
    fn test_pool_too_small_for_monitor_and_fan_out() {
        let mut config = running(base());
        config.monitor = true;
        config.thread_pool_size = 2;

        let err = config.validate().unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("needs at least 3"));
    }

    #[test]
    fn test_scenario_required_for_load() {
        let mut config = base();
        config.load = true;
        assert!(config.validate().unwrap_err().to_string().contains("--scenario-file"));
    }

    #[test]
    fn test_row_count_override_bounds() {
        let mut config = running(base());
        config.row_count_override = Some(MAX_ROW_COUNT + 1);
        assert!(config.validate().unwrap_err().is_usage());

        config.row_count_override = Some(MAX_ROW_COUNT);
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_monitor_frequency() {
        let mut config = base();
        config.monitor = true;
        config.monitor_frequency = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_side_modes_need_no_pool() {
        let mut config = base();
        config.thread_pool_size = 1;
        config.list_files = true;
        config.validate().unwrap();

        config.list_files = false;
        config.compare = vec!["a".into()];
        assert!(config.validate().is_err());
        config.compare.push("b".into());
        config.validate().unwrap();
    }

    #[test]
    fn test_label_characters() {
        let mut config = running(base());
        config.label = Some("run 1".into());
        assert!(config.validate().is_err());
        config.label = Some("run-1_b".into());
        config.validate().unwrap();
    }

    #[test]
    fn test_export_and_diff_conflict() {
        let mut config = running(base());
        config.export = true;
        config.diff = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_projection() {
        let mut config = running(base());
        config.row_count_override = Some(5);
        config.hint = Some("SMALL".into());
        config.monitor_flush_every = 4;

        assert_eq!(config.load_settings(vec![]).row_count_override, Some(5));
        assert_eq!(config.query_settings(vec![]).hint.as_deref(), Some("SMALL"));
        assert_eq!(config.monitor_settings().flush_every, 4);
    }
}
