//! The collaborators a run drives.
//!
//! [`BenchEnvironment`] is everything the run driver needs besides the
//! executor: the preparation steps, the side modes and the workload
//! builders. [`StoreEnvironment`] wires them to a [`DataStore`] and the
//! resource directory.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use super::config::RunConfig;
use super::error::DriverError;
use crate::executor::Workload;
use crate::results::{compare_runs, Comparison};
use crate::scenario::{load_scenario, load_schema, ResourceKind, ResourceList, Scenario};
use crate::store::{DataStore, MemoryStore};
use crate::workloads::{
    CsvSampleSink, LoadWorkload, MonitorWorkload, QueryWorkload, StoreSampler, MONITOR_FILE,
};

/// Preparation steps, side modes and workload builders of a run.
pub trait BenchEnvironment: Send + Sync {
    /// Every scenario and schema file available.
    fn list_resources(&self) -> Result<Vec<PathBuf>, DriverError>;

    /// Latency comparison of labelled runs.
    fn compare_results(&self, labels: &[String]) -> Result<Comparison, DriverError>;

    /// Drops tables matching a regex. Returns the dropped names.
    fn drop_tables(&self, pattern: &str) -> Result<Vec<String>, DriverError>;

    /// Creates the tables of the selected schema files. Returns how many
    /// were newly created.
    fn apply_schema(&self, selector: &str) -> Result<usize, DriverError>;

    fn load_workload(&self, config: &RunConfig) -> Result<Box<dyn Workload>, DriverError>;

    fn query_workload(&self, config: &RunConfig) -> Result<Box<dyn Workload>, DriverError>;

    fn monitor_workload(&self, config: &RunConfig) -> Result<Box<dyn Workload>, DriverError>;
}

/// Environment backed by a [`DataStore`] and the resource directory.
pub struct StoreEnvironment {
    store: Arc<dyn DataStore>,
    resources: ResourceList,
    results_dir: PathBuf,
}

impl StoreEnvironment {
    pub fn new(store: Arc<dyn DataStore>, resources: ResourceList, results_dir: PathBuf) -> Self {
        Self {
            store,
            resources,
            results_dir,
        }
    }

    /// Opens the persisted [`MemoryStore`] for the configured target.
    pub fn open(config: &RunConfig) -> Result<Self, DriverError> {
        let store = MemoryStore::open(&config.data_dir, &config.target)?;
        Ok(Self::new(
            Arc::new(store),
            ResourceList::new(&config.resource_dir),
            config.results_dir.clone(),
        ))
    }

    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    fn scenarios(&self, config: &RunConfig) -> Result<Vec<Scenario>, DriverError> {
        let selector = config
            .scenario_file
            .as_deref()
            .ok_or_else(|| DriverError::invalid("no scenario file selected"))?;

        let scenarios = self
            .resources
            .resolve(selector, ResourceKind::Scenario)?
            .iter()
            .map(|path| load_scenario(path))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            selector = selector,
            scenarios = scenarios.len(),
            "Scenarios resolved"
        );
        Ok(scenarios)
    }
}

impl BenchEnvironment for StoreEnvironment {
    fn list_resources(&self) -> Result<Vec<PathBuf>, DriverError> {
        Ok(self.resources.list_all()?)
    }

    fn compare_results(&self, labels: &[String]) -> Result<Comparison, DriverError> {
        Ok(compare_runs(&self.results_dir, labels)?)
    }

    fn drop_tables(&self, pattern: &str) -> Result<Vec<String>, DriverError> {
        let dropped = self.store.drop_tables(pattern)?;
        if dropped.is_empty() {
            warn!(pattern = pattern, "No tables matched the drop pattern");
        }
        Ok(dropped)
    }

    fn apply_schema(&self, selector: &str) -> Result<usize, DriverError> {
        let mut created = 0;
        for path in self.resources.resolve(selector, ResourceKind::Schema)? {
            for table in load_schema(&path)? {
                if self.store.create_table(&table)? {
                    created += 1;
                }
            }
        }
        info!(selector = selector, created, "Schema applied");
        Ok(created)
    }

    fn load_workload(&self, config: &RunConfig) -> Result<Box<dyn Workload>, DriverError> {
        let settings = config.load_settings(self.scenarios(config)?);
        Ok(Box::new(LoadWorkload::new(settings, Arc::clone(&self.store))))
    }

    fn query_workload(&self, config: &RunConfig) -> Result<Box<dyn Workload>, DriverError> {
        let settings = config.query_settings(self.scenarios(config)?);
        Ok(Box::new(QueryWorkload::new(settings, Arc::clone(&self.store))))
    }

    fn monitor_workload(&self, config: &RunConfig) -> Result<Box<dyn Workload>, DriverError> {
        let file = match &config.label {
            Some(label) => format!("monitor_{}.csv", label),
            None => MONITOR_FILE.to_string(),
        };
        Ok(Box::new(MonitorWorkload::new(
            config.monitor_settings(),
            Arc::new(StoreSampler::new(Arc::clone(&self.store))),
            Arc::new(CsvSampleSink::new(self.results_dir.join(file))),
        )))
    }
}

impl std::fmt::Debug for StoreEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEnvironment")
            .field("resources", &self.resources)
            .field("results_dir", &self.results_dir)
            .finish()
    }
}
