//! Loadrig - concurrent load and query benchmarking.
//!
//! A run loads synthetic rows into a data store, replays query sets against
//! it and samples the store while both are in flight. Everything that runs
//! is a workload submitted to a shared worker pool.
//!
//! # High-Level API
//!
//! The [`driver`] module sequences a whole run:
//!
//! ```ignore
//! use loadrig::config::ConfigFile;
//! use loadrig::driver::{RunConfig, RunDriver, StoreEnvironment};
//!
//! let mut config = RunConfig::from_config_file(&ConfigFile::load()?);
//! config.load = true;
//! config.scenario_file = Some("orders.*".into());
//!
//! let env = Arc::new(StoreEnvironment::open(&config)?);
//! let summary = RunDriver::new(config, env).run().await?;
//! ```
//!
//! The [`executor`] module can also be used on its own for any set of
//! [`executor::Workload`] implementations.

pub mod config;
pub mod driver;
pub mod executor;
pub mod logging;
pub mod results;
pub mod scenario;
pub mod store;
pub mod workloads;

/// Version of the Loadrig library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
