//! Run driver.
//!
//! Turns a validated [`RunConfig`] into one benchmark run: preparation,
//! workload submission in phase order, drain and shutdown. Side modes
//! (`--list-files`, `--compare`) return before any workload exists.
//!
//! # Example
//!
//! ```ignore
//! use loadrig::driver::{RunConfig, RunDriver, StoreEnvironment};
//!
//! let env = Arc::new(StoreEnvironment::open(&config)?);
//! let summary = RunDriver::new(config, env).run().await?;
//! println!("{:?}", summary.phases);
//! ```

mod config;
mod environment;
mod error;
mod phase;
mod runner;

pub use config::{RunConfig, DEFAULT_SCHEMA_SELECTOR, DEFAULT_TARGET};
pub use environment::{BenchEnvironment, StoreEnvironment};
pub use error::DriverError;
pub use phase::{RunPhase, RunSummary};
pub use runner::RunDriver;
