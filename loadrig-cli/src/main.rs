//! Loadrig CLI - Command-line interface
//!
//! This binary parses run options, applies them over the user config file
//! and hands the result to the run driver.

mod error;
mod runner;

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use loadrig::config::ConfigFile;
use loadrig::driver::{RunConfig, DEFAULT_TARGET};

use error::{CliError, EXIT_USAGE};
use runner::{print_summary, CliRunner};

#[derive(Debug, Parser)]
#[command(name = "loadrig")]
#[command(version = loadrig::VERSION)]
#[command(about = "Load, query and monitor a data store on a shared worker pool", long_about = None)]
struct Args {
    /// Connection target of the data store
    #[arg(short = 'z', long, default_value = DEFAULT_TARGET)]
    target: String,

    /// Load scenario rows
    #[arg(short, long)]
    load: bool,

    /// Run scenario query sets
    #[arg(short, long)]
    query: bool,

    /// Sample the store while the run is in flight
    #[arg(short, long)]
    monitor: bool,

    /// Monitor sampling interval in milliseconds
    #[arg(long, value_name = "MS")]
    monitor_frequency: Option<u64>,

    /// Regex selecting scenario files
    #[arg(long, value_name = "PATTERN")]
    scenario_file: Option<String>,

    /// Regex selecting schema files
    #[arg(long, value_name = "PATTERN")]
    schema_file: Option<String>,

    /// Regex of tables to drop before the run
    #[arg(long = "drop", value_name = "PATTERN")]
    drop_pattern: Option<String>,

    /// Rows to load per scenario, replacing the scenario's row count
    #[arg(long, value_name = "ROWS")]
    row_count_override: Option<u64>,

    /// Hint passed with every query
    #[arg(long)]
    hint: Option<String>,

    /// Export query results as CSV baselines
    #[arg(long, conflicts_with = "diff")]
    export: bool,

    /// Verify query results against exported baselines
    #[arg(long)]
    diff: bool,

    /// Worker pool size
    #[arg(long, value_name = "N")]
    thread_pool_size: Option<usize>,

    /// Suffix of this run's result files
    #[arg(long)]
    label: Option<String>,

    /// Compare the results of labelled runs
    #[arg(long, value_name = "LABELS", value_delimiter = ',')]
    compare: Vec<String>,

    /// List scenario and schema files
    #[arg(long)]
    list_files: bool,

    /// Skip creating the schema file's tables
    #[arg(long)]
    disable_schema_apply: bool,

    /// Refresh table statistics after loading
    #[arg(long)]
    stats: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Config file to use instead of ~/.loadrig/config.ini
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Args {
    /// True when any action flag was given.
    fn has_action(&self) -> bool {
        self.load
            || self.query
            || self.monitor
            || self.drop_pattern.is_some()
            || self.list_files
            || !self.compare.is_empty()
    }

    /// Applies these options over the config file values.
    fn into_run_config(self, config: &ConfigFile) -> RunConfig {
        let mut run = RunConfig::from_config_file(config);
        run.target = self.target;
        run.load = self.load;
        run.query = self.query;
        run.monitor = self.monitor;
        if let Some(ms) = self.monitor_frequency {
            run.monitor_frequency = Duration::from_millis(ms);
        }
        if let Some(size) = self.thread_pool_size {
            run.thread_pool_size = size;
        }
        run.scenario_file = self.scenario_file;
        run.schema_file = self.schema_file;
        run.drop_pattern = self.drop_pattern;
        run.row_count_override = self.row_count_override;
        run.hint = self.hint;
        run.label = self.label;
        run.export = self.export;
        run.diff = self.diff;
        run.compare = self.compare;
        run.list_files = self.list_files;
        run.apply_schema = !self.disable_schema_apply;
        run.update_statistics = self.stats;
        run
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if !args.has_action() {
        let _ = Args::command().print_help();
        process::exit(EXIT_USAGE);
    }

    if let Err(e) = run(args).await {
        e.exit();
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    let run = args.into_run_config(runner.config());
    runner.log_startup(&run);

    let summary = runner.run(run).await?;
    print_summary(&summary);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("loadrig").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_no_action() {
        assert!(!parse(&[]).has_action());
        assert!(!parse(&["--debug", "--label", "a"]).has_action());
    }

    #[test]
    fn test_overrides_apply_over_config_file() {
        let config = ConfigFile::default();
        let run = parse(&[
            "-l",
            "-q",
            "-m",
            "-z",
            "bench01",
            "--scenario-file",
            "orders.*",
            "--thread-pool-size",
            "6",
            "--monitor-frequency",
            "250",
            "--disable-schema-apply",
            "--stats",
        ])
        .into_run_config(&config);

        assert!(run.load && run.query && run.monitor);
        assert_eq!(run.target, "bench01");
        assert_eq!(run.scenario_file.as_deref(), Some("orders.*"));
        assert_eq!(run.thread_pool_size, 6);
        assert_eq!(run.monitor_frequency, Duration::from_millis(250));
        assert!(!run.apply_schema);
        assert!(run.update_statistics);
        assert_eq!(run.results_dir, config.paths.results_dir);
    }

    #[test]
    fn test_defaults_come_from_config_file() {
        let config = ConfigFile::default();
        let run = parse(&["--load"]).into_run_config(&config);

        assert_eq!(run.target, DEFAULT_TARGET);
        assert_eq!(run.thread_pool_size, config.runner.thread_pool_size);
        assert!(run.apply_schema);
    }

    #[test]
    fn test_compare_labels() {
        let args = parse(&["--compare", "base,tuned"]);
        assert!(args.has_action());
        assert_eq!(args.compare, vec!["base", "tuned"]);

        let single = parse(&["--compare", "base"]).into_run_config(&ConfigFile::default());
        assert!(single.validate().is_err());
    }

    #[test]
    fn test_export_conflicts_with_diff() {
        assert!(Args::try_parse_from(["loadrig", "-q", "--export", "--diff"]).is_err());
    }
}
