//! Integration tests for the `loadrig` binary.
//!
//! Each test writes a config file pointing every directory into a temporary
//! directory, so runs never touch `~/.loadrig`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const SCHEMA: &str = "\
[table:ORDERS]
columns = id:key, customer:text, amount:int
";

const SCENARIO: &str = "\
[scenario]
name = orders
table = ORDERS
row_count = 200
batch_size = 50
writer_threads = 2

[query_set:reads]
execution = parallel
concurrency = 2
iterations = 2
query.count_all = count
query.by_key = lookup 7
query.first_rows = scan 10
";

/// Temporary home for one CLI invocation.
struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("resources")).unwrap();
        fs::write(root.join("resources/bench.schema.ini"), SCHEMA).unwrap();
        fs::write(root.join("resources/orders.scenario.ini"), SCENARIO).unwrap();

        let config = format!(
            "[runner]\nthread_pool_size = 4\nmonitor_frequency_ms = 20\n\n\
             [paths]\nresource_dir = {}\nresults_dir = {}\ndata_dir = {}\n\n\
             [logging]\nfile = {}\n",
            root.join("resources").display(),
            root.join("results").display(),
            root.join("data").display(),
            root.join("logs/loadrig.log").display(),
        );
        fs::write(root.join("config.ini"), config).unwrap();

        Self { temp }
    }

    fn path(&self) -> &Path {
        self.temp.path()
    }

    fn results(&self) -> PathBuf {
        self.path().join("results")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_loadrig"))
            .arg("--config")
            .arg(self.path().join("config.ini"))
            .args(args)
            .output()
            .expect("Failed to execute CLI command")
    }
}

#[test]
fn test_no_action_prints_help_and_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_loadrig"))
        .output()
        .expect("Failed to execute CLI command");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--scenario-file"), "help expected: {}", stdout);
}

#[test]
fn test_list_files() {
    let ws = Workspace::new();
    let output = ws.run(&["--list-files"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("bench.schema.ini"));
    assert!(stdout.contains("orders.scenario.ini"));
}

#[test]
fn test_usage_error_exits_before_running() {
    let ws = Workspace::new();
    let output = ws.run(&["--load"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--scenario-file"));
    assert!(!ws.path().join("data").exists());
}

#[test]
fn test_pool_too_small_is_usage_error() {
    let ws = Workspace::new();
    let output = ws.run(&[
        "-l",
        "-m",
        "--scenario-file",
        "orders.*",
        "--thread-pool-size",
        "2",
    ]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_load_query_monitor_run() {
    let ws = Workspace::new();
    let output = ws.run(&[
        "-l",
        "-q",
        "-m",
        "--schema-file",
        "bench.*",
        "--scenario-file",
        "orders.*",
        "--label",
        "base",
        "--stats",
    ]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(ws.results().join("orders_base.json").exists());
    assert!(ws.results().join("monitor_base.csv").exists());
    assert!(ws.path().join("data/localhost/ORDERS.json").exists());
}

#[test]
fn test_missing_table_fails_run() {
    let ws = Workspace::new();
    let output = ws.run(&[
        "-l",
        "--disable-schema-apply",
        "--scenario-file",
        "orders.*",
    ]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ORDERS"));
}

#[test]
fn test_compare_labelled_runs() {
    let ws = Workspace::new();
    for label in ["base", "tuned"] {
        let output = ws.run(&[
            "-l",
            "-q",
            "--schema-file",
            "bench.*",
            "--scenario-file",
            "orders.*",
            "--label",
            label,
        ]);
        assert!(output.status.success());
    }

    let output = ws.run(&["--compare", "base,tuned"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("base"));
    assert!(stdout.contains("tuned"));
    assert!(stdout.contains("count_all"));
}
