//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [runner] section
    if let Some(section) = ini.section(Some("runner")) {
        if let Some(v) = section.get("thread_pool_size") {
            config.runner.thread_pool_size = parse_positive(
                "runner",
                "thread_pool_size",
                v,
                "must be a positive integer",
            )?;
        }
        if let Some(v) = section.get("monitor_frequency_ms") {
            config.runner.monitor_frequency_ms = parse_positive(
                "runner",
                "monitor_frequency_ms",
                v,
                "must be a positive integer (milliseconds)",
            )?;
        }
        if let Some(v) = section.get("monitor_flush_every") {
            config.runner.monitor_flush_every = parse_positive(
                "runner",
                "monitor_flush_every",
                v,
                "must be a positive integer (samples)",
            )?;
        }
    }

    // [paths] section
    if let Some(section) = ini.section(Some("paths")) {
        if let Some(v) = non_empty(section.get("resource_dir")) {
            config.paths.resource_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("results_dir")) {
            config.paths.results_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("data_dir")) {
            config.paths.data_dir = expand_tilde(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parses a strictly positive integer, reporting the offending key on failure.
fn parse_positive<T>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError>
where
    T: FromStr + Default + PartialEq,
{
    let invalid = || ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let parsed: T = value.trim().parse().map_err(|_| invalid())?;
    if parsed == T::default() {
        return Err(invalid());
    }
    Ok(parsed)
}

/// Expands a leading `~/` to the user's home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_runner_section() {
        let config = load(
            r#"
[runner]
thread_pool_size = 6
monitor_frequency_ms = 250
monitor_flush_every = 4
"#,
        )
        .unwrap();

        assert_eq!(config.runner.thread_pool_size, 6);
        assert_eq!(config.runner.monitor_frequency_ms, 250);
        assert_eq!(config.runner.monitor_flush_every, 4);
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let config = load("[runner]\nthread_pool_size = 5\n").unwrap();

        assert_eq!(config.runner.thread_pool_size, 5);
        assert_eq!(config.runner.monitor_frequency_ms, DEFAULT_MONITOR_FREQUENCY_MS);
        assert_eq!(config.runner.monitor_flush_every, DEFAULT_MONITOR_FLUSH_EVERY);
    }

    #[test]
    fn test_invalid_pool_size() {
        let err = load("[runner]\nthread_pool_size = many\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("runner.thread_pool_size"));
        assert!(msg.contains("many"));
    }

    #[test]
    fn test_zero_monitor_frequency_rejected() {
        let err = load("[runner]\nmonitor_frequency_ms = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref key, .. } if key == "monitor_frequency_ms"
        ));
    }

    #[test]
    fn test_paths_section() {
        let config = load(
            r#"
[paths]
resource_dir = /srv/bench/resources
results_dir = /srv/bench/results
data_dir =
"#,
        )
        .unwrap();

        assert_eq!(config.paths.resource_dir, PathBuf::from("/srv/bench/resources"));
        assert_eq!(config.paths.results_dir, PathBuf::from("/srv/bench/results"));
        // Empty values fall back to defaults
        assert_eq!(config.paths.data_dir, ConfigFile::default().paths.data_dir);
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/bench");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("bench"));
        }
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
