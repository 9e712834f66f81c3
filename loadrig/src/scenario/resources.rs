//! Resource file discovery.
//!
//! Scenario and schema files live flat in one resource directory. A selector
//! is a regular expression matched against whole file names.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::ScenarioError;

pub const SCENARIO_SUFFIX: &str = ".scenario.ini";
pub const SCHEMA_SUFFIX: &str = ".schema.ini";

/// Kind of resource file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Scenario,
    Schema,
}

impl ResourceKind {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Scenario => SCENARIO_SUFFIX,
            Self::Schema => SCHEMA_SUFFIX,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Scenario => "scenario",
            Self::Schema => "schema",
        }
    }
}

/// Lists and resolves resource files in a directory.
#[derive(Clone, Debug)]
pub struct ResourceList {
    dir: PathBuf,
}

impl ResourceList {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All files of `kind`, sorted by name.
    pub fn list(&self, kind: ResourceKind) -> Result<Vec<PathBuf>, ScenarioError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ScenarioError::ResourceDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && file_name(path).ends_with(kind.suffix()))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Every scenario and schema file, sorted by name.
    pub fn list_all(&self) -> Result<Vec<PathBuf>, ScenarioError> {
        let mut files = self.list(ResourceKind::Scenario)?;
        files.extend(self.list(ResourceKind::Schema)?);
        files.sort();
        Ok(files)
    }

    /// Files of `kind` whose name fully matches `pattern`.
    ///
    /// Fails with [`ScenarioError::NoMatch`] when nothing matches.
    pub fn resolve(&self, pattern: &str, kind: ResourceKind) -> Result<Vec<PathBuf>, ScenarioError> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
            ScenarioError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        let matched: Vec<PathBuf> = self
            .list(kind)?
            .into_iter()
            .filter(|path| regex.is_match(file_name(path)))
            .collect();

        if matched.is_empty() {
            return Err(ScenarioError::NoMatch {
                kind: kind.label(),
                pattern: pattern.to_string(),
            });
        }
        Ok(matched)
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        for name in [
            "orders.scenario.ini",
            "orders_big.scenario.ini",
            "users.scenario.ini",
            "bench.schema.ini",
            "notes.txt",
        ] {
            fs::write(temp.path().join(name), "").unwrap();
        }
        temp
    }

    #[test]
    fn test_list_by_kind() {
        let temp = fixture();
        let resources = ResourceList::new(temp.path());

        let scenarios = resources.list(ResourceKind::Scenario).unwrap();
        assert_eq!(scenarios.len(), 3);
        assert!(scenarios[0].ends_with("orders.scenario.ini"));

        assert_eq!(resources.list(ResourceKind::Schema).unwrap().len(), 1);
        assert_eq!(resources.list_all().unwrap().len(), 4);
    }

    #[test]
    fn test_resolve_full_match() {
        let temp = fixture();
        let resources = ResourceList::new(temp.path());

        let exact = resources
            .resolve("orders\\.scenario\\.ini", ResourceKind::Scenario)
            .unwrap();
        assert_eq!(exact.len(), 1);

        let prefix = resources
            .resolve("orders.*", ResourceKind::Scenario)
            .unwrap();
        assert_eq!(prefix.len(), 2);
    }

    #[test]
    fn test_resolve_no_match_and_bad_pattern() {
        let temp = fixture();
        let resources = ResourceList::new(temp.path());

        assert!(matches!(
            resources.resolve("missing.*", ResourceKind::Schema),
            Err(ScenarioError::NoMatch { kind: "schema", .. })
        ));
        assert!(matches!(
            resources.resolve("[", ResourceKind::Schema),
            Err(ScenarioError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_missing_directory() {
        let resources = ResourceList::new("/nonexistent/loadrig/resources");
        assert!(matches!(
            resources.list(ResourceKind::Scenario),
            Err(ScenarioError::ResourceDir { .. })
        ));
    }
}
