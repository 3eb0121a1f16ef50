//! Release identifiers and `name[:version]` list parsing.

use std::fmt;

use log::warn;
use serde::Serialize;

/// A `(project, release)` pair, rendered as `project:release`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProjectRelease {
    pub project: String,
    pub release: String,
}

impl ProjectRelease {
    pub fn new(project: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            release: release.into(),
        }
    }
}

impl fmt::Display for ProjectRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project, self.release)
    }
}

/// An ordered name → version mapping with unique names.
///
/// Inserting an existing name replaces its version in place, so the order
/// is that of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMap {
    entries: Vec<(String, String)>,
}

impl VersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated `name[:version]` list.
    ///
    /// Entries without a version get `default_version`. Entries with an
    /// empty name or an empty version are skipped.
    pub fn parse(list: &str, default_version: &str) -> Self {
        let mut map = Self::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, version) = match entry.split_once(':') {
                Some((name, version)) => (name.trim(), version.trim()),
                None => (entry, default_version),
            };
            if name.is_empty() || version.is_empty() {
                warn!("Ignoring malformed entry '{}'", entry);
                continue;
            }
            map.insert(name, version);
        }
        map
    }

    pub fn insert(&mut self, name: &str, version: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = version.to_string(),
            None => self.entries.push((name.to_string(), version.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
