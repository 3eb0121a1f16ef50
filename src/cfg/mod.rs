//! # ConfigTree
//!
//! An in-memory hierarchical key/value store used for both defaults
//! documents and release documents. Each node holds string options and
//! named child sections; the tree has a line-oriented text form that is
//! parsed by [`ConfigTree::parse`] and produced by its `Display` impl.
//!
//! ## Text format
//!
//! ```text
//! # comment
//! Name = value
//! List += first
//! List += second
//! Section
//! {
//!   Nested = option
//! }
//! ```
//!
//! ## Paths
//!
//! Accessors take a [`CfgPath`]: a `/`-delimited string such as
//! `"Releases/v1/Depends"` or an explicit list of segments such as
//! `["Releases", release, "Depends"]`.

mod parser;
pub mod path;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

pub use path::CfgPath;

/// A configuration node with options and child sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigTree {
    options: BTreeMap<String, String>,
    children: BTreeMap<String, ConfigTree>,
}

impl ConfigTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and parses a ConfigTree document from a local file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Returns true when the node has neither options nor sections.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.children.is_empty()
    }

    /// Iterates over the options of this node, sorted by name.
    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over the child sections of this node, sorted by name.
    pub fn children(&self) -> impl Iterator<Item = (&str, &ConfigTree)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn locate(&self, segments: &[&str]) -> Option<&ConfigTree> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.children.get(*segment))
    }

    /// Returns true if `path` names an option.
    pub fn is_option<P: CfgPath + ?Sized>(&self, path: &P) -> bool {
        let segments = path.segments();
        match segments.split_last() {
            Some((last, parents)) => self
                .locate(parents)
                .is_some_and(|node| node.options.contains_key(*last)),
            None => false,
        }
    }

    /// Returns true if `path` names a section. The empty path is the root.
    pub fn is_section<P: CfgPath + ?Sized>(&self, path: &P) -> bool {
        self.locate(&path.segments()).is_some()
    }

    /// Returns the raw value of the option at `path`.
    pub fn get<P: CfgPath + ?Sized>(&self, path: &P) -> Result<&str> {
        let segments = path.segments();
        let not_found = || Error::Lookup {
            path: path.display(),
        };
        let (last, parents) = segments.split_last().ok_or_else(not_found)?;
        self.locate(parents)
            .and_then(|node| node.options.get(*last))
            .map(String::as_str)
            .ok_or_else(not_found)
    }

    /// Returns the option at `path`, or `default` if it is absent.
    pub fn get_string<P: CfgPath + ?Sized>(&self, path: &P, default: &str) -> String {
        self.get(path).unwrap_or(default).to_string()
    }

    /// Returns the option at `path` interpreted as a boolean.
    ///
    /// `1`, `true` and `yes` (any case) are true, every other value is
    /// false. An absent option yields `default`.
    pub fn get_bool<P: CfgPath + ?Sized>(&self, path: &P, default: bool) -> bool {
        match self.get(path) {
            Ok(value) => matches!(
                value.trim().to_lowercase().as_str(),
                "1" | "true" | "yes"
            ),
            Err(_) => default,
        }
    }

    /// Returns the option at `path` as an integer.
    ///
    /// Falls back to `default` when the option is absent or does not parse.
    pub fn get_int<P: CfgPath + ?Sized>(&self, path: &P, default: i64) -> i64 {
        self.get(path)
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Splits a comma-separated option into its trimmed, non-empty items.
    pub fn get_list<P: CfgPath + ?Sized>(&self, path: &P) -> Vec<String> {
        self.get(path)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the section at `path`.
    pub fn get_child<P: CfgPath + ?Sized>(&self, path: &P) -> Result<&ConfigTree> {
        self.locate(&path.segments()).ok_or_else(|| Error::Lookup {
            path: path.display(),
        })
    }

    /// Names of the options of the section at `path`.
    pub fn get_options<P: CfgPath + ?Sized>(&self, path: &P) -> Result<Vec<&str>> {
        Ok(self.get_child(path)?.options.keys().map(String::as_str).collect())
    }

    /// Names of the child sections of the section at `path`.
    pub fn get_sections<P: CfgPath + ?Sized>(&self, path: &P) -> Result<Vec<&str>> {
        Ok(self.get_child(path)?.children.keys().map(String::as_str).collect())
    }

    /// Returns the section at `path`, creating it and every missing
    /// intermediate section.
    pub fn create_section<P: CfgPath + ?Sized>(&mut self, path: &P) -> &mut ConfigTree {
        let mut node = self;
        for segment in path.segments() {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node
    }

    /// Sets the option at `path`, creating intermediate sections.
    pub fn set_option<P: CfgPath + ?Sized>(
        &mut self,
        path: &P,
        value: impl Into<String>,
    ) -> Result<()> {
        let segments = path.segments();
        let (last, parents) = segments.split_last().ok_or_else(|| Error::Lookup {
            path: path.display(),
        })?;
        self.create_section(parents)
            .options
            .insert(last.to_string(), value.into());
        Ok(())
    }

    /// Appends `value` to an option as `", " + value`, creating it if absent.
    fn append_option(&mut self, name: &str, value: &str) {
        self.options
            .entry(name.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    /// Removes the option or section at `path`.
    pub fn del_path<P: CfgPath + ?Sized>(&mut self, path: &P) -> Result<()> {
        let segments = path.segments();
        let not_found = || Error::Lookup {
            path: path.display(),
        };
        let (last, parents) = segments.split_last().ok_or_else(not_found)?;
        let mut node = self;
        for segment in parents {
            node = node.children.get_mut(*segment).ok_or_else(not_found)?;
        }
        if node.options.remove(*last).is_some() || node.children.remove(*last).is_some() {
            Ok(())
        } else {
            Err(not_found())
        }
    }

    /// Merges `other` into this node: options overwrite, sections with the
    /// same name merge recursively. Nothing already present is removed.
    pub fn merge(&mut self, other: &ConfigTree) {
        for (name, value) in &other.options {
            self.options.insert(name.clone(), value.clone());
        }
        for (name, child) in &other.children {
            self.children.entry(name.clone()).or_default().merge(child);
        }
    }

    /// Merges `other` into the section at `path`, creating it if needed.
    pub fn update<P: CfgPath + ?Sized>(&mut self, path: &P, other: &ConfigTree) {
        self.create_section(path).merge(other);
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        for (name, value) in &self.options {
            writeln!(f, "{indent}{name} = {value}")?;
        }
        for (name, child) in &self.children {
            writeln!(f, "{indent}{name}")?;
            writeln!(f, "{indent}{{")?;
            child.write_indented(f, depth + 1)?;
            writeln!(f, "{indent}}}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

impl std::str::FromStr for ConfigTree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
