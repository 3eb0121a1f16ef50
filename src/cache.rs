//! In-process caching of parsed configuration documents
//!
//! Entries are keyed by the exact locator string and never invalidated: the
//! first successful load of a locator wins for the lifetime of the cache.

use std::collections::HashMap;

use crate::cfg::ConfigTree;
use crate::error::Result;

/// In-process cache of parsed ConfigTrees keyed by locator
#[derive(Debug, Clone, Default)]
pub struct TreeCache {
    entries: HashMap<String, ConfigTree>,
}

impl TreeCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached tree, or load and cache it if not present.
    ///
    /// Nothing is cached when `loader` fails.
    pub fn get_or_load<F>(&mut self, locator: &str, loader: F) -> Result<ConfigTree>
    where
        F: FnOnce() -> Result<ConfigTree>,
    {
        if let Some(cached) = self.entries.get(locator) {
            return Ok(cached.clone());
        }

        let tree = loader()?;
        self.entries.insert(locator.to_string(), tree.clone());
        Ok(tree)
    }

    /// Get a cached tree without loading
    pub fn get(&self, locator: &str) -> Option<&ConfigTree> {
        self.entries.get(locator)
    }

    /// Check if a locator has been cached
    pub fn contains(&self, locator: &str) -> bool {
        self.entries.contains_key(locator)
    }

    /// Get the number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
