//! Defaults resolution for installations and projects.
//!
//! A single global defaults document lists every known installation under
//! `Installations` and every project under `Projects`. Each object may:
//!
//! - be a plain option naming another object (`Foo = Bar`), in which case it
//!   behaves exactly like the aliased object;
//! - point at its own defaults document with `DefaultsLocation`, unless it
//!   sets `SkipDefaults = yes`;
//! - declare an `Alias`, whose resolved defaults are layered underneath its
//!   own.
//!
//! Every resolved object is merged into the global tree and remembered, so
//! resolving the same object twice never fetches anything again.

use std::collections::HashSet;

use log::debug;

use crate::cfg::ConfigTree;
use crate::error::{Error, Result};
use crate::source::ConfigSource;

/// Well-known location of the global defaults document.
pub const DEFAULT_GLOBAL_DEFAULTS: &str =
    "http://diracproject.web.cern.ch/diracproject/configs/globalDefaults.cfg";

/// Root category holding installation objects.
pub const INSTALLATIONS: &str = "Installations";

/// Root category holding project objects.
pub const PROJECTS: &str = "Projects";

/// Loads and merges installation and project defaults.
pub struct DefaultsResolver {
    source: ConfigSource,
    global_locator: String,
    global: ConfigTree,
    global_loaded: bool,
    loaded: HashSet<String>,
}

impl DefaultsResolver {
    /// Creates a resolver reading the global defaults from `global_locator`.
    pub fn new(source: ConfigSource, global_locator: impl Into<String>) -> Self {
        Self {
            source,
            global_locator: global_locator.into(),
            global: ConfigTree::new(),
            global_loaded: false,
            loaded: HashSet::new(),
        }
    }

    /// The merged defaults tree as resolved so far.
    pub fn global_defaults(&self) -> &ConfigTree {
        &self.global
    }

    /// The configuration source used for every fetch.
    pub fn source_mut(&mut self) -> &mut ConfigSource {
        &mut self.source
    }

    /// Returns true once `category/name` has been fully resolved.
    pub fn is_loaded(&self, category: &str, name: &str) -> bool {
        self.loaded.contains(&format!("{}/{}", category, name))
    }

    /// Returns an option of a resolved object, if set.
    pub fn object_option(&self, category: &str, name: &str, option: &str) -> Option<&str> {
        self.global.get(&[category, name, option]).ok()
    }

    pub fn installation_option(&self, name: &str, option: &str) -> Option<&str> {
        self.object_option(INSTALLATIONS, name, option)
    }

    pub fn project_option(&self, name: &str, option: &str) -> Option<&str> {
        self.object_option(PROJECTS, name, option)
    }

    /// Loads the global defaults document. Only the first call fetches.
    pub fn load_global_defaults(&mut self) -> Result<()> {
        if self.global_loaded {
            return Ok(());
        }
        debug!("Loading global defaults from {}", self.global_locator);
        let mut tree = self.source.load(&self.global_locator, false)?;
        tree.create_section(INSTALLATIONS);
        tree.create_section(PROJECTS);
        self.global = tree;
        self.global_loaded = true;
        Ok(())
    }

    /// Resolves the defaults of an installation.
    pub fn load_installation_defaults(&mut self, name: &str) -> Result<ConfigTree> {
        self.load_object_defaults(INSTALLATIONS, name)
    }

    /// Resolves the defaults of a project.
    pub fn load_project_defaults(&mut self, name: &str) -> Result<ConfigTree> {
        self.load_object_defaults(PROJECTS, name)
    }

    /// Resolves `category/name` and returns its merged sub-tree.
    pub fn load_object_defaults(&mut self, category: &str, name: &str) -> Result<ConfigTree> {
        self.load_global_defaults()?;
        self.resolve_object(category, name, &mut Vec::new())
    }

    fn resolve_object(
        &mut self,
        category: &str,
        name: &str,
        resolving: &mut Vec<String>,
    ) -> Result<ConfigTree> {
        let base = format!("{}/{}", category, name);
        if self.loaded.contains(&base) {
            return Ok(self.section(category, name));
        }
        if resolving.contains(&base) {
            let mut cycle = resolving.clone();
            cycle.push(base);
            return Err(Error::CycleDetected {
                cycle: cycle.join("->"),
            });
        }

        resolving.push(base.clone());
        let result = self.resolve_uncached(category, name, resolving);
        resolving.pop();

        let tree = result?;
        self.loaded.insert(base);
        Ok(tree)
    }

    fn resolve_uncached(
        &mut self,
        category: &str,
        name: &str,
        resolving: &mut Vec<String>,
    ) -> Result<ConfigTree> {
        let path = [category, name];

        // Direct alias: the object itself is an option naming another object
        let direct_alias = self
            .global
            .get(&path)
            .map(|target| target.trim().to_string())
            .unwrap_or_default();
        if !direct_alias.is_empty() {
            debug!("{}/{} is an alias of {}", category, name, direct_alias);
            let aliased = self.resolve_object(category, &direct_alias, resolving)?;
            self.global.del_path(&path)?;
            self.global.update(&path, &aliased);
            return Ok(self.section(category, name));
        }
        if self.global.is_option(&path) {
            // An empty alias names nothing, the object becomes a plain section
            self.global.del_path(&path)?;
        }

        if self.global.get_bool(&[category, name, "SkipDefaults"], false) {
            debug!("Skipping defaults document of {}/{}", category, name);
        } else if let Ok(location) = self.global.get(&[category, name, "DefaultsLocation"]) {
            let location = location.to_string();
            debug!("Loading defaults of {}/{} from {}", category, name, location);
            let fetched = self.source.load(&location, false)?;
            self.global.update(&path, &fetched);
        }

        let alias = self.global.get_string(&[category, name, "Alias"], "");
        let alias = alias.trim();
        if !alias.is_empty() {
            debug!("{}/{} inherits defaults from {}", category, name, alias);
            let mut combined = self.resolve_object(category, alias, resolving)?;
            combined.merge(&self.section(category, name));
            if self.global.is_section(&path) {
                self.global.del_path(&path)?;
            }
            self.global.update(&path, &combined);
        }

        self.global.create_section(&path);
        Ok(self.section(category, name))
    }

    fn section(&self, category: &str, name: &str) -> ConfigTree {
        self.global
            .get_child(&[category, name])
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::tests::MockFetcher;
    use crate::source::DEFAULT_TIMEOUT;

    const GLOBAL: &str = "https://host/globalDefaults.cfg";

    const GLOBAL_DOC: &str = r#"
Installations
{
  Foo = Bar
  Bar
  {
    DefaultsLocation = https://host/bar.cfg
  }
  Baz
  {
    Alias = Bar
    Release = v2
  }
  Skip
  {
    SkipDefaults = yes
    DefaultsLocation = https://host/never.cfg
  }
  Broken
  {
    DefaultsLocation = https://host/broken.cfg
  }
  Loop1 = Loop2
  Loop2 = Loop1
  Empty =
}
Projects
{
  DIRAC
  {
    BaseURL = https://host/tars
  }
}
"#;

    const BAR_DOC: &str = r#"
Release = v1
Project = DIRAC
LocalInstallation
{
  Extra = 1
}
"#;

    fn resolver() -> (DefaultsResolver, MockFetcher) {
        let mock = MockFetcher::default();
        mock.serve(GLOBAL, GLOBAL_DOC);
        mock.serve("https://host/bar.cfg", BAR_DOC);
        let source = ConfigSource::with_fetcher(Box::new(mock.clone()), DEFAULT_TIMEOUT);
        (DefaultsResolver::new(source, GLOBAL), mock)
    }

    #[test]
    fn test_global_defaults_loaded_once_with_top_sections() {
        let mock = MockFetcher::default();
        mock.serve(GLOBAL, "Version = 1\n");
        let source = ConfigSource::with_fetcher(Box::new(mock.clone()), DEFAULT_TIMEOUT);
        let mut defaults = DefaultsResolver::new(source, GLOBAL);

        defaults.load_global_defaults().unwrap();
        defaults.load_global_defaults().unwrap();

        assert_eq!(mock.call_count(GLOBAL), 1);
        assert!(defaults.global_defaults().is_section(INSTALLATIONS));
        assert!(defaults.global_defaults().is_section(PROJECTS));
    }

    #[test]
    fn test_defaults_location_is_merged() {
        let (mut defaults, _) = resolver();
        let bar = defaults.load_installation_defaults("Bar").unwrap();
        assert_eq!(bar.get("Release").unwrap(), "v1");
        assert_eq!(bar.get("LocalInstallation/Extra").unwrap(), "1");
        assert_eq!(
            defaults.object_option(INSTALLATIONS, "Bar", "Project"),
            Some("DIRAC")
        );
        assert!(defaults.is_loaded(INSTALLATIONS, "Bar"));
    }

    #[test]
    fn test_loading_twice_is_idempotent() {
        let (mut defaults, mock) = resolver();
        let first = defaults.load_installation_defaults("Bar").unwrap();
        let second = defaults.load_installation_defaults("Bar").unwrap();
        assert_eq!(first, second);
        assert_eq!(mock.call_count("https://host/bar.cfg"), 1);
        assert_eq!(mock.call_count(GLOBAL), 1);
    }

    #[test]
    fn test_direct_alias_resolves_to_target() {
        let (mut defaults, _) = resolver();
        let foo = defaults.load_installation_defaults("Foo").unwrap();
        let bar = defaults.load_installation_defaults("Bar").unwrap();
        assert_eq!(foo, bar);
        assert!(defaults.global_defaults().is_section("Installations/Foo"));
        assert!(!defaults.global_defaults().is_option("Installations/Foo"));
    }

    #[test]
    fn test_empty_direct_alias_becomes_section() {
        let (mut defaults, _) = resolver();
        let empty = defaults.load_installation_defaults("Empty").unwrap();
        assert!(empty.is_empty());
        assert!(defaults.global_defaults().is_section("Installations/Empty"));
        assert!(!defaults.global_defaults().is_option("Installations/Empty"));
        assert!(!defaults.global_defaults().to_string().contains("Empty ="));
    }

    #[test]
    fn test_alias_option_has_lower_priority() {
        let (mut defaults, _) = resolver();
        let baz = defaults.load_installation_defaults("Baz").unwrap();
        assert_eq!(baz.get("Release").unwrap(), "v2");
        assert_eq!(baz.get("Project").unwrap(), "DIRAC");
        assert_eq!(baz.get("LocalInstallation/Extra").unwrap(), "1");
        assert!(defaults.is_loaded(INSTALLATIONS, "Bar"));
    }

    #[test]
    fn test_skip_defaults_does_not_fetch() {
        let (mut defaults, mock) = resolver();
        let skip = defaults.load_installation_defaults("Skip").unwrap();
        assert!(skip.get_bool("SkipDefaults", false));
        assert_eq!(mock.call_count("https://host/never.cfg"), 0);
    }

    #[test]
    fn test_unknown_object_yields_empty_section() {
        let (mut defaults, _) = resolver();
        let unknown = defaults.load_project_defaults("Unknown").unwrap();
        assert!(unknown.is_empty());
        assert!(defaults.global_defaults().is_section("Projects/Unknown"));
    }

    #[test]
    fn test_alias_loop_is_detected() {
        let (mut defaults, _) = resolver();
        let err = defaults.load_installation_defaults("Loop1").unwrap_err();
        match err {
            Error::CycleDetected { cycle } => {
                assert_eq!(
                    cycle,
                    "Installations/Loop1->Installations/Loop2->Installations/Loop1"
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!defaults.is_loaded(INSTALLATIONS, "Loop1"));
    }

    #[test]
    fn test_failure_does_not_mark_loaded() {
        let (mut defaults, mock) = resolver();
        let err = defaults.load_installation_defaults("Broken").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(!defaults.is_loaded(INSTALLATIONS, "Broken"));

        mock.serve("https://host/broken.cfg", "Fixed = yes\n");
        let fixed = defaults.load_installation_defaults("Broken").unwrap();
        assert!(fixed.get_bool("Fixed", false));
    }

    #[test]
    fn test_project_defaults() {
        let (mut defaults, _) = resolver();
        let dirac = defaults.load_project_defaults("DIRAC").unwrap();
        assert_eq!(dirac.get("BaseURL").unwrap(), "https://host/tars");
    }
}
