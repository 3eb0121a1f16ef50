//! # Release Resolution
//!
//! `ReleaseResolver` computes, for a project and one or more of its
//! releases, the full transitive set of `(project, release)` pairs to
//! install, and from it the module install plan.
//!
//! ## Process
//!
//! 1.  **Release documents**: each release is described by a releases
//!     document, located either explicitly, through the project's
//!     `Releases` option in release mode, or as
//!     `<BaseURL>/release-<project>-<release>.cfg` with MD5 verification.
//!
//! 2.  **Dependencies**: `Releases/<release>/Depends` lists `project` or
//!     `project:version` entries. A bare project name means the same
//!     release string as the one being resolved.
//!
//! 3.  **Recursive resolution**: each dependency is registered against its
//!     requester, checked for cycles, resolved (once), and its transitive
//!     set merged into the requester's. The first version seen for a
//!     project wins; any other version of it is a conflict.
//!
//! 4.  **Module plan**: see [`ReleaseResolver::get_modules_to_install`].
//!
//! All state lives in one resolver instance; independent resolutions use
//! independent instances.

mod cycles;
mod depends;
mod modules;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use crate::cfg::ConfigTree;
use crate::defaults::{DefaultsResolver, DEFAULT_GLOBAL_DEFAULTS, PROJECTS};
use crate::error::{Error, Result};
use crate::source::{ConfigSource, DEFAULT_TIMEOUT};

use cycles::RequesterGraph;
pub use depends::{ProjectRelease, VersionMap};
pub use modules::{InstallPlan, ModuleInstall};

/// Run-time settings of a resolver.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Locator of the global defaults document.
    pub global_defaults: String,
    /// Installation whose defaults apply, if any.
    pub installation: Option<String>,
    /// The root project being installed.
    pub project: String,
    /// Locate release documents through `Projects/<project>/Releases`.
    pub release_mode: bool,
    /// Explicit releases document for the root project.
    pub releases_locator: Option<String>,
    /// Base URL replacing `Projects/<project>/BaseURL` when locating
    /// release documents.
    pub source_url: Option<String>,
    /// Timeout for every document fetch.
    pub timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            global_defaults: DEFAULT_GLOBAL_DEFAULTS.to_string(),
            installation: None,
            project: "DIRAC".to_string(),
            release_mode: false,
            releases_locator: None,
            source_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Where a module's sources live, from `Sources/<module>` as `[vcs|]url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    pub vcs: Option<String>,
    pub url: String,
}

/// The dependency resolution engine.
pub struct ReleaseResolver {
    settings: ResolverSettings,
    defaults: DefaultsResolver,
    release_cfgs: BTreeMap<ProjectRelease, ConfigTree>,
    release_locators: BTreeMap<ProjectRelease, String>,
    depends: BTreeMap<ProjectRelease, Vec<ProjectRelease>>,
    requesters: RequesterGraph,
}

impl ReleaseResolver {
    /// Creates a resolver fetching documents over HTTP.
    pub fn new(settings: ResolverSettings) -> Self {
        let source = ConfigSource::new(settings.timeout);
        Self::with_source(settings, source)
    }

    /// Creates a resolver on top of an existing `ConfigSource`.
    pub fn with_source(settings: ResolverSettings, source: ConfigSource) -> Self {
        let defaults = DefaultsResolver::new(source, settings.global_defaults.clone());
        Self {
            settings,
            defaults,
            release_cfgs: BTreeMap::new(),
            release_locators: BTreeMap::new(),
            depends: BTreeMap::new(),
            requesters: RequesterGraph::new(),
        }
    }

    /// The root project.
    pub fn project(&self) -> &str {
        &self.settings.project
    }

    /// Changes the root project, e.g. once the installation defaults name it.
    pub fn set_project(&mut self, project: impl Into<String>) {
        self.settings.project = project.into();
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn defaults(&self) -> &DefaultsResolver {
        &self.defaults
    }

    /// Resolves the defaults of the configured installation.
    ///
    /// Without an installation only the global defaults are loaded and an
    /// empty tree is returned.
    pub fn load_installation_defaults(&mut self) -> Result<ConfigTree> {
        match self.settings.installation.clone() {
            Some(installation) => self.defaults.load_installation_defaults(&installation),
            None => {
                self.defaults.load_global_defaults()?;
                Ok(ConfigTree::new())
            }
        }
    }

    /// Resolves the defaults of the root project.
    pub fn load_project_defaults(&mut self) -> Result<ConfigTree> {
        let project = self.settings.project.clone();
        self.defaults.load_project_defaults(&project)
    }

    /// An option of the configured installation's defaults.
    pub fn installation_option(&self, option: &str) -> Option<&str> {
        let installation = self.settings.installation.as_deref()?;
        self.defaults.installation_option(installation, option)
    }

    /// Base URL of a project's tarballs, `Projects/<project>/BaseURL`.
    pub fn tars_location(&self, project: &str) -> Result<String> {
        self.defaults
            .project_option(project, "BaseURL")
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| Error::NoTarsLocation {
                project: project.to_string(),
            })
    }

    /// Locator of a release document, and whether it must be MD5-verified.
    fn release_locator(&self, project: &str, release: &str) -> Result<(String, bool)> {
        if project == self.settings.project {
            if let Some(locator) = &self.settings.releases_locator {
                return Ok((locator.clone(), false));
            }
        }
        if self.settings.release_mode {
            return self
                .defaults
                .project_option(project, "Releases")
                .map(|locator| (locator.to_string(), false))
                .ok_or_else(|| Error::Lookup {
                    path: format!("{}/{}/Releases", PROJECTS, project),
                });
        }
        let base = match &self.settings.source_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.tars_location(project)?,
        };
        Ok((format!("{}/release-{}-{}.cfg", base, project, release), true))
    }

    /// Loads (once) the releases document describing `project:release`.
    pub fn load_release_config(&mut self, project: &str, release: &str) -> Result<&ConfigTree> {
        let key = ProjectRelease::new(project, release);
        if !self.release_cfgs.contains_key(&key) {
            self.defaults.load_project_defaults(project)?;
            let (locator, verify_hash) = self.release_locator(project, release)?;
            debug!("Releases file for {} is {}", key, locator);
            let tree = self.defaults.source_mut().load(&locator, verify_hash)?;
            self.release_locators.insert(key.clone(), locator);
            self.release_cfgs.insert(key.clone(), tree);
        }
        Ok(&self.release_cfgs[&key])
    }

    /// The releases document of `project:release`, if loaded.
    pub fn release_config(&self, project: &str, release: &str) -> Option<&ConfigTree> {
        self.release_cfgs.get(&ProjectRelease::new(project, release))
    }

    fn loaded_release(&self, project: &str, release: &str) -> Result<&ConfigTree> {
        self.release_config(project, release)
            .ok_or_else(|| Error::NotResolved {
                project: project.to_string(),
                release: release.to_string(),
            })
    }

    /// `Releases/<release>/<option>` of a loaded release document.
    pub fn release_option(&self, project: &str, release: &str, option: &str) -> Option<&str> {
        self.release_config(project, release)?
            .get(&["Releases", release, option])
            .ok()
    }

    /// Declared dependencies of a loaded release, in declaration order.
    ///
    /// Absent or malformed `Depends` entries yield no dependencies.
    pub fn release_dependencies(&self, project: &str, release: &str) -> Vec<ProjectRelease> {
        self.release_option(project, release, "Depends")
            .map(|list| {
                VersionMap::parse(list, release)
                    .iter()
                    .map(|(dep, version)| ProjectRelease::new(dep, version))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The resolved transitive dependency list of `project:release`, the
    /// release itself first.
    pub fn resolved_dependencies(&self, project: &str, release: &str) -> Option<&[ProjectRelease]> {
        self.depends
            .get(&ProjectRelease::new(project, release))
            .map(Vec::as_slice)
    }

    /// Externals version of a root project release.
    pub fn externals_version(&self, release: &str) -> Option<&str> {
        self.release_option(self.project(), release, "Externals")
    }

    /// LCG bundle version of a root project release.
    pub fn lcg_version(&self, release: &str) -> Option<&str> {
        self.release_option(self.project(), release, "LcgVer")
    }

    /// Source location of a module of a root project release.
    pub fn module_source(&self, release: &str, module: &str) -> Result<ModuleSource> {
        let cfg = self.loaded_release(self.project(), release)?;
        let value = cfg.get(&["Sources", module])?;
        let mut tokens = value.split('|').map(str::trim).filter(|t| !t.is_empty());
        match (tokens.next(), tokens.next()) {
            (Some(vcs), Some(url)) => Ok(ModuleSource {
                vcs: Some(vcs.to_string()),
                url: url.to_string(),
            }),
            (Some(url), None) => Ok(ModuleSource {
                vcs: None,
                url: url.to_string(),
            }),
            _ => Err(Error::Lookup {
                path: format!("Sources/{}", module),
            }),
        }
    }

    /// Resolves the given releases of `project` (the root project when
    /// `None`) and all their transitive dependencies.
    pub fn load_project_release(&mut self, releases: &[&str], project: Option<&str>) -> Result<()> {
        let project = project.unwrap_or(&self.settings.project).to_string();
        for release in releases {
            self.resolve_release(&project, release)?;
        }
        Ok(())
    }

    fn resolve_release(&mut self, project: &str, release: &str) -> Result<()> {
        let key = ProjectRelease::new(project, release);
        if self.depends.contains_key(&key) {
            return Ok(());
        }
        debug!("Loading release {} for project {}", release, project);

        if !self.load_release_config(project, release)?.is_section(&["Releases", release]) {
            return Err(Error::UndefinedRelease {
                project: project.to_string(),
                release: release.to_string(),
                locator: self.release_locators[&key].clone(),
            });
        }

        let declared = self.release_dependencies(project, release);
        if !declared.is_empty() {
            debug!(
                "{} depends on {}",
                key,
                declared
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        match self.collect_dependencies(&key, &declared) {
            Ok(rel_deps) => {
                self.depends.insert(key, rel_deps);
                Ok(())
            }
            Err(err) => {
                self.forget_requester(&key, &declared);
                Err(err)
            }
        }
    }

    /// Builds the transitive dependency list of `key`, registering it as a
    /// requester of each declared dependency.
    fn collect_dependencies(
        &mut self,
        key: &ProjectRelease,
        declared: &[ProjectRelease],
    ) -> Result<Vec<ProjectRelease>> {
        let mut rel_deps = vec![key.clone()];
        rel_deps.extend(declared.iter().cloned());

        for dep in declared {
            let requesters = self.requesters.entry(dep.clone()).or_default();
            requesters.push(key.clone());
            let already_requested = requesters.len() > 1;

            if let Some(cycle) = cycles::find_cycle(&self.requesters, dep) {
                return Err(Error::CycleDetected {
                    cycle: cycles::render(&cycle),
                });
            }

            if already_requested {
                debug!("{} was already requested, not descending", dep);
            } else {
                self.resolve_release(&dep.project, &dep.release)?;
            }
            if let Some(sub_deps) = self.depends.get(dep) {
                merge_dependencies(key, &mut rel_deps, sub_deps)?;
            }
        }

        if let Some(other) = rel_deps
            .iter()
            .find(|entry| entry.project == key.project && entry.release != key.release)
        {
            return Err(Error::SelfConflict {
                project: key.project.clone(),
                release: key.release.clone(),
                required: other.release.clone(),
            });
        }
        Ok(rel_deps)
    }

    /// Drops the requester edges registered for `key`, so a failed
    /// resolution can be retried.
    fn forget_requester(&mut self, key: &ProjectRelease, declared: &[ProjectRelease]) {
        for dep in declared {
            if let Some(requesters) = self.requesters.get_mut(dep) {
                if let Some(pos) = requesters.iter().rposition(|r| r == key) {
                    requesters.remove(pos);
                }
                if requesters.is_empty() {
                    self.requesters.remove(dep);
                }
            }
        }
    }

    /// Writes every loaded release document to
    /// `<dir>/releases-<project>-<release>.cfg`.
    pub fn dump_releases_to_path(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for (key, cfg) in &self.release_cfgs {
            let path = dir.join(format!("releases-{}-{}.cfg", key.project, key.release));
            std::fs::write(&path, cfg.to_string())?;
            debug!("Dumped {} to {}", key, path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Appends the entries of `sub_deps` that name new projects.
///
/// A project already present with another version is a conflict: the
/// earliest version seen for a project is authoritative.
fn merge_dependencies(
    requester: &ProjectRelease,
    rel_deps: &mut Vec<ProjectRelease>,
    sub_deps: &[ProjectRelease],
) -> Result<()> {
    for entry in sub_deps {
        match rel_deps.iter().find(|d| d.project == entry.project) {
            None => rel_deps.push(entry.clone()),
            Some(existing) if existing.release == entry.release => {}
            Some(existing) if existing.project == requester.project => {
                return Err(Error::SelfConflict {
                    project: requester.project.clone(),
                    release: requester.release.clone(),
                    required: entry.release.clone(),
                });
            }
            Some(existing) => {
                return Err(Error::VersionConflict {
                    project: entry.project.clone(),
                    first: existing.release.clone(),
                    second: entry.release.clone(),
                    requester: requester.to_string(),
                });
            }
        }
    }
    Ok(())
}
