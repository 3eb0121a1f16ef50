//! Computation of the module install plan for a resolved release.
//!
//! Every project of the resolved dependency list contributes the modules of
//! its `DefaultModules` list (or, without one, every module it defines),
//! plus any requested extra module it provides. A project's modules are
//! inserted at the front of the install order, so later-discovered
//! dependencies tend to come first. This is best effort, not a topological
//! order.

use std::collections::{BTreeMap, HashSet};

use log::debug;
use serde::Serialize;

use super::depends::VersionMap;
use super::{ProjectRelease, ReleaseResolver};
use crate::error::{Error, Result};

/// Where a module is installed from and at which version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInstall {
    pub tars_url: String,
    pub version: String,
}

/// Ordered module names and their install sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    pub order: Vec<String>,
    pub modules: BTreeMap<String, ModuleInstall>,
}

impl InstallPlan {
    /// Puts `name` at the front of the order; a later entry for the same
    /// module replaces the earlier one.
    fn push_front(&mut self, name: &str, tars_url: &str, version: &str) {
        self.order.retain(|existing| existing != name);
        self.order.insert(0, name.to_string());
        self.modules.insert(
            name.to_string(),
            ModuleInstall {
                tars_url: tars_url.to_string(),
                version: version.to_string(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&ModuleInstall> {
        self.modules.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A caller-requested module, optionally pinned as `name:version`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExtraModule {
    request: String,
    name: String,
    version: Option<String>,
}

impl ExtraModule {
    fn parse(request: &str) -> Self {
        let request = request.trim();
        let (name, version) = match request.split_once(':') {
            Some((name, version)) if !version.trim().is_empty() => {
                (name.trim(), Some(version.trim().to_string()))
            }
            Some((name, _)) => (name.trim(), None),
            None => (request, None),
        };
        Self {
            request: request.to_string(),
            name: name.to_string(),
            version,
        }
    }
}

impl ReleaseResolver {
    /// Modules defined by a loaded release: `Releases/<release>/Modules`,
    /// else the document's `DefaultModules`, else the project itself.
    pub fn modules_for_release(&self, project: &str, release: &str) -> Result<VersionMap> {
        let cfg = self.loaded_release(project, release)?;
        let list = cfg
            .get(&["Releases", release, "Modules"])
            .or_else(|_| cfg.get("DefaultModules"))
            .unwrap_or(project);
        Ok(VersionMap::parse(list, release))
    }

    /// Modules a release installs when no extra module is requested.
    fn default_modules(&self, project: &str, release: &str) -> Result<VersionMap> {
        let cfg = self.loaded_release(project, release)?;
        match cfg.get("DefaultModules") {
            Ok(list) => Ok(VersionMap::parse(list, release)),
            Err(_) => self.modules_for_release(project, release),
        }
    }

    /// Computes the install plan for a resolved release of the root project.
    ///
    /// `extra_modules` entries are module names, optionally pinned as
    /// `name:version`. A name matches a module of any resolved project, or
    /// `<name>DIRAC` in a project other than the root. The
    /// `RequiredExtraModules` of every resolved release are requested too.
    /// Fails with [`Error::MissingExtraModule`] if a request matches nothing.
    pub fn get_modules_to_install(
        &self,
        release: &str,
        extra_modules: &[&str],
    ) -> Result<InstallPlan> {
        let root = ProjectRelease::new(self.project(), release);
        let projects = self
            .resolved_dependencies(&root.project, &root.release)
            .ok_or_else(|| Error::NotResolved {
                project: root.project.clone(),
                release: root.release.clone(),
            })?;

        let mut extras: Vec<ExtraModule> = extra_modules
            .iter()
            .map(|request| ExtraModule::parse(request))
            .filter(|extra| !extra.name.is_empty())
            .collect();
        for dep in projects {
            let cfg = self.loaded_release(&dep.project, &dep.release)?;
            for request in cfg.get_list(&["Releases", dep.release.as_str(), "RequiredExtraModules"]) {
                let required = ExtraModule::parse(&request);
                if !extras.iter().any(|extra| extra.name == required.name) {
                    debug!("{} requires extra module {}", dep, required.request);
                    extras.push(required);
                }
            }
        }

        let mut found: HashSet<&str> = HashSet::new();
        let mut plan = InstallPlan::default();

        for dep in projects {
            let mut versions = self.modules_for_release(&dep.project, &dep.release)?;
            let tars_url = self.tars_location(&dep.project)?;
            debug!("Discovering modules to install for {}", dep);

            let mut to_install = self.default_modules(&dep.project, &dep.release)?;
            for (name, version) in to_install.clone().iter() {
                to_install.insert(name, versions.get(name).unwrap_or(version));
            }

            for extra in &extras {
                let mut candidates = vec![extra.name.clone()];
                if dep.project != root.project {
                    candidates.push(format!("{}DIRAC", extra.name));
                }
                for candidate in candidates {
                    if !versions.contains(&candidate) {
                        continue;
                    }
                    if let Some(pinned) = &extra.version {
                        versions.insert(&candidate, pinned);
                    }
                    let version = versions.get(&candidate).unwrap_or(&dep.release);
                    to_install.insert(&candidate, version);
                    found.insert(extra.name.as_str());
                }
            }

            debug!(
                "Modules to be installed for {} are: {}",
                dep,
                to_install
                    .iter()
                    .map(|(name, version)| format!("{}:{}", name, version))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            for (name, version) in to_install.iter() {
                plan.push_front(name, &tars_url, version);
            }
        }

        let missing: Vec<String> = extras
            .iter()
            .filter(|extra| !found.contains(extra.name.as_str()))
            .map(|extra| extra.request.clone())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingExtraModule { modules: missing });
        }

        Ok(plan)
    }
}
