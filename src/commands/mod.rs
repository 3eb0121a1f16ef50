//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `release-config` command-line tool. Each subcommand is defined in its own
//! file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `release_config` library.
//!
//! The options shared by every command that resolves releases live in
//! [`ResolverOpts`].

pub mod defaults;
pub mod dump;
pub mod resolve;
pub mod tree;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;

use release_config::defaults::DEFAULT_GLOBAL_DEFAULTS;
use release_config::release::{ReleaseResolver, ResolverSettings};

/// Options selecting what to resolve and where documents come from.
#[derive(Args, Debug, Clone)]
pub struct ResolverOpts {
    /// Locator (URL or path) of the global defaults document.
    #[arg(
        long,
        value_name = "LOCATOR",
        env = "RELEASE_CONFIG_DEFAULTS",
        default_value = DEFAULT_GLOBAL_DEFAULTS
    )]
    pub defaults: String,

    /// Installation whose defaults select the project and release.
    #[arg(short, long, value_name = "NAME")]
    pub installation: Option<String>,

    /// Project to install.
    ///
    /// Defaults to the installation's `Project` option, then to DIRAC.
    #[arg(short, long, value_name = "NAME")]
    pub project: Option<String>,

    /// Release to install.
    ///
    /// Defaults to the installation's `Release` option.
    #[arg(short, long, value_name = "RELEASE")]
    pub release: Option<String>,

    /// Locate release documents through each project's `Releases` option.
    #[arg(long)]
    pub release_mode: bool,

    /// Releases document to use for the root project.
    #[arg(long, value_name = "LOCATOR")]
    pub releases: Option<String>,

    /// Base URL replacing the projects' tarball location when fetching
    /// release documents.
    #[arg(long, value_name = "URL")]
    pub source_url: Option<String>,

    /// Timeout in seconds for every fetch.
    #[arg(long, value_name = "SECONDS", env = "RELEASE_CONFIG_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,
}

impl ResolverOpts {
    pub fn settings(&self) -> ResolverSettings {
        ResolverSettings {
            global_defaults: self.defaults.clone(),
            installation: self.installation.clone(),
            project: self.project.clone().unwrap_or_else(|| "DIRAC".to_string()),
            release_mode: self.release_mode,
            releases_locator: self.releases.clone(),
            source_url: self.source_url.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }

    /// Builds a resolver, applies the installation defaults and resolves the
    /// selected release. Returns the resolver and the release string.
    pub fn resolve(&self) -> Result<(ReleaseResolver, String)> {
        let mut resolver = ReleaseResolver::new(self.settings());

        resolver
            .load_installation_defaults()
            .context("Failed to load installation defaults")?;
        if self.project.is_none() {
            if let Some(project) = resolver.installation_option("Project") {
                let project = project.to_string();
                resolver.set_project(project);
            }
        }
        let release = match &self.release {
            Some(release) => release.clone(),
            None => resolver
                .installation_option("Release")
                .map(str::to_string)
                .ok_or_else(|| {
                    anyhow!("No release given and the installation does not define one")
                })?,
        };

        resolver
            .load_project_defaults()
            .context("Failed to load project defaults")?;
        resolver
            .load_project_release(&[release.as_str()], None)
            .with_context(|| {
                format!("Failed to resolve {}:{}", resolver.project(), release)
            })?;

        Ok((resolver, release))
    }
}
