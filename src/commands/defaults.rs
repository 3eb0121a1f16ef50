//! # Defaults Command Implementation
//!
//! This module implements the `defaults` subcommand, which prints the fully
//! merged defaults of an installation or a project, after following its
//! `DefaultsLocation` and aliases, in ConfigTree text format.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use release_config::cfg::ConfigTree;
use release_config::defaults::{DefaultsResolver, DEFAULT_GLOBAL_DEFAULTS};
use release_config::source::ConfigSource;

/// Print the merged defaults of an installation or project
#[derive(Args, Debug)]
pub struct DefaultsArgs {
    /// Locator (URL or path) of the global defaults document.
    #[arg(
        long,
        value_name = "LOCATOR",
        env = "RELEASE_CONFIG_DEFAULTS",
        default_value = DEFAULT_GLOBAL_DEFAULTS
    )]
    pub defaults: String,

    /// Installation to show.
    #[arg(short, long, value_name = "NAME", required_unless_present = "project")]
    pub installation: Option<String>,

    /// Project to show.
    #[arg(short, long, value_name = "NAME", conflicts_with = "installation")]
    pub project: Option<String>,

    /// Timeout in seconds for every fetch.
    #[arg(long, value_name = "SECONDS", env = "RELEASE_CONFIG_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,
}

/// Execute the `defaults` command.
pub fn execute(args: DefaultsArgs) -> Result<()> {
    let tree = load(&args)?;
    print!("{}", tree);
    Ok(())
}

fn load(args: &DefaultsArgs) -> Result<ConfigTree> {
    let source = ConfigSource::new(Duration::from_secs(args.timeout));
    let mut resolver = DefaultsResolver::new(source, args.defaults.clone());

    match (&args.installation, &args.project) {
        (_, Some(project)) => resolver
            .load_project_defaults(project)
            .with_context(|| format!("Failed to load defaults of project {}", project)),
        (Some(installation), None) => resolver
            .load_installation_defaults(installation)
            .with_context(|| format!("Failed to load defaults of installation {}", installation)),
        (None, None) => anyhow::bail!("Either --installation or --project is required"),
    }
}
