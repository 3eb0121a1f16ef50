//! CLI argument parsing and command dispatch

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::commands;

/// Release Config - Resolve project releases and their module install plan
#[derive(Parser, Debug)]
#[command(name = "release-config")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a release and print the modules to install
    Resolve(commands::resolve::ResolveArgs),

    /// Display the resolved dependencies of a release as a tree
    Tree(commands::tree::TreeArgs),

    /// Print the merged defaults of an installation or project
    Defaults(commands::defaults::DefaultsArgs),

    /// Resolve a release and write every loaded release document to a directory
    Dump(commands::dump::DumpArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level)?;
        init_color(&self.color)?;

        match self.command {
            Commands::Resolve(args) => commands::resolve::execute(args),
            Commands::Tree(args) => commands::tree::execute(args),
            Commands::Defaults(args) => commands::defaults::execute(args),
            Commands::Dump(args) => commands::dump::execute(args),
        }
    }
}

/// Initializes `env_logger`; `RUST_LOG`, when set, takes precedence.
fn init_logging(level: &str) -> Result<()> {
    let filter: log::LevelFilter = match level.parse() {
        Ok(filter) => filter,
        Err(_) => bail!(
            "Invalid log level '{}' (expected error, warn, info, debug or trace)",
            level
        ),
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(filter).format_timestamp(None);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    builder.try_init().ok();
    Ok(())
}

fn init_color(when: &str) -> Result<()> {
    match when {
        "always" => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        }
        "never" => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        "auto" => {}
        other => bail!("Invalid color mode '{}' (expected always, never or auto)", other),
    }
    Ok(())
}
