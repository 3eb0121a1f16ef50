//! # Dump Command Implementation
//!
//! Resolves a release and writes every release document loaded along the
//! way to `releases-<project>-<release>.cfg` files, for diagnosing what an
//! installation actually used.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::ResolverOpts;

/// Resolve a release and write every loaded release document to a directory
#[derive(Args, Debug)]
pub struct DumpArgs {
    #[command(flatten)]
    pub resolver: ResolverOpts,

    /// Directory to write the release documents into.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,
}

/// Execute the `dump` command.
pub fn execute(args: DumpArgs) -> Result<()> {
    for path in run(&args)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn run(args: &DumpArgs) -> Result<Vec<PathBuf>> {
    let (resolver, _) = args.resolver.resolve()?;
    resolver
        .dump_releases_to_path(&args.output)
        .with_context(|| format!("Failed to write release documents to {}", args.output.display()))
}
