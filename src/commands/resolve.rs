//! # Resolve Command Implementation
//!
//! This module implements the `resolve` subcommand, which resolves a release
//! of a project together with all of its dependencies and prints the
//! modules an installer would fetch, in install order.
//!
//! The plan can be printed as text or, with `--json`, as a JSON document for
//! consumption by other tools.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde::Serialize;

use release_config::release::{InstallPlan, ProjectRelease};

use super::ResolverOpts;

/// Resolve a release and print the modules to install
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub resolver: ResolverOpts,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Extra modules to install, optionally pinned as NAME:VERSION
    #[arg(value_name = "MODULE")]
    pub extra_modules: Vec<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    project: &'a str,
    release: &'a str,
    externals: Option<&'a str>,
    lcg: Option<&'a str>,
    dependencies: &'a [ProjectRelease],
    plan: &'a InstallPlan,
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs) -> Result<()> {
    let output = run(&args)?;
    print!("{}", output);
    Ok(())
}

fn run(args: &ResolveArgs) -> Result<String> {
    let (resolver, release) = args.resolver.resolve()?;
    let extras: Vec<&str> = args.extra_modules.iter().map(String::as_str).collect();
    let plan = resolver
        .get_modules_to_install(&release, &extras)
        .context("Failed to compute the modules to install")?;
    let dependencies = resolver
        .resolved_dependencies(resolver.project(), &release)
        .unwrap_or_default();

    let report = Report {
        project: resolver.project(),
        release: &release,
        externals: resolver.externals_version(&release),
        lcg: resolver.lcg_version(&release),
        dependencies,
        plan: &plan,
    };

    if args.json {
        let mut json = serde_json::to_string_pretty(&report)?;
        json.push('\n');
        return Ok(json);
    }
    Ok(render_text(&report))
}

fn render_text(report: &Report<'_>) -> String {
    let mut out = format!(
        "{} {}:{}\n",
        style("Release").bold(),
        report.project,
        report.release
    );
    if let Some(externals) = report.externals {
        out.push_str(&format!("  Externals: {}\n", externals));
    }
    if let Some(lcg) = report.lcg {
        out.push_str(&format!("  LCG bundle: {}\n", lcg));
    }

    out.push_str(&format!("{}\n", style("Dependencies").bold()));
    for dep in report.dependencies {
        out.push_str(&format!("  {}\n", dep));
    }

    out.push_str(&format!("{}\n", style("Modules to install").bold()));
    for name in &report.plan.order {
        if let Some(module) = report.plan.get(name) {
            out.push_str(&format!(
                "  {}:{} from {}\n",
                style(name).green(),
                module.version,
                module.tars_url
            ));
        }
    }
    out
}
