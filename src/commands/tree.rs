//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays the declared
//! dependencies of a resolved release in a hierarchical format.
//!
//! ## Functionality
//!
//! - **Dependency Visualization**: Each release lists the releases it
//!   declares in its `Depends` option, recursively.
//! - **Depth Control**: Supports `--depth` flag to limit tree depth.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use release_config::release::{ProjectRelease, ReleaseResolver};

use super::ResolverOpts;

/// Display the resolved dependencies of a release as a tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub resolver: ResolverOpts,

    /// Maximum depth to display in the tree.
    ///
    /// If not specified, displays the full tree.
    /// Use 0 to show only the root release.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs) -> Result<()> {
    let (resolver, release) = args.resolver.resolve()?;
    let root = ProjectRelease::new(resolver.project(), release);
    let tree_root = build_tree_node(&resolver, &root, args.depth.unwrap_or(usize::MAX), 0);
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

/// Build a tree node for a release from its declared dependencies
fn build_tree_node(
    resolver: &ReleaseResolver,
    release: &ProjectRelease,
    max_depth: usize,
    current_depth: usize,
) -> TreeNode {
    let label = release.to_string();
    if current_depth >= max_depth {
        return TreeNode {
            label,
            children: vec![],
        };
    }

    let children = resolver
        .release_dependencies(&release.project, &release.release)
        .iter()
        .map(|dep| build_tree_node(resolver, dep, max_depth, current_depth + 1))
        .collect();
    TreeNode { label, children }
}

/// Tree node structure for ptree visualization
#[derive(Clone, Debug, PartialEq)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
