//! # Release Configuration Library
//!
//! This library provides the configuration core used when bootstrapping an
//! installation made of several interdependent projects. It is designed to
//! be used by the `release-config` command-line tool but can also be
//! embedded in any installer that needs to know which project releases and
//! modules to install.
//!
//! ## Quick Example
//!
//! ```
//! use release_config::cfg::ConfigTree;
//!
//! let text = r#"
//! Releases
//! {
//!   v1
//!   {
//!     Depends = Externals:v6
//!     Modules += DIRAC
//!     Modules += WebAppDIRAC
//!   }
//! }
//! "#;
//!
//! let tree = ConfigTree::parse(text).unwrap();
//! assert_eq!(tree.get("Releases/v1/Depends").unwrap(), "Externals:v6");
//! assert_eq!(
//!     tree.get_list("Releases/v1/Modules"),
//!     vec!["DIRAC", "WebAppDIRAC"]
//! );
//! assert_eq!(ConfigTree::parse(&tree.to_string()).unwrap(), tree);
//! ```
//!
//! ## Core Concepts
//!
//! - **ConfigTree (`cfg`)**: The hierarchical option/section document model,
//!   with its text parser and serializer.
//! - **Configuration sources (`source`, `fetch`, `cache`)**: Load documents
//!   from URLs or local files, verify their MD5 digest and cache them per
//!   locator.
//! - **Defaults (`defaults`)**: Resolve installation and project defaults
//!   from the global defaults document, following aliases.
//! - **Releases (`release`)**: Resolve the transitive set of project
//!   releases, detecting cycles and version conflicts, and compute the
//!   module install plan.
//!
//! ## Execution Flow
//!
//! A typical bootstrap drives a [`release::ReleaseResolver`] through:
//!
//! 1.  **Installation defaults**: which project and release to install.
//! 2.  **Project defaults**: where each project publishes its tarballs and
//!     release documents.
//! 3.  **Release resolution**: load each release document, recursively, and
//!     build the dependency list.
//! 4.  **Module plan**: the ordered modules with their tarball location and
//!     version.

pub mod cache;
pub mod cfg;
pub mod defaults;
pub mod error;
pub mod fetch;
pub mod release;
pub mod source;

#[cfg(test)]
mod cfg_proptest;
