//! Shared test utilities for integration and E2E tests.
//!
//! Every fixture lives in a temporary directory: the global defaults
//! document and the release documents are local files, and each project's
//! `BaseURL` points at the directory itself, so resolution never touches
//! the network.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = ReleaseFixture::new()
//!     .with_projects(&["DIRAC"])
//!     .with_release("DIRAC", "v1", docs::DIRAC_V1);
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::docs;
    pub use super::ReleaseFixture;
}

/// Release documents shared by several tests.
#[allow(dead_code)]
pub mod docs {
    /// `DIRAC:v1`, depending on `Web:w1`, with externals and sources.
    pub const DIRAC_V1: &str = r#"
# DIRAC releases
DefaultModules = DIRAC
Sources
{
  DIRAC = git|https://github.com/DIRACGrid/DIRAC.git
}
Releases
{
  v1
  {
    Depends = Web:w1
    Externals = v6r6p8
    LcgVer = 2018-01-01
  }
}
"#;

    /// `Web:w1`, providing `WebAppDIRAC` and an optional `WebExtra`.
    pub const WEB_W1: &str = r#"
DefaultModules = WebAppDIRAC
Releases
{
  w1
  {
    Modules = WebAppDIRAC, WebExtra:x3
  }
}
"#;
}

/// A temporary directory holding a global defaults document and release
/// documents.
pub struct ReleaseFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl ReleaseFixture {
    /// Create a new fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write the global defaults document: the `Test` installation
    /// (`DIRAC:v1`), its alias `Latest`, and each project with this
    /// directory as `BaseURL`.
    pub fn with_projects(self, projects: &[&str]) -> Self {
        let mut global = String::from(
            "Installations\n{\n  Test\n  {\n    Project = DIRAC\n    Release = v1\n  }\n  Latest = Test\n}\nProjects\n{\n",
        );
        for project in projects {
            global.push_str(&format!(
                "  {}\n  {{\n    BaseURL = {}\n  }}\n",
                project,
                self.path().display()
            ));
        }
        global.push_str("}\n");
        self.with_file("globalDefaults.cfg", &global)
    }

    /// Write the releases document of `project:release`.
    pub fn with_release(self, project: &str, release: &str, content: &str) -> Self {
        let name = format!("release-{}-{}.cfg", project, release);
        self.with_file(&name, content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Get the path to the global defaults document.
    pub fn defaults_path(&self) -> PathBuf {
        self.temp_dir.path().join("globalDefaults.cfg")
    }

    /// Create a command running in this fixture's directory, reading the
    /// fixture's global defaults.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("release-config");
        cmd.current_dir(self.path())
            .env("RELEASE_CONFIG_DEFAULTS", self.defaults_path())
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for ReleaseFixture {
    fn default() -> Self {
        Self::new()
    }
}
