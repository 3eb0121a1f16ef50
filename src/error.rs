//! # Error Handling
//!
//! This module defines the centralized error type for `release-config`. It
//! uses the `thiserror` library to build a single `Error` enum covering every
//! failure the configuration engine and the release resolver can report.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant corresponds to one failure
//!   class and carries enough context (locator, line, project, release,
//!   cycle path) to produce a descriptive message.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! The variants fall into these groups:
//!
//! - Fetch failures: `Network`, `Timeout`, `NotFound`.
//! - Integrity failures: `Integrity`.
//! - Document failures: `ConfigParse`, `ConfigLoad`, `Lookup`.
//! - Resolution failures: `UndefinedRelease`, `VersionConflict`,
//!   `SelfConflict`, `CycleDetected`, `MissingExtraModule`,
//!   `NoTarsLocation`, `NotResolved`.
//! - I/O errors.
//!
//! None of these are fatal by themselves: every one is returned to the
//! caller, which decides whether the bootstrap aborts.

use thiserror::Error;

/// Main error type for release-config operations
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration document does not follow the ConfigTree grammar.
    #[error("Configuration parsing error at line {line}: {message}")]
    ConfigParse { line: usize, message: String },

    /// A fetched or local document could not be turned into a ConfigTree.
    #[error("Failed to load configuration from {locator}: {source}")]
    ConfigLoad {
        locator: String,
        #[source]
        source: Box<Error>,
    },

    /// An option or section was requested on a path that does not exist.
    #[error("Option or section not found: {path}")]
    Lookup { path: String },

    /// A transport-level failure while fetching a remote resource.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// A fetch did not complete within the allotted time.
    #[error("Timed out after {seconds}s while fetching {url}")]
    Timeout { url: String, seconds: u64 },

    /// The remote resource does not exist.
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    /// The content hash of a fetched document does not match its `.md5` sibling.
    #[error("Integrity check failed for {url}: expected {expected}, got {actual}")]
    Integrity {
        url: String,
        expected: String,
        actual: String,
    },

    /// The release is not present in its own releases document.
    #[error("Release {release} is not defined for project {project} in {locator}")]
    UndefinedRelease {
        project: String,
        release: String,
        locator: String,
    },

    /// Two requirers demand different versions of the same project.
    #[error(
        "{project} is required with two different versions ( {first} and {second} ) starting with {requester}"
    )]
    VersionConflict {
        project: String,
        first: String,
        second: String,
        requester: String,
    },

    /// A project ends up requiring a different version of itself.
    #[error("{project}:{release} requires itself with a different version through dependencies ( {required} )")]
    SelfConflict {
        project: String,
        release: String,
        required: String,
    },

    /// A circular dependency was detected between project releases or aliases.
    #[error("Circular dependency found: {cycle}")]
    CycleDetected { cycle: String },

    /// Requested extra modules were not provided by any resolved project.
    #[error("No module {} found in any project", modules.join(", "))]
    MissingExtraModule { modules: Vec<String> },

    /// No tarball base location is configured for a project.
    #[error("Don't know how to find the installation tarballs for project {project}")]
    NoTarsLocation { project: String },

    /// A module plan was requested for a release that was never resolved.
    #[error("Release {release} of project {project} has not been resolved")]
    NotResolved { project: String, release: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
