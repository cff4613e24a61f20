//! Error types for dependency discovery and staging.
//!
//! Every variant is fatal. A bundle that is missing a single library is
//! broken, so nothing here is collected and reported later; the first error
//! aborts the run before any file is copied.
//!
//! Variants fall into two groups:
//! - Input problems the caller can fix (bad target, bad output directory,
//!   incomplete or inconsistent search directories).
//! - Internal problems (the lister could not run, I/O failed).

use std::path::PathBuf;
use thiserror::Error;

/// Result type for bundle operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{} does not exist", .0.display())]
    TargetMissing(PathBuf),

    #[error("{} is not a file", .0.display())]
    TargetNotFile(PathBuf),

    #[error("output directory {} does not exist or is not a directory", .0.display())]
    OutputDirInvalid(PathBuf),

    /// The lister printed something we don't know how to read.
    #[error("unexpected line in dependency listing for {}: {line}", .binary.display())]
    UnexpectedLine { binary: PathBuf, line: String },

    /// The lister itself reported `not found` and the search directories had no copy either.
    #[error(
        "{} depends on {dependency} but the lister could not find its location; \
         add a directory containing it to the search directories",
        .binary.display()
    )]
    NotFound { binary: PathBuf, dependency: String },

    /// The lister found the library somewhere the search directories do not cover.
    #[error(
        "could not find {dependency} in the search directories, but the lister found it at {reported}; \
         update the search directories and run again"
    )]
    OutsideSearchPath { dependency: String, reported: String },

    #[error(
        "{dependency} appears to have more than one location: {} and {}",
        .first.display(),
        .second.display()
    )]
    Conflict {
        dependency: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("dependency lister `{program}` failed on {}: {message}", .binary.display())]
    Lister {
        program: String,
        binary: PathBuf,
        message: String,
    },

    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dependency graph JSON error")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if the caller can fix this by changing the arguments.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::TargetMissing(_)
                | Self::TargetNotFile(_)
                | Self::OutputDirInvalid(_)
                | Self::NotFound { .. }
                | Self::OutsideSearchPath { .. }
                | Self::Conflict { .. }
        )
    }
}
