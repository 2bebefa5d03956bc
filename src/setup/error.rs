//! Error types for version resolution and native build orchestration.
//!
//! Every failure is fatal to the build: the variants only differ in the
//! diagnostic they carry back to the invoking packaging process.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    process::ExitStatus,
};
use thiserror::Error;

/// Result type for setup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving the version or building native targets.
#[derive(Error, Debug)]
pub enum Error {
    /// No describe output and nothing previously persisted to recover from.
    #[error(
        "no version available: not a git checkout and no persisted version record found (looked in {})",
        join_paths(.searched)
    )]
    VersionUnavailable {
        /// Files that were inspected for a persisted version.
        searched: Vec<PathBuf>,
    },

    /// `git describe` printed something neither pattern understands.
    #[error("unrecognized `git describe` output: {output:?}")]
    MalformedDescribeOutput {
        /// Raw describe output.
        output: String,
    },

    /// `git log` did not yield a usable commit timestamp.
    #[error("cannot read commit date of {hash}: {output:?}")]
    MalformedCommitInfo {
        /// Commit that was queried.
        hash: String,
        /// Raw log output.
        output: String,
    },

    /// The third-party include directory could not be auto-located.
    #[error(
        "unable to find the Eigen3 library in the packaging environment (searched {}); pass --eigen-root",
        join_paths(.searched)
    )]
    DependencyNotFound {
        /// Conventional locations that were probed.
        searched: Vec<PathBuf>,
    },

    /// An external command ran and exited unsuccessfully.
    #[error("`{command}` failed with {status}")]
    ExternalToolFailure {
        /// Rendered command line.
        command: String,
        /// Exit status reported by the child.
        status: ExitStatus,
    },

    /// An external command could not be started.
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Program that failed to spawn.
        command: String,
        /// Underlying spawn error.
        error: std::io::Error,
    },

    /// I/O error with the file and the action that failed.
    #[error("{context} {}: {error}", .path.display())]
    Fs {
        /// What was being attempted.
        context: String,
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        error: std::io::Error,
    },

    /// Persisted record could not be (de)serialized.
    #[error("version record: {0}")]
    Json(#[from] serde_json::Error),

    /// Version module template failed to render.
    #[error("template: {0}")]
    Template(#[from] handlebars::RenderError),

    /// `extbuild.toml` could not be parsed.
    #[error("invalid project manifest {}: {error}", .path.display())]
    Manifest {
        /// Manifest path.
        path: PathBuf,
        /// Parse error.
        error: toml::de::Error,
    },

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Attaches file context to I/O results.
pub trait ErrorExt<T> {
    /// Wraps the error with the action being performed and the path involved.
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context: context.to_string(),
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Converts a missing value into a [`Error::GenericError`].
pub trait Context<T> {
    /// Fails with `msg` when the value is absent.
    fn context<C: Display>(self, msg: C) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, msg: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

/// Returns early with a [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::setup::Error::GenericError(format!($($arg)*)))
    };
}
