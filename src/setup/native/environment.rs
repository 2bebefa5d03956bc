//! Interpreter and packaging-environment introspection.
//!
//! A managed packaging environment (a conda prefix) ships the header-only
//! Eigen3 library under its own prefix, so its include directory can be
//! located without user input.

use crate::setup::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Sentinel directory present in every conda prefix.
pub const SENTINEL_DIR: &str = "conda-meta";

/// Marker module importable from a conda base interpreter.
pub const MARKER_MODULE: &str = "conda";

/// What the orchestrator needs to know about the interpreter environment.
pub trait EnvironmentProbe {
    /// Interpreter the extension is built for.
    fn interpreter(&self) -> &Path;

    /// Installation prefix of the interpreter (`sys.prefix`).
    fn prefix(&self) -> &Path;

    /// Whether the interpreter belongs to a managed packaging environment.
    fn is_managed(&self) -> bool;

    /// Whether `path` exists. Overridable so tests need no real prefix.
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Probe backed by a real interpreter, queried once at construction.
#[derive(Debug, Clone)]
pub struct InterpreterProbe {
    interpreter: PathBuf,
    prefix: PathBuf,
    managed: bool,
}

impl InterpreterProbe {
    /// Inspects `interpreter`, or the first `python3`/`python` on `PATH`.
    pub async fn detect(interpreter: Option<PathBuf>) -> Result<Self> {
        let interpreter = match interpreter {
            Some(path) => path,
            None => which::which("python3")
                .or_else(|_| which::which("python"))
                .map_err(|e| Error::CommandFailed {
                    command: "python3".to_string(),
                    error: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
                })?,
        };
        log::debug!("Using interpreter {}", interpreter.display());

        let output = Command::new(&interpreter)
            .args(["-c", "import sys; print(sys.prefix)"])
            .output()
            .await
            .map_err(|error| Error::CommandFailed {
                command: interpreter.display().to_string(),
                error,
            })?;

        if !output.status.success() {
            return Err(Error::ExternalToolFailure {
                command: format!("{} -c \"import sys; print(sys.prefix)\"", interpreter.display()),
                status: output.status,
            });
        }

        let prefix = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        let managed = if prefix.join(SENTINEL_DIR).is_dir() {
            true
        } else {
            imports_marker(&interpreter).await
        };

        log::info!(
            "Interpreter prefix {} ({})",
            prefix.display(),
            if managed { "managed environment" } else { "plain environment" }
        );

        Ok(Self {
            interpreter,
            prefix,
            managed,
        })
    }
}

async fn imports_marker(interpreter: &Path) -> bool {
    Command::new(interpreter)
        .args(["-c", &format!("import {MARKER_MODULE}")])
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

impl EnvironmentProbe for InterpreterProbe {
    fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    fn prefix(&self) -> &Path {
        &self.prefix
    }

    fn is_managed(&self) -> bool {
        self.managed
    }
}

/// Conventional Eigen3 include directories under a packaging prefix,
/// in probing order: POSIX layout, then the Windows `Library` layout and
/// its parent.
pub fn eigen_candidates(prefix: &Path) -> Vec<PathBuf> {
    let library = prefix.join("Library").join("include");
    vec![
        prefix.join("include").join("eigen3"),
        library.join("eigen3"),
        library,
    ]
}

/// Locates the Eigen3 include directory inside the probe's prefix.
///
/// # Errors
///
/// [`Error::DependencyNotFound`] when no conventional location exists.
pub fn locate_eigen(probe: &impl EnvironmentProbe) -> Result<PathBuf> {
    let candidates = eigen_candidates(probe.prefix());

    match candidates.iter().find(|path| probe.exists(path)) {
        Some(found) => {
            log::info!("Found Eigen3 at {}", found.display());
            Ok(found.clone())
        }
        None => Err(Error::DependencyNotFound {
            searched: candidates,
        }),
    }
}
