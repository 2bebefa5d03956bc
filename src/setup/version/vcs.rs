//! Read-only queries against the version-control system.

use crate::setup::error::{Error, Result};
use std::{
    future::Future,
    path::{Path, PathBuf},
};
use tokio::process::Command;

/// Version-control queries needed to resolve a version.
pub trait Vcs {
    /// Raw `describe --tags --dirty --long --always` output.
    ///
    /// `None` when nothing was printed: the tool is missing or the project
    /// is not a checkout.
    fn describe(&self) -> impl Future<Output = Option<String>> + Send;

    /// Raw `log <hash> -1 --format="%H %at"` output.
    fn commit_info(&self, hash: &str) -> impl Future<Output = Result<String>> + Send;
}

/// [`Vcs`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo: PathBuf,
    git: Option<PathBuf>,
}

impl GitCli {
    /// Queries the repository containing `repo`, locating `git` on `PATH`.
    pub fn new(repo: impl AsRef<Path>) -> Self {
        let git = match which::which("git") {
            Ok(path) => {
                log::debug!("Found git at: {}", path.display());
                Some(path)
            }
            Err(e) => {
                log::debug!("git not found in PATH: {}", e);
                None
            }
        };

        Self {
            repo: repo.as_ref().to_path_buf(),
            git,
        }
    }
}

impl Vcs for GitCli {
    async fn describe(&self) -> Option<String> {
        let git = self.git.as_ref()?;

        let output = Command::new(git)
            .args(["describe", "--tags", "--dirty", "--long", "--always"])
            .current_dir(&self.repo)
            .output()
            .await
            .map_err(|e| log::debug!("git describe could not run: {}", e))
            .ok()?;

        if !output.status.success() {
            log::debug!(
                "git describe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!stdout.is_empty()).then_some(stdout)
    }

    async fn commit_info(&self, hash: &str) -> Result<String> {
        let git = self.git.as_ref().ok_or_else(|| Error::CommandFailed {
            command: "git log".to_string(),
            error: std::io::Error::new(std::io::ErrorKind::NotFound, "git not found in PATH"),
        })?;

        let output = Command::new(git)
            .args(["log", hash, "-1", "--format=%H %at"])
            .current_dir(&self.repo)
            .output()
            .await
            .map_err(|error| Error::CommandFailed {
                command: "git log".to_string(),
                error,
            })?;

        if !output.status.success() {
            log::error!("{}", String::from_utf8_lossy(&output.stderr).trim());
            return Err(Error::ExternalToolFailure {
                command: format!("git log {hash} -1 --format=\"%H %at\""),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn describe_outside_a_checkout_is_none() {
        let dir = tempfile::tempdir().unwrap();
        // A fresh temp dir is not a repository; with or without git on PATH
        // nothing is printed on stdout.
        let git = GitCli::new(dir.path());
        assert_eq!(git.describe().await, None);
    }
}
