//! External command execution.

use crate::setup::error::{Error, Result};
use std::{
    fmt,
    future::Future,
    path::PathBuf,
};
use tokio::process::Command;

/// A fully assembled external command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExternalCommand {
    /// Program to run.
    pub program: PathBuf,
    /// Arguments, passed without shell interpretation.
    pub args: Vec<String>,
    /// Working directory of the child.
    pub cwd: PathBuf,
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Runs external commands, gated on their exit status.
pub trait CommandRunner {
    /// Runs `command` to completion.
    ///
    /// # Errors
    ///
    /// [`Error::CommandFailed`] if it cannot start,
    /// [`Error::ExternalToolFailure`] if it exits unsuccessfully.
    fn run(&self, command: &ExternalCommand) -> impl Future<Output = Result<()>> + Send;
}

/// [`CommandRunner`] spawning real processes with inherited stdio.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &ExternalCommand) -> Result<()> {
        log::info!("Running: {} (in {})", command, command.cwd.display());

        let status = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.cwd)
            .status()
            .await
            .map_err(|error| Error::CommandFailed {
                command: command.program.display().to_string(),
                error,
            })?;

        if !status.success() {
            return Err(Error::ExternalToolFailure {
                command: command.to_string(),
                status,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Records every command; fails the `fail_at`-th call (0-based).
    #[derive(Debug, Default)]
    pub struct RecordingRunner {
        pub calls: Mutex<Vec<ExternalCommand>>,
        pub fail_at: Option<usize>,
    }

    impl RecordingRunner {
        pub fn failing_at(index: usize) -> Self {
            Self {
                fail_at: Some(index),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<ExternalCommand> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        async fn run(&self, command: &ExternalCommand) -> Result<()> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(command.clone());
                calls.len() - 1
            };
            if self.fail_at == Some(index) {
                return Err(Error::ExternalToolFailure {
                    command: command.to_string(),
                    status: exit_status(2),
                });
            }
            Ok(())
        }
    }

    #[cfg(unix)]
    fn exit_status(code: i32) -> std::process::ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        // Wait status layout: exit code in the second byte.
        std::process::ExitStatus::from_raw(code << 8)
    }

    #[cfg(windows)]
    fn exit_status(code: i32) -> std::process::ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(code as u32)
    }
}
