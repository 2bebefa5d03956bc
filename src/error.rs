//! Top-level error types for the command line.
//!
//! Core failures from [`crate::setup`] are wrapped together with argument
//! errors so `main` has a single type to report.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, SetupError>;

/// Main error type for all CLI operations
#[derive(Error, Debug)]
pub enum SetupError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Version resolution or native build errors
    #[error("{0}")]
    Setup(#[from] crate::setup::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Required external tool is not installed
    #[error("{tool} not found in PATH: {hint}")]
    ToolNotFound {
        /// Tool name
        tool: String,
        /// How to get it
        hint: String,
    },
}

impl SetupError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cli(CliError::InvalidArguments { .. }) => 2,
            _ => 1,
        }
    }
}
