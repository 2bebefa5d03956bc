//! Command line interface for extbuild.
//!
//! This module parses arguments, builds the runtime configuration and
//! dispatches to the command implementations.

mod args;
pub mod commands;
mod output;

pub use args::{Args, BuildArgs, Command, RuntimeConfig};
pub use output::OutputManager;

use crate::error::{CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(&args).await
}

/// Validates and executes already parsed arguments.
pub async fn execute(args: &Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let config = RuntimeConfig::from(args);
    commands::execute(args, &config).await?;
    Ok(0)
}
