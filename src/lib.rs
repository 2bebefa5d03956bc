//! Build orchestration for hybrid Python/C++ distributions.
//!
//! This library provides the two procedures a packaging step needs before
//! it can collect a native extension:
//! - version derivation from git and propagation into the project files
//! - platform-specific CMake configure/build of each native target
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod metadata;
pub mod setup;

// Re-export commonly used types
pub use error::{CliError, Result, SetupError};
