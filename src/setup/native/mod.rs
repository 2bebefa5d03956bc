//! Native extension builds driven by CMake.
//!
//! - [`environment`] - interpreter prefix and managed-environment detection
//! - [`options`] - user options merged with the environment
//! - [`invocation`] - pure assembly of the configure/build arguments
//! - [`runner`] - external command execution
//! - [`orchestrator`] - per-target configure/build sequencing

pub mod environment;
pub mod invocation;
pub mod options;
pub mod orchestrator;
pub mod platform;
pub mod runner;

pub use environment::{EnvironmentProbe, InterpreterProbe, locate_eigen};
pub use invocation::{InvocationContext, NativeBuildInvocation, assemble};
pub use options::{BuildConfig, BuildOptions, ResolvedOptions, UserOptions};
pub use orchestrator::{BuildLayout, BuildState, NativeBuildOrchestrator, TargetReport};
pub use platform::Platform;
pub use runner::{CommandRunner, ExternalCommand, ProcessRunner};
