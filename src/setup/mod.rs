//! Build orchestration for hybrid Python/C++ distributions.
//!
//! Two independent stages, run in this order by the `build` command:
//!
//! - [`version`] derives the distribution version from git and propagates
//!   it into the files that declare it
//! - [`native`] configures and builds each native extension with CMake

pub mod error;
pub mod native;
pub mod utils;
pub mod version;

pub use error::{Context, Error, ErrorExt, Result};
