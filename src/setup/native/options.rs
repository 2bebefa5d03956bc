//! User-declared build options and their resolution against the
//! environment.

use super::environment::{EnvironmentProbe, locate_eigen};
use crate::setup::error::Result;
use std::fmt;

/// Options a user may set on the command line for the native build.
///
/// Values are plain strings and passed through verbatim.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserOptions {
    /// Preferred C++ compiler.
    pub cxx_compiler: Option<String>,
    /// Preferred Eigen3 include directory.
    pub eigen_root: Option<String>,
}

/// Options for one native build invocation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BuildOptions {
    /// Explicit C++ compiler; the generator default otherwise.
    pub compiler_override: Option<String>,
    /// Explicit Eigen3 include directory.
    pub third_party_include_override: Option<String>,
    /// Build the `Debug` configuration.
    pub is_debug: bool,
    /// Ask the native tool for verbose output.
    pub verbose: bool,
    /// Configure only.
    pub dry_run: bool,
}

impl BuildOptions {
    /// Applies options set by the user; unset values leave the current
    /// ones in place.
    pub fn apply(&mut self, user: &UserOptions) {
        if let Some(compiler) = &user.cxx_compiler {
            self.compiler_override = Some(compiler.clone());
        }
        if let Some(root) = &user.eigen_root {
            self.third_party_include_override = Some(root.clone());
        }
    }

    /// Merges the options with what the environment provides.
    ///
    /// An explicit include override always wins. Without one, a managed
    /// environment must provide Eigen3 under its prefix; a plain
    /// environment leaves the lookup to CMake.
    pub fn resolve(&self, probe: &impl EnvironmentProbe) -> Result<ResolvedOptions> {
        let include_dir = match &self.third_party_include_override {
            Some(dir) => Some(dir.clone()),
            None if probe.is_managed() => Some(locate_eigen(probe)?.display().to_string()),
            None => None,
        };

        Ok(ResolvedOptions {
            compiler: self.compiler_override.clone(),
            include_dir,
            config: if self.is_debug {
                BuildConfig::Debug
            } else {
                BuildConfig::Release
            },
            verbose: self.verbose,
        })
    }
}

/// CMake build configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildConfig {
    /// `Debug`
    Debug,
    /// `Release`
    Release,
}

impl BuildConfig {
    /// Configuration label as CMake spells it.
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Options after merging with the environment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedOptions {
    /// `CMAKE_CXX_COMPILER`, if any.
    pub compiler: Option<String>,
    /// `EIGEN3_INCLUDE_DIR`, if any.
    pub include_dir: Option<String>,
    /// Build configuration.
    pub config: BuildConfig,
    /// Verbose native build.
    pub verbose: bool,
}
