//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap,
//! with validation and the derived runtime configuration.

use crate::setup::native::{BuildOptions, UserOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Version propagation and CMake build orchestration
#[derive(Parser, Debug)]
#[command(
    name = "extbuild",
    version,
    about = "Version propagation and CMake build orchestration for hybrid Python/C++ distributions",
    long_about = "Resolves the distribution version from git, writes it into the files that declare it,
then configures and builds each native extension with CMake.

Usage:
  extbuild version --full
  extbuild build-ext --eigen-root /usr/include/eigen3 --debug
  extbuild build --cxx-compiler clang++ --verbose

Exit code 0 = every target configured and built."
)]
pub struct Args {
    /// Project root (holds CMakeLists.txt and extbuild.toml)
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".", global = true)]
    pub project_root: PathBuf,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the version and propagate it into the project files
    Version {
        /// Append the commit date
        #[arg(long)]
        full: bool,
    },

    /// Configure and build the native extensions
    BuildExt(BuildArgs),

    /// Resolve the version, then build the native extensions
    Build(BuildArgs),
}

/// Options shared by the build commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Preferred C++ compiler
    #[arg(short = 'x', long, value_name = "PATH", env = "EXTBUILD_CXX_COMPILER")]
    pub cxx_compiler: Option<String>,

    /// Preferred Eigen3 include directory
    #[arg(short = 'e', long, value_name = "DIR", env = "EXTBUILD_EIGEN_ROOT")]
    pub eigen_root: Option<String>,

    /// Build the Debug configuration
    #[arg(short = 'g', long)]
    pub debug: bool,

    /// Verbose native build output
    #[arg(short, long)]
    pub verbose: bool,

    /// Configure only, do not build
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Temporary build directory (relative to the project root)
    #[arg(long, value_name = "DIR", default_value = "build/temp")]
    pub build_temp: PathBuf,

    /// Directory extension modules are placed in (relative to the project root)
    #[arg(long, value_name = "DIR", default_value = "build/lib")]
    pub build_lib: PathBuf,

    /// Interpreter to build against (default: python3 on PATH)
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// CMake executable (default: cmake on PATH)
    #[arg(long, value_name = "PATH")]
    pub cmake: Option<PathBuf>,
}

impl BuildArgs {
    /// Overrides chosen by the user.
    pub fn user_options(&self) -> UserOptions {
        UserOptions {
            cxx_compiler: self.cxx_compiler.clone(),
            eigen_root: self.eigen_root.clone(),
        }
    }

    /// Fresh build options for this run, before user overrides.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            is_debug: self.debug,
            verbose: self.verbose,
            dry_run: self.dry_run,
            ..Default::default()
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !self.project_root.is_dir() {
            return Err(format!(
                "Project root does not exist: {}",
                self.project_root.display()
            ));
        }

        if let Command::BuildExt(build) | Command::Build(build) = &self.command {
            for (flag, value) in [
                ("--cxx-compiler", &build.cxx_compiler),
                ("--eigen-root", &build.eigen_root),
            ] {
                if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                    return Err(format!("{flag} cannot be empty"));
                }
            }
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        let verbose = matches!(
            &args.command,
            Command::BuildExt(b) | Command::Build(b) if b.verbose
        );
        Self {
            output: super::OutputManager::new(verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn build_flags_map_to_options() {
        let args = Args::try_parse_from([
            "extbuild",
            "build-ext",
            "-x",
            "clang++",
            "--eigen-root",
            "/opt/eigen3",
            "--debug",
            "-n",
        ])
        .unwrap();

        let Command::BuildExt(build) = &args.command else {
            panic!("expected build-ext");
        };
        assert_eq!(
            build.user_options(),
            UserOptions {
                cxx_compiler: Some("clang++".into()),
                eigen_root: Some("/opt/eigen3".into()),
            }
        );
        let options = build.build_options();
        assert!(options.is_debug);
        assert!(options.dry_run);
        assert!(!options.verbose);
        assert_eq!(options.compiler_override, None);
    }

    #[test]
    fn empty_override_is_rejected() {
        let args = Args::try_parse_from(["extbuild", "build", "--cxx-compiler", " "]).unwrap();
        assert!(args.validate().unwrap_err().contains("--cxx-compiler"));
    }
}
