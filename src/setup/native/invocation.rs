//! CMake command assembly.
//!
//! [`assemble`] is a pure function of the platform and the resolved
//! options; nothing here touches the file system or spawns a process.

use super::{options::ResolvedOptions, platform::Platform};
use std::path::PathBuf;

/// Inputs to [`assemble`] besides the platform.
#[derive(Clone, Debug)]
pub struct InvocationContext {
    /// Directory the compiled module must land in.
    pub output_dir: PathBuf,
    /// Interpreter the module is built against.
    pub interpreter: PathBuf,
    /// Options merged with the environment.
    pub options: ResolvedOptions,
    /// Parallel jobs for single-configuration generators.
    pub jobs: usize,
    /// Generator used on Windows.
    pub generator: String,
    /// Minimum macOS version.
    pub osx_deployment_target: String,
}

/// Arguments of the configure and build phases for one target.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NativeBuildInvocation {
    /// Arguments after `cmake <source root>`.
    pub configure_args: Vec<String>,
    /// Arguments after `cmake --build . --target <target>`.
    pub build_args: Vec<String>,
    /// Directory the compiled module lands in.
    pub output_dir: PathBuf,
}

/// Builds the configure and build arguments for `platform`.
pub fn assemble(platform: &Platform, ctx: &InvocationContext) -> NativeBuildInvocation {
    let config = ctx.options.config.label();
    let output_dir = ctx.output_dir.display().to_string();

    let mut configure_args = vec![
        format!("-DCMAKE_LIBRARY_OUTPUT_DIRECTORY={output_dir}"),
        format!("-DPYTHON_EXECUTABLE={}", ctx.interpreter.display()),
    ];
    if let Some(compiler) = &ctx.options.compiler {
        configure_args.push(format!("-DCMAKE_CXX_COMPILER={compiler}"));
    }
    if let Some(include_dir) = &ctx.options.include_dir {
        configure_args.push(format!("-DEIGEN3_INCLUDE_DIR={include_dir}"));
    }

    let mut build_args = vec!["--config".to_string(), config.to_string()];

    if platform.is_windows() {
        configure_args.extend([
            "-G".to_string(),
            ctx.generator.clone(),
            "-DCMAKE_GENERATOR_PLATFORM=x64".to_string(),
            format!(
                "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY_{}={output_dir}",
                config.to_uppercase()
            ),
        ]);
        build_args.extend(["--".to_string(), "/m".to_string()]);
        if ctx.options.verbose {
            build_args.push("/verbosity:n".to_string());
        }
    } else {
        build_args.extend(["--".to_string(), format!("-j{}", ctx.jobs)]);
        configure_args.push(format!("-DCMAKE_BUILD_TYPE={config}"));
        if *platform == Platform::Darwin {
            configure_args.push(format!(
                "-DCMAKE_OSX_DEPLOYMENT_TARGET={}",
                ctx.osx_deployment_target
            ));
        }
    }

    if ctx.options.verbose {
        build_args.insert(0, "--verbose".to_string());
    }

    NativeBuildInvocation {
        configure_args,
        build_args,
        output_dir: ctx.output_dir.clone(),
    }
}
