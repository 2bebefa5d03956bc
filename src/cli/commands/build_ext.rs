//! `extbuild build-ext`: configure and build the native extensions.

use crate::{
    cli::{BuildArgs, RuntimeConfig},
    error::{CliError, Result},
    metadata::ProjectManifest,
    setup::native::{
        BuildLayout, InterpreterProbe, NativeBuildOrchestrator, Platform, ProcessRunner,
    },
};
use std::path::{Path, PathBuf};

/// Builds every extension declared by `manifest`.
pub async fn build_extensions(
    root: &Path,
    manifest: &ProjectManifest,
    build: &BuildArgs,
    config: &RuntimeConfig,
) -> Result<()> {
    let cmake = locate_cmake(build.cmake.as_ref())?;
    let cmake_label = cmake.display().to_string();
    let probe = InterpreterProbe::detect(build.python.clone()).await?;

    let layout = BuildLayout {
        source_root: root.to_path_buf(),
        build_temp: root.join(&build.build_temp),
        build_lib: root.join(&build.build_lib),
    };

    let mut orchestrator = NativeBuildOrchestrator::new(
        ProcessRunner,
        probe,
        Platform::current(),
        layout,
        manifest.native.clone(),
    )
    .with_options(build.build_options())
    .with_cmake(cmake);
    orchestrator.apply_user_options(&build.user_options());

    let extensions = manifest.extensions();
    config.section("Native extensions")?;
    for extension in &extensions {
        config.indent(&format!("{} (target {})", extension.name, extension.target))?;
    }
    config.progress(&format!(
        "Building {} extension(s) with {}",
        extensions.len(),
        cmake_label
    ))?;

    let reports = orchestrator.build_all(&extensions).await?;
    for report in reports {
        config.success(&format!(
            "{} -> {}",
            report.extension,
            report.invocation.output_dir.display()
        ))?;
        config.verbose_println(&format!(
            "configure: {}",
            report.invocation.configure_args.join(" ")
        ))?;
        config.verbose_println(&format!("build: {}", report.invocation.build_args.join(" ")))?;
    }

    Ok(())
}

fn locate_cmake(explicit: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.clone());
    }

    match which::which("cmake") {
        Ok(path) => {
            log::debug!("Found cmake at: {}", path.display());
            Ok(path)
        }
        Err(e) => Err(CliError::ToolNotFound {
            tool: "cmake".to_string(),
            hint: format!("{e}. Please install CMake (e.g., apt-get install cmake) or pass --cmake"),
        }
        .into()),
    }
}
