//! Native extension build orchestration.
//!
//! Each declared extension is configured and built by CMake, one at a time
//! in declaration order, with the compiled module written straight into the
//! directory the packaging step copies extensions from.

use super::{
    environment::EnvironmentProbe,
    invocation::{InvocationContext, NativeBuildInvocation, assemble},
    options::{BuildOptions, UserOptions},
    platform::Platform,
    runner::{CommandRunner, ExternalCommand},
};
use crate::{
    metadata::{ExtensionSection, NativeSection},
    setup::{error::Result, utils::fs::create_dir_all},
};
use std::{fmt, path::PathBuf};

/// Lifecycle of a single target.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildState {
    /// Not started.
    Idle,
    /// Configure phase running.
    Configuring,
    /// Build phase running.
    Building,
    /// Finished successfully.
    Done,
    /// An external command failed.
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Configuring => "configuring",
            Self::Building => "building",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Directories the build works with.
#[derive(Clone, Debug)]
pub struct BuildLayout {
    /// Project root holding the top-level `CMakeLists.txt`.
    pub source_root: PathBuf,
    /// Scratch directory CMake configures into.
    pub build_temp: PathBuf,
    /// Directory the packaging step collects modules from.
    pub build_lib: PathBuf,
}

/// Outcome of one target.
#[derive(Clone, Debug)]
pub struct TargetReport {
    /// Dotted extension name.
    pub extension: String,
    /// Final state.
    pub state: BuildState,
    /// Invocation that was executed.
    pub invocation: NativeBuildInvocation,
}

/// Configures and builds native extensions with CMake.
#[derive(Debug)]
pub struct NativeBuildOrchestrator<R, P> {
    runner: R,
    probe: P,
    platform: Platform,
    layout: BuildLayout,
    native: NativeSection,
    options: BuildOptions,
    cmake: PathBuf,
    jobs: usize,
    states: Vec<(String, BuildState)>,
}

impl<R: CommandRunner, P: EnvironmentProbe> NativeBuildOrchestrator<R, P> {
    /// Creates an orchestrator for the host's CPU count and `cmake` on `PATH`.
    pub fn new(runner: R, probe: P, platform: Platform, layout: BuildLayout, native: NativeSection) -> Self {
        Self {
            runner,
            probe,
            platform,
            layout,
            native,
            options: BuildOptions::default(),
            cmake: PathBuf::from("cmake"),
            jobs: num_cpus::get(),
            states: Vec::new(),
        }
    }

    /// Sets the per-run build options.
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Overrides the `cmake` executable.
    pub fn with_cmake(mut self, cmake: impl Into<PathBuf>) -> Self {
        self.cmake = cmake.into();
        self
    }

    /// Overrides the parallel job count.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Applies the compiler and include overrides chosen by the user.
    ///
    /// Must happen before [`Self::build_all`] so every target sees them.
    pub fn apply_user_options(&mut self, user: &UserOptions) {
        self.options.apply(user);
    }

    /// State of `extension`; [`BuildState::Idle`] if never started.
    pub fn state(&self, extension: &str) -> BuildState {
        self.states
            .iter()
            .find(|(name, _)| name == extension)
            .map(|(_, state)| *state)
            .unwrap_or(BuildState::Idle)
    }

    fn set_state(&mut self, extension: &str, state: BuildState) {
        log::debug!("{}: {}", extension, state);
        match self.states.iter_mut().find(|(name, _)| name == extension) {
            Some(entry) => entry.1 = state,
            None => self.states.push((extension.to_string(), state)),
        }
    }

    /// Resolves options and assembles the invocation for `extension`
    /// without running anything.
    pub fn plan(&self, extension: &ExtensionSection) -> Result<NativeBuildInvocation> {
        let options = self.options.resolve(&self.probe)?;
        let context = InvocationContext {
            output_dir: self.output_dir(extension)?,
            interpreter: self.probe.interpreter().to_path_buf(),
            options,
            jobs: self.jobs,
            generator: self.native.generator.clone(),
            osx_deployment_target: self.native.osx_deployment_target.clone(),
        };
        Ok(assemble(&self.platform, &context))
    }

    /// Absolute directory the module of `extension` must land in.
    pub fn output_dir(&self, extension: &ExtensionSection) -> Result<PathBuf> {
        crate::setup::utils::fs::absolute(&self.layout.build_lib.join(extension.package_dir()))
    }

    /// Configures then builds `extension`.
    ///
    /// The configure phase runs `cmake <source root> <args>` in the build
    /// directory; the build phase, skipped on dry runs, runs
    /// `cmake --build . --target <target> <args>` in the same directory.
    /// Children get the build directory as their working directory, so the
    /// orchestrator's own working directory never changes.
    pub async fn build_extension(&mut self, extension: &ExtensionSection) -> Result<TargetReport> {
        let invocation = self.plan(extension)?;

        let build_temp = crate::setup::utils::fs::absolute(&self.layout.build_temp)?;
        create_dir_all(&build_temp).await?;
        let source_root = crate::setup::utils::fs::absolute(&self.layout.source_root)?;

        let configure = ExternalCommand {
            program: self.cmake.clone(),
            args: std::iter::once(source_root.display().to_string())
                .chain(invocation.configure_args.iter().cloned())
                .collect(),
            cwd: build_temp.clone(),
        };

        log::info!("Configuring {} ({})", extension.name, self.platform);
        self.set_state(&extension.name, BuildState::Configuring);
        if let Err(e) = self.runner.run(&configure).await {
            self.set_state(&extension.name, BuildState::Failed);
            return Err(e);
        }

        if self.options.dry_run {
            log::info!("Dry run: skipping build of target {}", extension.target);
        } else {
            let build = ExternalCommand {
                program: self.cmake.clone(),
                args: ["--build", ".", "--target", extension.target.as_str()]
                    .into_iter()
                    .map(String::from)
                    .chain(invocation.build_args.iter().cloned())
                    .collect(),
                cwd: build_temp,
            };

            log::info!("Building target {} of {}", extension.target, extension.name);
            self.set_state(&extension.name, BuildState::Building);
            if let Err(e) = self.runner.run(&build).await {
                self.set_state(&extension.name, BuildState::Failed);
                return Err(e);
            }
        }

        self.set_state(&extension.name, BuildState::Done);
        log::info!(
            "✓ {} ready in {}",
            extension.name,
            invocation.output_dir.display()
        );

        Ok(TargetReport {
            extension: extension.name.clone(),
            state: BuildState::Done,
            invocation,
        })
    }

    /// Builds every extension in order, stopping at the first failure.
    pub async fn build_all(&mut self, extensions: &[ExtensionSection]) -> Result<Vec<TargetReport>> {
        let mut reports = Vec::with_capacity(extensions.len());
        for extension in extensions {
            reports.push(self.build_extension(extension).await?);
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{environment::fake::FakeProbe, runner::fake::RecordingRunner};
    use super::*;
    use crate::setup::Error;

    fn layout(root: &std::path::Path) -> BuildLayout {
        BuildLayout {
            source_root: root.to_path_buf(),
            build_temp: root.join("build/temp"),
            build_lib: root.join("build/lib"),
        }
    }

    fn core() -> ExtensionSection {
        ExtensionSection {
            name: "pytide.core".into(),
            target: "core".into(),
        }
    }

    fn orchestrator(
        root: &std::path::Path,
        runner: RecordingRunner,
        probe: FakeProbe,
    ) -> NativeBuildOrchestrator<RecordingRunner, FakeProbe> {
        NativeBuildOrchestrator::new(
            runner,
            probe,
            Platform::Linux,
            layout(root),
            NativeSection::default(),
        )
        .with_jobs(4)
    }

    #[tokio::test]
    async fn configure_then_build_in_build_temp() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(dir.path(), RecordingRunner::default(), FakeProbe::plain());

        let report = orch.build_extension(&core()).await.unwrap();
        assert_eq!(report.state, BuildState::Done);
        assert_eq!(orch.state("pytide.core"), BuildState::Done);
        assert!(dir.path().join("build/temp").is_dir());

        let calls = orch.runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args[0], dir.path().display().to_string());
        assert_eq!(
            calls[0].args[1],
            format!(
                "-DCMAKE_LIBRARY_OUTPUT_DIRECTORY={}",
                dir.path().join("build/lib/pytide").display()
            )
        );
        assert_eq!(
            calls[1].args,
            vec!["--build", ".", "--target", "core", "--config", "Release", "--", "-j4"]
        );
        assert!(calls.iter().all(|c| c.cwd == dir.path().join("build/temp")));
    }

    #[tokio::test]
    async fn dry_run_only_configures() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(dir.path(), RecordingRunner::default(), FakeProbe::plain())
            .with_options(BuildOptions {
                dry_run: true,
                ..Default::default()
            });

        orch.build_extension(&core()).await.unwrap();
        assert_eq!(orch.runner.calls().len(), 1);
        assert_eq!(orch.state("pytide.core"), BuildState::Done);
    }

    #[tokio::test]
    async fn configure_failure_skips_build() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(dir.path(), RecordingRunner::failing_at(0), FakeProbe::plain());

        match orch.build_extension(&core()).await {
            Err(Error::ExternalToolFailure { command, status }) => {
                assert!(command.starts_with("cmake "));
                assert!(!command.contains("--build"));
                assert_eq!(status.code(), Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(orch.state("pytide.core"), BuildState::Failed);
        assert_eq!(orch.runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn build_failure_stops_remaining_targets() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(dir.path(), RecordingRunner::failing_at(1), FakeProbe::plain());
        let second = ExtensionSection {
            name: "pytide.extra".into(),
            target: "extra".into(),
        };

        assert!(matches!(
            orch.build_all(&[core(), second]).await,
            Err(Error::ExternalToolFailure { command, .. }) if command.contains("--target core")
        ));
        assert_eq!(orch.state("pytide.core"), BuildState::Failed);
        assert_eq!(orch.state("pytide.extra"), BuildState::Idle);
        assert_eq!(orch.runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn missing_dependency_fails_before_any_command() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(
            dir.path(),
            RecordingRunner::default(),
            FakeProbe::managed("/opt/conda"),
        );

        assert!(matches!(
            orch.build_extension(&core()).await,
            Err(Error::DependencyNotFound { .. })
        ));
        assert!(orch.runner.calls().is_empty());
        assert_eq!(orch.state("pytide.core"), BuildState::Idle);
    }

    #[tokio::test]
    async fn user_options_reach_every_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(
            dir.path(),
            RecordingRunner::default(),
            FakeProbe::managed("/opt/conda").with_existing("/opt/conda/include/eigen3"),
        );
        orch.apply_user_options(&UserOptions {
            cxx_compiler: Some("g++-12".into()),
            eigen_root: Some("/custom/eigen3".into()),
        });
        let second = ExtensionSection {
            name: "pytide.extra".into(),
            target: "extra".into(),
        };

        let reports = orch.build_all(&[core(), second]).await.unwrap();
        assert_eq!(reports.len(), 2);
        for report in reports {
            assert!(report
                .invocation
                .configure_args
                .contains(&"-DEIGEN3_INCLUDE_DIR=/custom/eigen3".to_string()));
            assert!(report
                .invocation
                .configure_args
                .contains(&"-DCMAKE_CXX_COMPILER=g++-12".to_string()));
        }
    }

    #[test]
    fn plan_uses_detected_cpu_count_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let orch = NativeBuildOrchestrator::new(
            RecordingRunner::default(),
            FakeProbe::plain(),
            Platform::Linux,
            layout(dir.path()),
            NativeSection::default(),
        );
        let plan = orch.plan(&core()).unwrap();
        assert!(plan.build_args.contains(&format!("-j{}", num_cpus::get())));
    }
}
