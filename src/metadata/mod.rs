//! Project manifest discovery from `extbuild.toml`.
//!
//! The manifest is optional. Every field has a default matching the layout
//! of the pytide source tree, so a project without a manifest still resolves
//! its version and builds its `core` extension.

use crate::setup::{Error, ErrorExt, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up in the project root.
pub const MANIFEST_FILE: &str = "extbuild.toml";

/// Complete manifest data from `extbuild.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectManifest {
    /// `[project]` section.
    pub project: ProjectSection,

    /// `[version]` section: where the resolved version is propagated.
    pub version: VersionSection,

    /// `[[extension]]` entries, built in declaration order.
    #[serde(rename = "extension")]
    pub extensions: Vec<ExtensionSection>,

    /// `[native]` section: platform knobs for the CMake invocation.
    pub native: NativeSection,
}

/// Package identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSection {
    /// Distribution name.
    pub name: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: "pytide".to_string(),
        }
    }
}

/// Version propagation targets, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionSection {
    /// Version used while the repository has no tag yet.
    pub bootstrap: String,

    /// Structured record holding the last resolved version.
    pub record: PathBuf,

    /// Generated version module, rewritten wholesale.
    pub module: PathBuf,

    /// Packaging metadata template containing `{% set version = "..." %}`.
    pub meta_template: PathBuf,

    /// Documentation configuration with `version`/`release`/`copyright`.
    pub docs_config: PathBuf,

    /// Holder named in the rewritten copyright line.
    pub copyright_holder: String,
}

impl Default for VersionSection {
    fn default() -> Self {
        Self {
            bootstrap: "0.1".to_string(),
            record: PathBuf::from("src/pytide/version.json"),
            module: PathBuf::from("src/pytide/version.py"),
            meta_template: PathBuf::from("conda/meta.yaml"),
            docs_config: PathBuf::from("docs/source/conf.py"),
            copyright_holder: "CNES/CLS".to_string(),
        }
    }
}

/// A native extension built by CMake.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionSection {
    /// Dotted module name, e.g. `pytide.core`.
    pub name: String,

    /// CMake target producing the module.
    #[serde(default = "default_target")]
    pub target: String,
}

fn default_target() -> String {
    "core".to_string()
}

impl ExtensionSection {
    /// Directory, relative to the build lib directory, the module lands in.
    ///
    /// `pytide.core` becomes `pytide`; a top-level module maps to the build
    /// lib directory itself.
    pub fn package_dir(&self) -> PathBuf {
        let mut parts: Vec<&str> = self.name.split('.').collect();
        parts.pop();
        parts.iter().collect()
    }
}

/// CMake generator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeSection {
    /// Generator used on Windows (multi-configuration).
    pub generator: String,

    /// Minimum macOS version pinned on Darwin.
    pub osx_deployment_target: String,
}

impl Default for NativeSection {
    fn default() -> Self {
        Self {
            generator: "Visual Studio 15 2017".to_string(),
            osx_deployment_target: "10.14".to_string(),
        }
    }
}

impl ProjectManifest {
    /// Declared extensions, or the single `pytide.core` default.
    pub fn extensions(&self) -> Vec<ExtensionSection> {
        if self.extensions.is_empty() {
            vec![ExtensionSection {
                name: format!("{}.core", self.project.name),
                target: default_target(),
            }]
        } else {
            self.extensions.clone()
        }
    }
}

/// Load the manifest from `project_root`, falling back to defaults when
/// the file is absent.
pub fn load_manifest(project_root: &Path) -> Result<ProjectManifest> {
    let path = project_root.join(MANIFEST_FILE);

    if !path.exists() {
        log::debug!("No {} in {}, using defaults", MANIFEST_FILE, project_root.display());
        return Ok(ProjectManifest::default());
    }

    let text = std::fs::read_to_string(&path).fs_context("reading project manifest", &path)?;
    let manifest: ProjectManifest =
        toml::from_str(&text).map_err(|error| Error::Manifest { path: path.clone(), error })?;

    for extension in &manifest.extensions {
        if extension.name.trim().is_empty() || extension.target.trim().is_empty() {
            crate::bail!(
                "{}: every [[extension]] needs a non-empty name and target",
                path.display()
            );
        }
    }

    log::info!(
        "Loaded {} ({} extension(s))",
        path.display(),
        manifest.extensions().len()
    );

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = load_manifest(dir.path()).unwrap();

        assert_eq!(manifest.version.bootstrap, "0.1");
        assert_eq!(manifest.version.meta_template, PathBuf::from("conda/meta.yaml"));
        assert_eq!(manifest.native.osx_deployment_target, "10.14");
        assert_eq!(
            manifest.extensions(),
            vec![ExtensionSection {
                name: "pytide.core".into(),
                target: "core".into()
            }]
        );
    }

    #[test]
    fn partial_manifest_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"
[project]
name = "tides"

[version]
copyright_holder = "ACME"

[[extension]]
name = "tides._native"
target = "native"

[[extension]]
name = "tides.extra"
"#,
        )
        .unwrap();

        let manifest = load_manifest(dir.path()).unwrap();
        assert_eq!(manifest.project.name, "tides");
        assert_eq!(manifest.version.copyright_holder, "ACME");
        assert_eq!(manifest.version.bootstrap, "0.1");
        let exts = manifest.extensions();
        assert_eq!(exts.len(), 2);
        assert_eq!(exts[0].target, "native");
        assert_eq!(exts[1].target, "core");
        assert_eq!(manifest.native.generator, "Visual Studio 15 2017");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[version]\nbogus = 1\n").unwrap();
        assert!(matches!(
            load_manifest(dir.path()),
            Err(Error::Manifest { .. })
        ));
    }

    #[test]
    fn empty_extension_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[[extension]]\nname = \"\"\n").unwrap();
        assert!(matches!(
            load_manifest(dir.path()),
            Err(Error::GenericError(msg)) if msg.contains("non-empty name")
        ));
    }

    #[test]
    fn package_dir_drops_module_name() {
        let ext = ExtensionSection {
            name: "pytide.core".into(),
            target: "core".into(),
        };
        assert_eq!(ext.package_dir(), PathBuf::from("pytide"));

        let top = ExtensionSection {
            name: "core".into(),
            target: "core".into(),
        };
        assert_eq!(top.package_dir(), PathBuf::new());
    }
}
