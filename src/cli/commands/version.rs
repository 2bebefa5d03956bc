//! `extbuild version`: resolve and propagate the distribution version.

use crate::{
    cli::RuntimeConfig,
    error::Result,
    metadata::ProjectManifest,
    setup::version::{GitCli, ResolvedVersion, VersionResolver},
};
use std::path::Path;

/// Resolves the version of the project at `root` and propagates it.
pub async fn resolve_version(
    root: &Path,
    manifest: &ProjectManifest,
    config: &RuntimeConfig,
) -> Result<ResolvedVersion> {
    config.verbose_println(&format!("Resolving version of {}", root.display()))?;

    let resolver = VersionResolver::new(GitCli::new(root), root, manifest.version.clone());
    Ok(resolver.resolve().await?)
}
