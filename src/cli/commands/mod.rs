//! Command execution functions.
//!
//! `build` runs the two stages in order: version resolution completes
//! before any native target is configured.

mod build_ext;
mod version;

pub use build_ext::build_extensions;
pub use version::resolve_version;

use super::{Args, Command, RuntimeConfig};
use crate::{error::Result, metadata::load_manifest, setup::utils::fs::absolute};

/// Dispatches the parsed subcommand.
pub async fn execute(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let root = absolute(&args.project_root)?;
    let manifest = load_manifest(&root)?;

    match &args.command {
        Command::Version { full } => {
            let resolved = resolve_version(&root, &manifest, config).await?;
            if *full && resolved.commit_date.is_none() {
                config
                    .output()
                    .warn("no commit date recorded, printing the bare version")?;
            }
            config.output().result(&resolved.release(*full))?;
        }
        Command::BuildExt(build) => {
            build_extensions(&root, &manifest, build, config).await?;
        }
        Command::Build(build) => {
            let resolved = resolve_version(&root, &manifest, config).await?;
            config.success(&format!(
                "{} {}",
                manifest.project.name,
                resolved.release(true)
            ))?;
            build_extensions(&root, &manifest, build, config).await?;
        }
    }

    Ok(())
}
