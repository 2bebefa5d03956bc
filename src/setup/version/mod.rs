//! Version derivation from git history and propagation into the files
//! that declare it.
//!
//! 1. `git describe` is parsed into a [`VersionDescriptor`]
//! 2. the commit date of the described hash is looked up
//! 3. the version is written into the packaging metadata template, the
//!    documentation configuration, the generated version module and the
//!    persisted [`VersionRecord`]
//!
//! Outside a checkout the persisted record is read back instead.

mod describe;
mod record;
mod resolver;
mod targets;
mod vcs;

pub use describe::VersionDescriptor;
pub use record::{ResolvedVersion, VersionRecord};
pub use resolver::{VersionResolver, parse_commit_date};
pub use targets::{render_version_module, update_docs_config, update_meta_template};
pub use vcs::{GitCli, Vcs};
