//! Parsing of `git describe --tags --dirty --long --always` output.

use crate::setup::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// `<tag>-<count>-g<hash>[-dirty]`. The tag is greedy so dashed tags such
/// as `v1.0-rc1` survive intact.
static TAGGED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<tag>.+)-(?P<count>\d+)-g(?P<hash>\w+?)(?:-(?P<dirty>dirty))?$")
        .unwrap_or_else(|e| unreachable!("invalid describe pattern: {e}"))
});

/// Bare `<hash>[-dirty]`, printed by `--always` when no tag is reachable.
static UNTAGGED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<hash>\w+?)(?:-(?P<dirty>dirty))?$")
        .unwrap_or_else(|e| unreachable!("invalid describe pattern: {e}"))
});

/// Version-control state parsed from describe output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    /// Most recent reachable tag; `None` when the repository has no tags.
    pub tag: Option<String>,
    /// Commits made since `tag`.
    pub commits_since_tag: u64,
    /// Abbreviated hash of `HEAD`.
    pub short_hash: String,
    /// Working copy has uncommitted changes.
    pub dirty: bool,
}

impl VersionDescriptor {
    /// Parses trimmed describe output.
    ///
    /// Anything containing a word character parses: without a tag the whole
    /// output is taken as a hash.
    pub fn parse(output: &str) -> Result<Self> {
        let output = output.trim();

        if let Some(caps) = TAGGED.captures(output) {
            return Ok(Self {
                tag: Some(caps["tag"].to_string()),
                commits_since_tag: caps["count"].parse().map_err(|_| {
                    Error::MalformedDescribeOutput {
                        output: output.to_string(),
                    }
                })?,
                short_hash: caps["hash"].to_string(),
                dirty: caps.name("dirty").is_some(),
            });
        }

        match UNTAGGED.captures(output) {
            Some(caps) => Ok(Self {
                tag: None,
                commits_since_tag: 0,
                short_hash: caps["hash"].to_string(),
                dirty: caps.name("dirty").is_some(),
            }),
            None => Err(Error::MalformedDescribeOutput {
                output: output.to_string(),
            }),
        }
    }

    /// Version string this state resolves to. Dirtiness is not encoded.
    pub fn version<'a>(&'a self, bootstrap: &'a str) -> &'a str {
        self.tag.as_deref().unwrap_or(bootstrap)
    }
}
