//! Persisted version record.
//!
//! Outside a checkout (an unpacked source distribution) the version can no
//! longer be derived from history, so the last resolved value is stored
//! next to the package and read back through [`VersionRecord`].

use crate::setup::{
    error::{Error, Result},
    utils::fs::{read_optional, write_atomic},
};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Human readable commit date, e.g. `05 March 2020`.
pub const DATE_FORMAT: &str = "%d %B %Y";

static LEGACY_RESULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s+result = "(.*)""#)
        .unwrap_or_else(|e| unreachable!("invalid version pattern: {e}"))
});

static LEGACY_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s+result \+= " \((.*)\)""#)
        .unwrap_or_else(|e| unreachable!("invalid date pattern: {e}"))
});

/// The canonical version of the distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVersion {
    /// Version string declared by the package.
    pub version: String,

    /// UTC date of the commit the version was resolved from.
    ///
    /// Unknown only when recovered from a generated module that predates
    /// the structured record and carries no date.
    pub commit_date: Option<NaiveDate>,
}

impl ResolvedVersion {
    /// Version string, with the commit date appended when `full` is set.
    pub fn release(&self, full: bool) -> String {
        match (full, self.commit_date) {
            (true, Some(date)) => format!("{} ({})", self.version, date.format(DATE_FORMAT)),
            _ => self.version.clone(),
        }
    }
}

/// Single accessor for the persisted version.
#[derive(Debug, Clone)]
pub struct VersionRecord {
    record: PathBuf,
    module: PathBuf,
}

impl VersionRecord {
    /// `record` is the structured JSON record; `module` the generated
    /// version module consulted when no record exists yet.
    pub fn new(record: impl Into<PathBuf>, module: impl Into<PathBuf>) -> Self {
        Self {
            record: record.into(),
            module: module.into(),
        }
    }

    /// Path of the structured record.
    pub fn path(&self) -> &Path {
        &self.record
    }

    /// Recovers the last persisted version.
    ///
    /// # Errors
    ///
    /// [`Error::VersionUnavailable`] when neither the record nor the
    /// generated module holds a version.
    pub async fn load(&self) -> Result<ResolvedVersion> {
        if let Some(text) = read_optional(&self.record).await? {
            let resolved: ResolvedVersion = serde_json::from_str(&text)?;
            log::info!(
                "Recovered version {} from {}",
                resolved.version,
                self.record.display()
            );
            return Ok(resolved);
        }

        if let Some(text) = read_optional(&self.module).await?
            && let Some(resolved) = scan_generated_module(&text)
        {
            log::info!(
                "Recovered version {} from {}",
                resolved.version,
                self.module.display()
            );
            return Ok(resolved);
        }

        Err(Error::VersionUnavailable {
            searched: vec![self.record.clone(), self.module.clone()],
        })
    }

    /// Persists `resolved`, replacing any previous record.
    pub async fn store(&self, resolved: &ResolvedVersion) -> Result<()> {
        let mut json = serde_json::to_string_pretty(resolved)?;
        json.push('\n');
        write_atomic(&self.record, &json).await
    }
}

/// Finds the embedded version literal in a generated module.
fn scan_generated_module(text: &str) -> Option<ResolvedVersion> {
    let version = text
        .lines()
        .find_map(|line| LEGACY_RESULT.captures(line))
        .map(|caps| caps[1].to_string())?;

    let commit_date = text
        .lines()
        .find_map(|line| LEGACY_DATE.captures(line))
        .and_then(|caps| NaiveDate::parse_from_str(&caps[1], DATE_FORMAT).ok());

    Some(ResolvedVersion {
        version,
        commit_date,
    })
}
