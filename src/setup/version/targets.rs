//! Downstream files that carry the version string.
//!
//! The rewrites are pure text transformations; the resolver decides which
//! files exist and writes the results back.

use super::record::{DATE_FORMAT, ResolvedVersion};
use crate::setup::error::Result;
use chrono::Datelike;
use handlebars::Handlebars;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

static META_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{% set version = ".*" %\}"#)
        .unwrap_or_else(|e| unreachable!("invalid meta pattern: {e}"))
});

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)\s*=\s*(.*)$").unwrap_or_else(|e| unreachable!("invalid assignment pattern: {e}"))
});

const VERSION_MODULE: &str = r#""""
Get software version information
================================
"""


def release(full: bool = False) -> str:
    """Returns the software version number"""
    result = "{{version}}"
    if full:
        result += " ({{date}})"
    return result
"#;

/// Applies `rewrite` to each line, keeping line terminators and untouched
/// lines byte for byte.
fn map_lines(text: &str, mut rewrite: impl FnMut(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    for raw in text.split_inclusive('\n') {
        let body = raw.trim_end_matches(['\n', '\r']);
        match rewrite(body) {
            Some(replacement) => {
                out.push_str(&replacement);
                out.push_str(&raw[body.len()..]);
            }
            None => out.push_str(raw),
        }
    }
    out
}

/// Rewrites `{% set version = "..." %}` in a packaging metadata template.
pub fn update_meta_template(text: &str, version: &str) -> String {
    map_lines(text, |line| {
        META_VERSION
            .is_match(line)
            .then(|| format!("{{% set version = \"{version}\" %}}"))
    })
}

/// Rewrites the `version`, `release` and `copyright` assignments of a
/// documentation configuration file.
pub fn update_docs_config(text: &str, version: &str, year: i32, holder: &str) -> String {
    map_lines(text, |line| {
        let caps = ASSIGNMENT.captures(line)?;
        match &caps[1] {
            "version" => Some(format!("version = {}", quote(version))),
            "release" => Some(format!("release = {}", quote(version))),
            "copyright" => Some(format!("copyright = {}", quote(&format!("({year}, {holder})")))),
            _ => None,
        }
    })
}

/// Renders the generated version module.
pub fn render_version_module(resolved: &ResolvedVersion) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let date = resolved
        .commit_date
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default();

    Ok(handlebars.render_template(
        VERSION_MODULE,
        &json!({ "version": resolved.version, "date": date }),
    )?)
}

/// Commit year for the copyright line.
pub fn commit_year(resolved: &ResolvedVersion) -> Option<i32> {
    resolved.commit_date.map(|d| d.year())
}

/// Single-quoted string literal, switching to double quotes when the value
/// itself contains a single quote.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\");
    if value.contains('\'') && !value.contains('"') {
        format!("\"{escaped}\"")
    } else {
        format!("'{}'", escaped.replace('\'', "\\'"))
    }
}
