//! File system helpers for version propagation and build directories.
//!
//! Rewrites are all-or-nothing per file: content lands in a sibling
//! temporary file first and is renamed over the target afterwards.

use crate::setup::error::{ErrorExt, Result};
use path_absolutize::Absolutize;
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Replaces `path` with `contents` without ever leaving it half written.
///
/// Parent directories are created as needed.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating parent directory of", path)?;
    }

    let mut staging = path.as_os_str().to_owned();
    staging.push(".extbuild-tmp");
    let staging = PathBuf::from(staging);

    fs::write(&staging, contents)
        .await
        .fs_context("writing", &staging)?;

    if let Err(e) = fs::rename(&staging, path).await {
        // Cleanup only; the rename error is returned.
        let _ = fs::remove_file(&staging).await;
        return Err(e).fs_context("replacing", path);
    }

    Ok(())
}

/// Reads a UTF-8 text file, returning `None` if it does not exist.
pub async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).fs_context("reading", path),
    }
}

/// Creates all of the directories of the specified path.
///
/// Succeeds when the directory already exists.
pub async fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Resolves `path` against the current directory without touching the disk.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .fs_context("resolving absolute path of", path)?
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_atomic_creates_parents_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/deeper/version.py");

        write_atomic(&target, "first\n").await.unwrap();
        write_atomic(&target, "second\n").await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second\n");
        let leftovers: Vec<_> = std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".extbuild-tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn read_optional_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_optional(&dir.path().join("absent.yaml"))
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn absolute_keeps_absolute_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(absolute(dir.path()).unwrap(), dir.path());
    }
}
