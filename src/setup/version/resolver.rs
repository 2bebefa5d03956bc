//! Version resolution and propagation.

use super::{
    describe::VersionDescriptor,
    record::{ResolvedVersion, VersionRecord},
    targets,
    vcs::Vcs,
};
use crate::{
    metadata::VersionSection,
    setup::{
        error::{Context, Error, Result},
        utils::fs::{read_optional, write_atomic},
    },
};
use chrono::{DateTime, NaiveDate};
use std::path::{Path, PathBuf};

/// Derives the canonical version and writes it into the downstream files.
#[derive(Debug)]
pub struct VersionResolver<V> {
    vcs: V,
    root: PathBuf,
    settings: VersionSection,
}

impl<V: Vcs> VersionResolver<V> {
    /// Creates a resolver for the project at `root`. Paths in `settings` are
    /// relative to `root`.
    pub fn new(vcs: V, root: impl Into<PathBuf>, settings: VersionSection) -> Self {
        Self {
            vcs,
            root: root.into(),
            settings,
        }
    }

    /// Accessor for the persisted version of this project.
    pub fn record(&self) -> VersionRecord {
        VersionRecord::new(
            self.root.join(&self.settings.record),
            self.root.join(&self.settings.module),
        )
    }

    /// Resolves the version.
    ///
    /// Inside a checkout the version is derived from `describe` and
    /// propagated; otherwise the persisted version is returned and nothing
    /// is written.
    pub async fn resolve(&self) -> Result<ResolvedVersion> {
        let Some(output) = self.vcs.describe().await else {
            log::info!("No version-control information, using the persisted version");
            return self.record().load().await;
        };

        let descriptor = VersionDescriptor::parse(&output)?;
        if descriptor.tag.is_none() {
            log::warn!(
                "No tag reachable from {}, using bootstrap version {}",
                descriptor.short_hash,
                self.settings.bootstrap
            );
        }
        if descriptor.dirty {
            log::debug!("Working copy is dirty");
        }

        let log_output = self.vcs.commit_info(&descriptor.short_hash).await?;
        let commit_date = parse_commit_date(&descriptor.short_hash, &log_output)?;

        let resolved = ResolvedVersion {
            version: descriptor.version(&self.settings.bootstrap).to_string(),
            commit_date: Some(commit_date),
        };
        log::info!("Resolved version {}", resolved.release(true));

        self.propagate(&resolved).await?;
        Ok(resolved)
    }

    /// Writes `resolved` into every downstream file and returns the files
    /// that were written.
    ///
    /// The metadata template and documentation configuration are only
    /// rewritten when present. The generated module and the record are
    /// always written.
    pub async fn propagate(&self, resolved: &ResolvedVersion) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        let meta = self.root.join(&self.settings.meta_template);
        if let Some(text) = read_optional(&meta).await? {
            let updated = targets::update_meta_template(&text, &resolved.version);
            rewrite(&meta, &text, &updated, &mut written).await?;
        } else {
            log::debug!("Skipping absent {}", meta.display());
        }

        let docs = self.root.join(&self.settings.docs_config);
        if let Some(text) = read_optional(&docs).await? {
            let year = targets::commit_year(resolved)
                .context(format!("no commit date to write into {}", docs.display()))?;
            let updated = targets::update_docs_config(
                &text,
                &resolved.version,
                year,
                &self.settings.copyright_holder,
            );
            rewrite(&docs, &text, &updated, &mut written).await?;
        } else {
            log::warn!("Documentation configuration {} not found, skipping", docs.display());
        }

        let module = self.root.join(&self.settings.module);
        write_atomic(&module, &targets::render_version_module(resolved)?).await?;
        log::info!("Wrote {}", module.display());
        written.push(module);

        let record = self.record();
        record.store(resolved).await?;
        written.push(record.path().to_path_buf());

        Ok(written)
    }
}

async fn rewrite(path: &Path, old: &str, new: &str, written: &mut Vec<PathBuf>) -> Result<()> {
    if old == new {
        log::debug!("{} already up to date", path.display());
        return Ok(());
    }
    write_atomic(path, new).await?;
    log::info!("Updated {}", path.display());
    written.push(path.to_path_buf());
    Ok(())
}

/// Parses `<hash> <epoch>` into the UTC commit date.
pub fn parse_commit_date(hash: &str, output: &str) -> Result<NaiveDate> {
    let malformed = || Error::MalformedCommitInfo {
        hash: hash.to_string(),
        output: output.to_string(),
    };

    let seconds: i64 = output
        .split_whitespace()
        .nth(1)
        .ok_or_else(malformed)?
        .parse()
        .map_err(|_| malformed())?;

    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    /// 2019-08-01T12:00:00Z
    const EPOCH: i64 = 1_564_660_800;

    #[derive(Default)]
    struct FakeVcs {
        describe: Option<String>,
        commits: HashMap<String, i64>,
        log_calls: AtomicUsize,
    }

    impl FakeVcs {
        fn with(describe: &str, hash: &str) -> Self {
            Self {
                describe: Some(describe.to_string()),
                commits: HashMap::from([(hash.to_string(), EPOCH)]),
                ..Default::default()
            }
        }
    }

    impl Vcs for FakeVcs {
        async fn describe(&self) -> Option<String> {
            self.describe.clone()
        }

        async fn commit_info(&self, hash: &str) -> Result<String> {
            self.log_calls.fetch_add(1, Ordering::SeqCst);
            match self.commits.get(hash) {
                Some(at) => Ok(format!("{hash}0123456789abcdef {at}")),
                None => Err(Error::GenericError(format!("unknown commit {hash}"))),
            }
        }
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("conda")).unwrap();
        std::fs::create_dir_all(dir.path().join("docs/source")).unwrap();
        std::fs::write(
            dir.path().join("conda/meta.yaml"),
            "{% set version = \"0.0\" %}\npackage:\n  name: pytide\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("docs/source/conf.py"),
            "project = 'pytide'\ncopyright = '(2018, CNES/CLS)'\nversion = '0.0'\nrelease = '0.0'\n",
        )
        .unwrap();
        dir
    }

    fn read(dir: &Path, rel: &str) -> String {
        std::fs::read_to_string(dir.join(rel)).unwrap()
    }

    #[tokio::test]
    async fn tagged_checkout_propagates_everywhere() {
        let dir = project();
        let resolver = VersionResolver::new(
            FakeVcs::with("2019.08.0-3-gabc1234-dirty", "abc1234"),
            dir.path(),
            VersionSection::default(),
        );

        let resolved = resolver.resolve().await.unwrap();
        assert_eq!(resolved.version, "2019.08.0");
        assert_eq!(resolved.commit_date, NaiveDate::from_ymd_opt(2019, 8, 1));

        assert!(read(dir.path(), "conda/meta.yaml").starts_with("{% set version = \"2019.08.0\" %}\n"));
        let conf = read(dir.path(), "docs/source/conf.py");
        assert!(conf.contains("version = '2019.08.0'"));
        assert!(conf.contains("copyright = '(2019, CNES/CLS)'"));
        assert!(read(dir.path(), "src/pytide/version.py").contains("result = \"2019.08.0\""));
        assert!(read(dir.path(), "src/pytide/version.py").contains("(01 August 2019)"));
        assert!(dir.path().join("src/pytide/version.json").exists());
    }

    #[tokio::test]
    async fn untagged_checkout_uses_bootstrap_version() {
        let dir = project();
        let resolver = VersionResolver::new(
            FakeVcs::with("fedcba9", "fedcba9"),
            dir.path(),
            VersionSection::default(),
        );

        let resolved = resolver.resolve().await.unwrap();
        assert_eq!(resolved.version, "0.1");
    }

    #[tokio::test]
    async fn absent_optional_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = VersionResolver::new(
            FakeVcs::with("1.0-0-g1111111", "1111111"),
            dir.path(),
            VersionSection::default(),
        );

        resolver.resolve().await.unwrap();
        assert!(!dir.path().join("conda/meta.yaml").exists());
        assert!(!dir.path().join("docs/source/conf.py").exists());
        assert!(dir.path().join("src/pytide/version.py").exists());
    }

    #[tokio::test]
    async fn no_checkout_recovers_from_generated_module() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/pytide")).unwrap();
        std::fs::write(
            dir.path().join("src/pytide/version.py"),
            "def release(full=False):\n    result = \"1.2.3\"\n    return result\n",
        )
        .unwrap();

        let vcs = FakeVcs::default();
        let resolver = VersionResolver::new(vcs, dir.path(), VersionSection::default());
        let resolved = resolver.resolve().await.unwrap();

        assert_eq!(resolved.version, "1.2.3");
        assert_eq!(resolver.vcs.log_calls.load(Ordering::SeqCst), 0);
        // Nothing is rewritten outside a checkout.
        assert!(!dir.path().join("src/pytide/version.json").exists());
    }

    #[tokio::test]
    async fn no_checkout_and_nothing_persisted_fails() {
        let dir = tempfile::tempdir().unwrap();
        let resolver =
            VersionResolver::new(FakeVcs::default(), dir.path(), VersionSection::default());

        assert!(matches!(
            resolver.resolve().await,
            Err(Error::VersionUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn second_resolution_replaces_docs_values() {
        let dir = project();
        VersionResolver::new(
            FakeVcs::with("1.0-0-g1111111", "1111111"),
            dir.path(),
            VersionSection::default(),
        )
        .resolve()
        .await
        .unwrap();
        VersionResolver::new(
            FakeVcs::with("2.0-4-g2222222", "2222222"),
            dir.path(),
            VersionSection::default(),
        )
        .resolve()
        .await
        .unwrap();

        let conf = read(dir.path(), "docs/source/conf.py");
        let versions: Vec<_> = conf.lines().filter(|l| l.starts_with("version")).collect();
        let releases: Vec<_> = conf.lines().filter(|l| l.starts_with("release")).collect();
        assert_eq!(versions, vec!["version = '2.0'"]);
        assert_eq!(releases, vec!["release = '2.0'"]);
    }

    #[test]
    fn commit_date_parsing() {
        assert_eq!(
            parse_commit_date("abc", &format!("abcdef {EPOCH}\n")).unwrap(),
            NaiveDate::from_ymd_opt(2019, 8, 1).unwrap()
        );
        assert!(matches!(
            parse_commit_date("abc", "abcdef"),
            Err(Error::MalformedCommitInfo { .. })
        ));
        assert!(matches!(
            parse_commit_date("abc", "abcdef yesterday"),
            Err(Error::MalformedCommitInfo { .. })
        ));
    }
}
