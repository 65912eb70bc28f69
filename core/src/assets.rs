//! Bundled asset provisioning
//!
//! Copies bundled directories (BIOS, resources) into the engine's data directory once.
//! Existing files are left alone so user-replaced files survive, except anything under a
//! `shaders` directory, which always tracks the bundled version.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

/// Directory name whose contents are refreshed on every sync
const ALWAYS_REFRESH: &str = "shaders";

/// What a sync did
#[derive(Debug, Default)]
pub struct SyncReport {
    pub copied: usize,
    pub skipped: usize,
    pub refreshed: usize,
    /// Files that could not be copied, with the reason
    pub failed: Vec<(PathBuf, io::Error)>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Copy each of `dirs` from `source` into `destination`, recursively.
///
/// Never fails as a whole; per-file failures land in the report.
pub fn sync_assets(source: &Path, destination: &Path, dirs: &[String]) -> SyncReport {
    let mut report = SyncReport::default();

    for dir in dirs {
        let root = source.join(dir);
        if !root.is_dir() {
            tracing::debug!("No bundled assets at {}", root.display());
            continue;
        }

        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    report.failed.push((path, io::Error::other(e.to_string())));
                    continue;
                }
            };

            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let target = destination.join(relative);

            if entry.file_type().is_dir() {
                if let Err(e) = fs::create_dir_all(&target) {
                    report.failed.push((target, e));
                }
                continue;
            }

            let refresh = is_refreshed(relative);
            let exists = target.exists();
            if exists && !refresh {
                report.skipped += 1;
                continue;
            }

            match copy_file(entry.path(), &target) {
                Ok(()) if exists => report.refreshed += 1,
                Ok(()) => report.copied += 1,
                Err(e) => report.failed.push((target, e)),
            }
        }
    }

    tracing::info!(
        "Asset sync: {} copied, {} refreshed, {} skipped, {} failed",
        report.copied,
        report.refreshed,
        report.skipped,
        report.failed.len()
    );
    for (path, e) in &report.failed {
        tracing::warn!("Failed to provision {}: {}", path.display(), e);
    }
    report
}

fn is_refreshed(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == ALWAYS_REFRESH))
}

fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to).map(|_| ())
}
