//! Initial population of a registry from source directories.

use std::path::{Path, PathBuf};

use assetmill_core::{BundleRegistry, Dispatch, EventKind};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{WatchError, is_supported, source_identity};

/// Counts from one seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Files reconciled into a bundle.
    pub applied: usize,
    /// Supported files the registry declined (output files, complete documents).
    pub skipped: usize,
    /// Files with an extension no bundle accepts.
    pub ignored: usize,
}

/// Apply `Create` for every supported file below `dir`, in sorted path order.
///
/// Files are identified relative to the working directory, the same way the
/// watcher identifies them. A missing directory seeds nothing.
pub fn seed_directory(registry: &BundleRegistry, dir: &Path) -> Result<SeedReport, WatchError> {
    let mut report = SeedReport::default();
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "Source directory missing, nothing to seed");
        return Ok(report);
    }

    let files = collect_files_sorted(dir)?;
    let root = std::env::current_dir().unwrap_or_default();

    for path in files {
        if !is_supported(&path, registry.supported_extensions()) {
            report.ignored += 1;
            continue;
        }
        let content = std::fs::read(&path).map_err(|e| WatchError::io(&path, e))?;
        let identity = source_identity(&path, &root);
        match registry.apply_file_event(&identity, EventKind::Create, content)? {
            Dispatch::Applied { .. } => report.applied += 1,
            Dispatch::Skipped(reason) => {
                debug!(path = %path.display(), ?reason, "Skipped during seeding");
                report.skipped += 1;
            }
        }
    }

    info!(
        dir = %dir.display(),
        applied = report.applied,
        skipped = report.skipped,
        "Seeded sources"
    );
    Ok(report)
}

/// Every regular file under `dir`, sorted by path.
fn collect_files_sorted(dir: &Path) -> Result<Vec<PathBuf>, WatchError> {
    let mut paths = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => entry.file_type().is_file().then(|| Ok(entry.into_path())),
            Err(e) => {
                let path = e.path().unwrap_or(dir).to_path_buf();
                Some(Err(WatchError::io(&path, e.into())))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}
