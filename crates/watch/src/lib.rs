//! File-system side of assetmill.
//!
//! Seeds a [`BundleRegistry`](assetmill_core::BundleRegistry) from source
//! directories, keeps it in step with file events, and writes bundle
//! snapshots to disk. The core itself never touches the file system.

pub mod disk;
pub mod seed;
pub mod stability;
pub mod watcher;

pub use disk::{DiskSync, write_file, write_file_if_absent};
pub use seed::{SeedReport, seed_directory};
pub use stability::{StabilityPolicy, read_stable};
pub use watcher::{EventPump, SourceWatcher, translate};

use std::path::{Path, PathBuf};

/// Errors raised while watching, reading or writing files.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} was still changing after {attempts} reads")]
    Unstable { path: PathBuf, attempts: u32 },

    #[error(transparent)]
    Core(#[from] assetmill_core::Error),

    #[error("Watcher error: {0}")]
    Notify(#[from] notify::Error),
}

impl WatchError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The identity a source file is reconciled under: its path relative to
/// `root` when it lies below it, otherwise the path as given.
pub fn source_identity(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Whether the registry routes files with this path's extension.
pub(crate) fn is_supported(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            extensions
                .iter()
                .any(|supported| supported.trim_start_matches('.').eq_ignore_ascii_case(e))
        })
}
