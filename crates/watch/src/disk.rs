//! Disk output for bundle snapshots.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetmill_core::{BundleKind, BundleRegistry};
use tracing::{debug, info};

use crate::WatchError;

/// Write `bytes` to `path`, creating parent directories as needed.
pub async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), WatchError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| WatchError::io(parent, e))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| WatchError::io(path, e))
}

/// Write `bytes` to `path` unless a file already exists there.
///
/// Returns whether the file was written.
pub async fn write_file_if_absent(path: &Path, bytes: &[u8]) -> Result<bool, WatchError> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| WatchError::io(path, e))?;
    if exists {
        debug!(path = %path.display(), "Output exists, not overwriting");
        return Ok(false);
    }
    write_file(path, bytes).await?;
    Ok(true)
}

/// Regenerates bundles and writes their snapshots to their output paths.
#[derive(Debug, Clone)]
pub struct DiskSync {
    registry: Arc<BundleRegistry>,
}

impl DiskSync {
    pub fn new(registry: Arc<BundleRegistry>) -> Self {
        Self { registry }
    }

    /// Rebuild one bundle and overwrite its output file.
    pub async fn sync(&self, kind: BundleKind) -> Result<PathBuf, WatchError> {
        let snapshot = self.registry.regenerate(kind)?;
        let path = self.registry.bundle(kind).output_path().to_path_buf();
        write_file(&path, &snapshot).await?;
        info!(bundle = %kind, path = %path.display(), bytes = snapshot.len(), "Wrote bundle");
        Ok(path)
    }

    /// Rebuild every bundle and write it out. With `overwrite` unset, existing
    /// output files are left alone.
    ///
    /// Returns the paths that were written.
    pub async fn sync_all(&self, overwrite: bool) -> Result<Vec<PathBuf>, WatchError> {
        let mut written = Vec::new();
        for kind in BundleKind::ALL {
            if overwrite {
                written.push(self.sync(kind).await?);
                continue;
            }
            let snapshot = self.registry.regenerate(kind)?;
            let path = self.registry.bundle(kind).output_path();
            if write_file_if_absent(path, &snapshot).await? {
                info!(bundle = %kind, path = %path.display(), "Wrote bundle");
                written.push(path.to_path_buf());
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetmill_core::{Passthrough, RegistryOptions};

    fn registry(dir: &Path) -> Arc<BundleRegistry> {
        Arc::new(BundleRegistry::new(
            RegistryOptions {
                output_dir: dir.join("public"),
                ..RegistryOptions::default()
            },
            Arc::new(Passthrough),
        ))
    }

    #[tokio::test]
    async fn write_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        write_file(&path, b"hello").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn write_if_absent_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.txt");
        std::fs::write(&path, "original").unwrap();

        assert!(!write_file_if_absent(&path, b"new").await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");

        let fresh = dir.path().join("fresh.txt");
        assert!(write_file_if_absent(&fresh, b"new").await.unwrap());
    }

    #[tokio::test]
    async fn sync_writes_snapshot_to_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        registry.inject_css("a", ".a{}");

        let path = DiskSync::new(Arc::clone(&registry))
            .sync(BundleKind::Style)
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("public/style.css"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), ".a{}\n");
    }

    #[tokio::test]
    async fn sync_all_respects_overwrite_flag() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        let sync = DiskSync::new(Arc::clone(&registry));
        let index = dir.path().join("public/index.html");
        write_file(&index, b"hand written").await.unwrap();

        let written = sync.sync_all(false).await.unwrap();
        assert_eq!(written.len(), 4);
        assert_eq!(std::fs::read_to_string(&index).unwrap(), "hand written");

        let written = sync.sync_all(true).await.unwrap();
        assert_eq!(written.len(), 5);
        assert!(std::fs::read_to_string(&index).unwrap().contains("<title>MyApp</title>"));
    }
}
