//! Local filesystem tier
//!
//! Entries live at `<root>/<backend>/<project>/<toolchain...>/<fp>.tar.gz`.
//! Writes go through a temporary sibling file that is renamed into place, so
//! an entry either exists completely or not at all.

use super::archive;
use super::key::{is_entry_file_name, CacheKey};
use crate::error::{DepcacheError, DepcacheResult};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Local cache tier rooted at a directory
#[derive(Debug, Clone)]
pub struct LocalTier {
    root: PathBuf,
}

impl LocalTier {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the entry for `key`
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        key.local_path(&self.root)
    }

    /// Size in bytes of the entry for `key`, if present
    pub async fn entry_size(&self, key: &CacheKey) -> Option<u64> {
        tokio::fs::metadata(self.entry_path(key))
            .await
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len())
    }

    /// Restore the entry for `key` into `destination`, replacing its contents
    pub async fn fetch(&self, key: &CacheKey, destination: &Path) -> DepcacheResult<()> {
        let archive_path = self.entry_path(key);
        let target = destination.to_path_buf();
        debug!(
            "Restoring {} into {}",
            archive_path.display(),
            target.display()
        );

        let restore_path = archive_path.clone();
        tokio::task::spawn_blocking(move || archive::decompress_file(&restore_path, &target))
            .await
            .map_err(|e| DepcacheError::Internal(format!("restore task failed: {e}")))?
            .map_err(|e| DepcacheError::io(format!("restoring {}", archive_path.display()), e))
    }

    /// Archive `source` as the entry for `key`.
    ///
    /// Returns `Ok(false)` when `source` does not exist and nothing was
    /// written.
    pub async fn store(&self, key: &CacheKey, source: &Path, backend: &str) -> DepcacheResult<bool> {
        let archive_path = self.entry_path(key);
        let source = source.to_path_buf();
        let backend = backend.to_string();

        tokio::task::spawn_blocking(move || write_entry(&archive_path, &source, &backend))
            .await
            .map_err(|e| DepcacheError::Internal(format!("archive task failed: {e}")))?
    }

    /// Remove the entry for `key`; a missing entry is not an error
    pub async fn evict(&self, key: &CacheKey) -> DepcacheResult<()> {
        let path = self.entry_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Evicted {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DepcacheError::io(format!("removing {}", path.display()), e)),
        }
    }

    /// Delete every cache entry file under the root, returning how many were
    /// removed. Other files are left alone.
    pub fn clean(&self) -> io::Result<usize> {
        if !self.root.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_entry = entry
                .file_name()
                .to_str()
                .is_some_and(is_entry_file_name);
            if is_entry {
                fs::remove_file(entry.path())?;
                debug!("Deleted {}", entry.path().display());
                removed += 1;
            }
        }
        Ok(removed)
    }
}

fn write_entry(archive_path: &Path, source: &Path, backend: &str) -> DepcacheResult<bool> {
    let write_failed = |reason: String| DepcacheError::CacheWriteFailed {
        backend: backend.to_string(),
        path: archive_path.to_path_buf(),
        reason,
    };

    if !source.is_dir() {
        debug!("No install directory at {}, skipping archive", source.display());
        return Ok(false);
    }

    let parent = archive_path
        .parent()
        .ok_or_else(|| write_failed("entry path has no parent directory".to_string()))?;
    fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
    let tmp = NamedTempFile::new_in(parent).map_err(|e| write_failed(e.to_string()))?;

    let mut writer = BufWriter::new(tmp.as_file());
    archive::compress_dir(source, &mut writer).map_err(|e| DepcacheError::ArchiveFailed {
        backend: backend.to_string(),
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    writer.flush().map_err(|e| write_failed(e.to_string()))?;
    drop(writer);

    tmp.as_file()
        .sync_all()
        .map_err(|e| write_failed(e.to_string()))?;
    tmp.persist(archive_path).map_err(|e| {
        warn!("Could not move archive into {}", archive_path.display());
        write_failed(e.error.to_string())
    })?;
    Ok(true)
}
