//! Blob storage behind the resize pipeline.
//!
//! The [`BlobStore`] trait is the only way the pipeline touches persisted
//! bytes — source images, cache artifacts, and explicit targets all go
//! through it. The production implementation is [`FsStore`], rooted at a base
//! directory so every path in the public API stays root-relative (and safely
//! embeddable in cache keys). Tests use the in-memory store from
//! [`tests`].
//!
//! Writes are atomic: [`FsStore::write`] stages bytes in a temporary file in
//! the destination directory and renames it into place, so a concurrent
//! reader either sees the previous state or the complete artifact, never a
//! partial file. Two writers racing on the same cache key both succeed with
//! identical bytes.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage operations the resize pipeline depends on.
///
/// All paths are relative to the store root and use `/` separators.
pub trait BlobStore: Sync {
    fn exists(&self, path: &str) -> bool;

    /// Modification time in seconds since the Unix epoch.
    fn mtime(&self, path: &str) -> Result<u64, StoreError>;

    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Write atomically, creating parent directories as needed.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError>;

    fn copy(&self, src: &str, dst: &str) -> Result<(), StoreError>;

    /// Set file permissions. A no-op on platforms without Unix modes.
    fn chmod(&self, path: &str, mode: u32) -> Result<(), StoreError>;
}

/// Filesystem store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn ensure_parent(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl BlobStore for FsStore {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn mtime(&self, path: &str) -> Result<u64, StoreError> {
        let full = self.resolve(path);
        let meta = fs::metadata(&full).map_err(|_| StoreError::NotFound(path.to_string()))?;
        let modified = meta.modified()?;
        Ok(modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0))
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let full = self.resolve(path);
        if !full.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(fs::read(full)?)
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let full = self.resolve(path);
        self.ensure_parent(&full)?;
        // Stage in the destination directory so the final rename cannot
        // cross a filesystem boundary.
        let dir = full.parent().unwrap_or(&self.root);
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.persist(&full).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn copy(&self, src: &str, dst: &str) -> Result<(), StoreError> {
        let from = self.resolve(src);
        if !from.is_file() {
            return Err(StoreError::NotFound(src.to_string()));
        }
        let to = self.resolve(dst);
        self.ensure_parent(&to)?;
        fs::copy(from, to)?;
        Ok(())
    }

    #[cfg(unix)]
    fn chmod(&self, path: &str, mode: u32) -> Result<(), StoreError> {
        use std::os::unix::fs::PermissionsExt;
        let full = self.resolve(path);
        if !full.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        fs::set_permissions(full, fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn chmod(&self, _path: &str, _mode: u32) -> Result<(), StoreError> {
        Ok(())
    }
}
