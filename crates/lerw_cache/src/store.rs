//! Flat file-backed artifact storage.
//!
//! Each artifact lives at `<root>/<key>.txt`. New artifacts are written to a
//! hidden staging file in the same directory and renamed into place only once
//! complete, so a reader never sees a partially written artifact under its
//! final name.

use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::error::StorageError;
use crate::key::CacheKey;

/// File extension of published artifacts.
pub const ARTIFACT_EXT: &str = "txt";

/// File name suffix of staging files.
const STAGING_SUFFIX: &str = ".partial";

/// Maps cache keys to artifact files under a single root directory.
///
/// The store is the only component that creates, renames, or deletes files
/// in the root.
#[derive(Debug, Clone)]
pub struct ResultStore {
    /// Storage root directory.
    root: PathBuf,
}

impl ResultStore {
    /// Creates a store rooted at `root`. Does not touch the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the storage root if it does not exist.
    pub fn ensure_root(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.root).map_err(|source| StorageError::CreateRoot {
            path: self.root.clone(),
            source,
        })
    }

    /// Returns the artifact path for `key`. Pure; no I/O.
    pub fn path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}.{ARTIFACT_EXT}"))
    }

    /// Returns `true` if an artifact is currently published for `key`.
    pub fn exists(&self, key: &CacheKey) -> bool {
        self.path(key).is_file()
    }

    /// Deletes the artifact for `key`.
    ///
    /// Returns whether a file was removed; an absent artifact is not an error.
    pub fn invalidate(&self, key: &CacheKey) -> Result<bool, StorageError> {
        let path = self.path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(%key, "invalidated artifact");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Remove { path, source }),
        }
    }

    /// Creates an empty hidden staging file for `key` in the storage root.
    ///
    /// The file is deleted when the returned handle is dropped, unless it has
    /// been published with [`commit`](Self::commit).
    pub fn stage(&self, key: &CacheKey) -> Result<TempPath, StorageError> {
        tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.root)
            .map(|file| file.into_temp_path())
            .map_err(|source| StorageError::Stage {
                path: self.root.clone(),
                source,
            })
    }

    /// Atomically renames a staged file onto the artifact path for `key`,
    /// replacing any artifact already there.
    pub fn commit(&self, staged: TempPath, key: &CacheKey) -> Result<PathBuf, StorageError> {
        let path = self.path(key);
        staged
            .persist(&path)
            .map_err(|e| StorageError::Commit {
                path: path.clone(),
                source: e.error,
            })?;
        Ok(path)
    }

    /// Lists the keys of all published artifacts, sorted.
    ///
    /// A missing root is treated as an empty store.
    pub fn list(&self) -> Result<Vec<CacheKey>, StorageError> {
        let mut keys: Vec<CacheKey> = self
            .scan()?
            .into_iter()
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXT))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(CacheKey::from_stem)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Removes staging files left behind by interrupted runs and returns how
    /// many were deleted.
    ///
    /// Must not run while another process is computing into this root.
    pub fn sweep_staging(&self) -> Result<usize, StorageError> {
        let mut removed = 0;
        for path in self.scan()? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with('.') && name.ends_with(STAGING_SUFFIX) {
                std::fs::remove_file(&path)
                    .map_err(|source| StorageError::Remove {
                        path: path.clone(),
                        source,
                    })?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, root = %self.root.display(), "swept staging files");
        }
        Ok(removed)
    }

    /// Regular files directly under the root.
    fn scan(&self) -> Result<Vec<PathBuf>, StorageError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let scan_err = |source: std::io::Error| StorageError::Scan {
            path: self.root.clone(),
            source,
        };
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(scan_err)? {
            let entry = entry.map_err(scan_err)?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(files)
    }
}
