//! Data directory locking.
//!
//! A [`FileStore`](crate::FileStore) writes its whole map on every change, so
//! two processes sharing a data directory would overwrite each other's
//! updates. The owner of a [`DirLock`] is the only process allowed to open
//! the stores in that directory.

use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOCK_FILE: &str = "LOCK";

/// An exclusive advisory lock on a data directory.
///
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
    _lock_file: File,
}

impl DirLock {
    /// Creates `dir` if needed and locks it without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if another owner holds the lock, or
    /// an I/O error if the directory or lock file cannot be created.
    pub fn acquire(dir: &Path) -> StorageResult<Self> {
        fs::create_dir_all(dir)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked(dir.to_path_buf()));
        }

        debug!(dir = %dir.display(), "locked data directory");
        Ok(Self {
            path: dir.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the locked directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
