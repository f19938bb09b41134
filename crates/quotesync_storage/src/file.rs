//! File-backed key-value store for durable storage.

use crate::backend::KeyValueStore;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file-backed key-value store.
///
/// All entries live in a single JSON object file. Every mutation rewrites
/// the file through a temporary sibling and an atomic rename, so a crash
/// never leaves a half-written store behind. Values survive process
/// restarts.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
/// Internal locking serializes writers.
///
/// # Example
///
/// ```no_run
/// use quotesync_storage::{FileStore, KeyValueStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("store.json")).unwrap();
/// store.set("quotes_v1", "[]").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens or creates a file store at the given path.
    ///
    /// If the file exists, its entries are loaded. If it doesn't exist, an
    /// empty store file is created.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] if the file exists but is not a
    /// JSON object of strings, or an I/O error if it cannot be read or
    /// created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let entries = if path.exists() {
            let raw = fs::read_to_string(path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    StorageError::Corrupted(format!("{}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        let store = Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
        };

        if !path.exists() {
            store.persist(&store.entries.read())?;
        }

        debug!(path = %path.display(), "opened file store");
        Ok(store)
    }

    /// Opens or creates a file store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let encoded = serde_json::to_vec_pretty(entries)?;
        let tmp_path = self.path.with_extension("tmp");

        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&encoded)?;
            tmp.sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.write();
        let previous = entries.insert(key.to_string(), value.to_string());

        if let Err(e) = self.persist(&entries) {
            // Keep memory and disk in agreement.
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.write();
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&entries) {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
