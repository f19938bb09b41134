//! CLI command implementations.

pub mod add;
pub mod list;
pub mod show;
pub mod sync;
pub mod transfer;

use parking_lot::RwLock;
use quotesync_core::QuoteRepository;
use quotesync_storage::{DirLock, FileStore, KeyValueStore};
use quotesync_sync_engine::{HttpTransport, SharedRepository, SyncConfig, SyncEngine};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// File holding the quote list and the selected filter.
const STORE_FILE: &str = "store.json";

/// File holding the last viewed quote.
const SESSION_FILE: &str = "session.json";

/// Everything a command needs: the opened repository and the sync settings.
///
/// Holds the data directory lock for as long as it lives.
pub struct Context {
    repository: SharedRepository,
    sync_config: SyncConfig,
    _lock: DirLock,
}

impl Context {
    /// Locks `data_dir` and opens the stores in it, creating the directory
    /// if needed. Fails if another process holds the directory.
    pub fn open(
        data_dir: &Path,
        sync_config: SyncConfig,
        fresh_session: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let lock = DirLock::acquire(data_dir)?;
        let durable = Arc::new(FileStore::open_with_create_dirs(&data_dir.join(STORE_FILE))?);
        let session = Arc::new(FileStore::open_with_create_dirs(&data_dir.join(SESSION_FILE))?);

        if fresh_session {
            for key in session.keys()? {
                session.remove(&key)?;
            }
            debug!("cleared session store");
        }

        let repository = QuoteRepository::open(durable, session)?;
        Ok(Self {
            repository: Arc::new(RwLock::new(repository)),
            sync_config,
            _lock: lock,
        })
    }

    /// Returns the shared repository.
    pub fn repository(&self) -> &SharedRepository {
        &self.repository
    }

    /// Returns the sync settings.
    pub fn sync_config(&self) -> &SyncConfig {
        &self.sync_config
    }

    /// Builds a sync engine talking HTTP to the configured server.
    pub fn engine(&self) -> Result<SyncEngine<HttpTransport>, Box<dyn std::error::Error>> {
        let transport = HttpTransport::from_config(&self.sync_config)?;
        Ok(SyncEngine::new(
            self.sync_config.clone(),
            transport,
            Arc::clone(&self.repository),
        ))
    }
}
