//! Configuration for the sync engine.

use std::time::Duration;

/// Remote collection used when no URL is configured.
pub const DEFAULT_SERVER_URL: &str = "https://jsonplaceholder.typicode.com/posts";

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote collection URL, used for both fetch and submit.
    pub server_url: String,
    /// Maximum number of remote items merged per cycle.
    pub batch_limit: usize,
    /// Category given to every remote-derived quote.
    pub remote_category: String,
    /// Interval between scheduled cycles.
    pub sync_interval: Duration,
    /// Request timeout.
    pub timeout: Duration,
}

impl SyncConfig {
    /// Creates a new sync configuration for the given remote URL.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            batch_limit: 5,
            remote_category: "Server".into(),
            sync_interval: Duration::from_secs(5 * 60),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the remote batch limit.
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit;
        self
    }

    /// Sets the category label for remote quotes.
    pub fn with_remote_category(mut self, category: impl Into<String>) -> Self {
        self.remote_category = category.into();
        self
    }

    /// Sets the interval for scheduled sync.
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}
