//! Repository configuration.

/// Storage keys used by the quote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Durable key holding the JSON array of quotes.
    pub quotes_key: String,

    /// Durable key holding the last selected category filter.
    pub last_filter_key: String,

    /// Session key holding the last viewed quote.
    pub last_viewed_key: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            quotes_key: "quotes_v1".into(),
            last_filter_key: "lastSelectedCategory".into(),
            last_viewed_key: "lastViewedQuote".into(),
        }
    }
}

impl RepositoryConfig {
    /// Creates a new configuration with default keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the durable key for the quote list.
    #[must_use]
    pub fn quotes_key(mut self, key: impl Into<String>) -> Self {
        self.quotes_key = key.into();
        self
    }

    /// Sets the durable key for the last filter.
    #[must_use]
    pub fn last_filter_key(mut self, key: impl Into<String>) -> Self {
        self.last_filter_key = key.into();
        self
    }

    /// Sets the session key for the last viewed quote.
    #[must_use]
    pub fn last_viewed_key(mut self, key: impl Into<String>) -> Self {
        self.last_viewed_key = key.into();
        self
    }
}
