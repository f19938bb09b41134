//! Transport layer abstraction for the remote quote collection.

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use quotesync_core::{Quote, ServerId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// An item of the remote collection.
///
/// Only `id` and `title` are read; any other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePost {
    /// Remote identifier.
    pub id: ServerId,
    /// Title, used as quote text.
    pub title: String,
}

impl RemotePost {
    /// Creates a remote item.
    pub fn new(id: impl Into<ServerId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A quote transport handles network communication with the remote
/// collection.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, mock for testing, etc.).
#[async_trait]
pub trait QuoteTransport: Send + Sync {
    /// Fetches at most `limit` items from the head of the remote collection.
    ///
    /// Items past `limit` are never decoded, so they cannot fail the fetch.
    async fn fetch_posts(&self, limit: usize) -> SyncResult<Vec<RemotePost>>;

    /// Submits a newly added quote.
    async fn submit_quote(&self, quote: &Quote) -> SyncResult<()>;
}

/// A mock transport for testing.
///
/// Serves a fixed list of posts, optionally after a delay, and records
/// every submitted quote.
#[derive(Debug, Default)]
pub struct MockTransport {
    posts: Mutex<Vec<RemotePost>>,
    failure: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    submitted: Mutex<Vec<Quote>>,
    fetches: AtomicUsize,
}

impl MockTransport {
    /// Creates a mock transport with an empty remote collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock transport serving `posts`.
    pub fn with_posts(posts: Vec<RemotePost>) -> Self {
        let transport = Self::new();
        transport.set_posts(posts);
        transport
    }

    /// Replaces the served posts.
    pub fn set_posts(&self, posts: Vec<RemotePost>) {
        *self.posts.lock() = posts;
    }

    /// Makes every request fail with a retryable transport error, or clears
    /// the failure with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock() = message.map(str::to_string);
    }

    /// Delays every request by `delay`.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Returns every quote submitted so far.
    pub fn submitted(&self) -> Vec<Quote> {
        self.submitted.lock().clone()
    }

    /// Returns how many fetches were started.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn simulate_network(&self) -> SyncResult<()> {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failure.lock().as_deref() {
            Some(message) => Err(SyncError::transport_retryable(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QuoteTransport for MockTransport {
    async fn fetch_posts(&self, limit: usize) -> SyncResult<Vec<RemotePost>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate_network().await?;
        Ok(self.posts.lock().iter().take(limit).cloned().collect())
    }

    async fn submit_quote(&self, quote: &Quote) -> SyncResult<()> {
        self.simulate_network().await?;
        self.submitted.lock().push(quote.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_post_ignores_extra_fields() {
        let post: RemotePost = serde_json::from_str(
            r#"{"userId":1,"id":1,"title":"sunt aut facere","body":"quia et suscipit"}"#,
        )
        .unwrap();
        assert_eq!(post, RemotePost::new(1, "sunt aut facere"));
    }

    #[tokio::test]
    async fn mock_transport_serves_posts() {
        let transport =
            MockTransport::with_posts(vec![RemotePost::new(1, "A"), RemotePost::new(2, "B")]);
        let posts = transport.fetch_posts(5).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(transport.fetch_posts(1).await.unwrap(), vec![RemotePost::new(1, "A")]);
        assert_eq!(transport.fetch_count(), 2);
    }

    #[tokio::test]
    async fn mock_transport_failure() {
        let transport = MockTransport::new();
        transport.set_failure(Some("offline"));

        let result = transport.fetch_posts(5).await;
        assert!(matches!(result, Err(SyncError::Transport { .. })));

        let result = transport.submit_quote(&Quote::new("A", "X")).await;
        assert!(result.is_err());
        assert!(transport.submitted().is_empty());

        transport.set_failure(None);
        assert!(transport.fetch_posts(5).await.is_ok());
    }

    #[tokio::test]
    async fn mock_transport_records_submissions() {
        let transport = MockTransport::new();
        transport.submit_quote(&Quote::new("A", "X")).await.unwrap();
        assert_eq!(transport.submitted(), vec![Quote::new("A", "X")]);
    }
}
