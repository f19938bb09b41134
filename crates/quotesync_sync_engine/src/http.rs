//! HTTP transport implementation.
//!
//! Fetches the remote collection with `GET <url>` and submits quotes with
//! `POST <url>`, both as JSON.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::{QuoteTransport, RemotePost};
use async_trait::async_trait;
use quotesync_core::Quote;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Body sent when submitting a quote.
#[derive(Debug, Serialize)]
struct QuoteSubmission<'a> {
    text: &'a str,
    category: &'a str,
}

/// HTTP-based quote transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Remote collection URL.
    url: String,
    /// HTTP client implementation.
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(url, client))
    }

    /// Creates a transport from the sync configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &SyncConfig) -> SyncResult<Self> {
        Self::new(config.server_url.clone(), config.timeout)
    }

    /// Creates a transport around an existing client.
    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// Returns the remote collection URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn check_status(response: &reqwest::Response) -> SyncResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(SyncError::Status(status.as_u16()))
    }
}

#[async_trait]
impl QuoteTransport for HttpTransport {
    async fn fetch_posts(&self, limit: usize) -> SyncResult<Vec<RemotePost>> {
        let response = self.client.get(&self.url).send().await?;
        check_status(&response)?;

        let items: Vec<Value> = response
            .json()
            .await
            .map_err(|e| SyncError::Protocol(format!("expected an array of items: {e}")))?;
        let total = items.len();

        let posts = items
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item)
                    .map_err(|e| SyncError::Protocol(format!("remote item {i}: {e}")))
            })
            .collect::<SyncResult<Vec<RemotePost>>>()?;
        debug!(count = posts.len(), total, url = %self.url, "fetched remote items");
        Ok(posts)
    }

    async fn submit_quote(&self, quote: &Quote) -> SyncResult<()> {
        let body = QuoteSubmission {
            text: &quote.text,
            category: &quote.category,
        };
        let response = self.client.post(&self.url).json(&body).send().await?;
        check_status(&response)?;
        debug!(url = %self.url, "submitted quote");
        Ok(())
    }
}
