//! Delegated network fetch
//!
//! When a fetch is not served from the local slot it goes through a
//! `RemoteSource`. `HttpSource` reads JSON over HTTP; tests substitute their
//! own implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Read the JSON document at `url`
    async fn read(&self, url: &str) -> Result<Value>;
}

/// `RemoteSource` backed by a `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn read(&self, url: &str) -> Result<Value> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()?;

        response
            .json::<Value>()
            .await
            .with_context(|| format!("Response from {} is not JSON", url))
    }
}
