use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::client::HttpClient;
use super::fetch_json;
use crate::error::FetchError;

/// Fetches a JSON document by path relative to the API base.
///
/// This is the only way the session controller and the station panel reach
/// the network, so tests substitute an in-memory implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch_json(&self, path: &str) -> Result<Value, FetchError>;
}

/// [`Transport`] over HTTP against a fixed base URL.
pub struct HttpTransport<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> HttpTransport<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl<C: HttpClient> Transport for HttpTransport<C> {
    #[tracing::instrument(skip(self), fields(base = %self.base_url))]
    async fn fetch_json(&self, path: &str) -> Result<Value, FetchError> {
        let url = self.url_for(path);
        let started = std::time::Instant::now();
        let value = fetch_json(&self.client, &url).await?;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Response decoded");
        Ok(value)
    }
}
