mod basic;
mod client;
mod transport;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use transport::{HttpTransport, Transport};

use serde_json::Value;

use crate::error::FetchError;

/// Issues a GET for `url` and decodes the body as JSON.
///
/// # Errors
///
/// Non-2xx responses become [`FetchError::Status`]; a body that is not JSON
/// becomes [`FetchError::Malformed`].
pub async fn fetch_json<C: HttpClient>(client: &C, url: &str) -> Result<Value, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            path: url.to_string(),
        });
    }

    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
