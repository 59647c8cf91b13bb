use crate::error::FetchError;
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that sends an API key as an HTTP header.
///
/// The header name and value are validated once at construction, so every
/// request gets the same pre-built header.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    /// The header the MTA API gateway expects.
    pub const DEFAULT_HEADER: &'static str = "x-api-key";

    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, FetchError> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|e| FetchError::InvalidCredential(format!("header name '{header_name}': {e}")))?;
        let mut key = HeaderValue::from_str(key)
            .map_err(|e| FetchError::InvalidCredential(format!("value for {header_name}: {e}")))?;
        key.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// Uses the `x-api-key` header.
    pub fn with_default_header(inner: C, key: &str) -> Result<Self, FetchError> {
        Self::new(inner, Self::DEFAULT_HEADER, key)
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unused;

    #[test]
    fn test_default_header() {
        let client = ApiKey::with_default_header(Unused, "secret").unwrap();
        assert_eq!(client.header_name().as_str(), "x-api-key");
    }

    #[test]
    fn test_rejects_invalid_header_name() {
        assert!(ApiKey::new(Unused, "bad header", "secret").is_err());
    }

    #[test]
    fn test_rejects_invalid_header_value() {
        assert!(ApiKey::with_default_header(Unused, "line\nbreak").is_err());
    }
}
