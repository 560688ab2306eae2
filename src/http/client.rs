//! reqwest-backed transport

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::types::{decode_body, ApiRequest, ApiResponse, StatusPolicy};
use super::Transport;
use crate::common::config::Config;
use crate::common::{Error, Result};

/// HTTP client bound to one base URL
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = reqwest::Url::parse(base_url).map_err(|e| Error::invalid_url(base_url, e))?;
        if parsed.cannot_be_a_base() {
            return Err(Error::invalid_url(base_url, "URL cannot be a base"));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Create a client from the effective configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.target.base_url, config.request_timeout())
    }

    /// Gets the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn map_send_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout(self.timeout.as_secs())
        } else {
            Error::Http(error)
        }
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url_for(&request.path);
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self.client.request(request.method.into(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status().as_u16();

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        let body = decode_body(&bytes);

        debug!(method = %request.method, path = %request.path, status, "received response");

        if request.status_policy == StatusPolicy::FailOnStatus && !(200..400).contains(&status) {
            return Err(Error::unexpected_status(
                request.method.as_str(),
                &request.path,
                status,
            ));
        }

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("http://localhost:3000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url_for("/posts"), "http://localhost:3000/posts");
        assert_eq!(client.url_for("posts/1"), "http://localhost:3000/posts/1");
    }

    #[test]
    fn test_base_path_is_kept() {
        let client = ApiClient::new("http://localhost:3000/api", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url_for("/register"), "http://localhost:3000/api/register");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(5)),
            Err(Error::InvalidUrl { .. })
        ));
        assert!(matches!(
            ApiClient::new("mailto:qa@example.com", Duration::from_secs(5)),
            Err(Error::InvalidUrl { .. })
        ));
    }
}
