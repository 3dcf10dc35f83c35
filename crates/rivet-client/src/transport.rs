use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::context::ClientContext;
use rivet_common::RivetError;

/// Raw response handed back by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Pluggable HTTP transport for generated clients.
///
/// Implementations only move bytes; encoding, status handling and error
/// envelope parsing happen in [`do_json_request`](crate::do_json_request)
/// and [`do_binary_request`](crate::do_binary_request).
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
        ctx: &ClientContext,
    ) -> Result<TransportResponse, RivetError>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
        ctx: &ClientContext,
    ) -> Result<TransportResponse, RivetError> {
        (**self).post(url, content_type, body, ctx).await
    }
}

/// Default transport backed by a pooled [`reqwest::Client`].
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a transport with the default [`ClientConfig`].
    pub fn new() -> Result<Self, RivetError> {
        Self::with_config(&ClientConfig::default())
    }

    pub fn with_config(config: &ClientConfig) -> Result<Self, RivetError> {
        let inner = reqwest::Client::builder()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| RivetError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { inner })
    }

    /// Wraps an existing reqwest client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn post(
        &self,
        url: &str,
        content_type: &str,
        body: Vec<u8>,
        ctx: &ClientContext,
    ) -> Result<TransportResponse, RivetError> {
        let mut request = self
            .inner
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::ACCEPT, content_type);
        for (name, value) in ctx.headers() {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| RivetError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| RivetError::Transport(format!("Failed to read response body: {}", e)))?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(ReqwestClient::new().is_ok());
    }

    #[test]
    fn test_success_range() {
        let ok = TransportResponse { status: 204, body: Vec::new() };
        let redirect = TransportResponse { status: 302, body: Vec::new() };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
    }
}
