//! HTTP transport backed by reqwest.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::Transport;
use crate::error::TransportError;
use crate::models::{HttpRequest, Method, RawResponse};

/// JSON-over-HTTP transport rooted at a base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport for `base_url` with a per-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Wraps an existing client (shared connection pool, custom headers).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_builder() {
        TransportError::Client(error.to_string())
    } else {
        TransportError::Network(error.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let url = self.url(&request.endpoint);
        debug!(method = request.method.as_str(), url = %url, "Sending API request");

        let mut builder = self.client.request(to_reqwest(request.method), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_error)?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))?
        };

        Ok(RawResponse::new(status.as_u16(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let transport =
            ReqwestTransport::new("http://localhost:8080/api/", Duration::from_secs(5)).unwrap();

        assert_eq!(transport.base_url(), "http://localhost:8080/api");
        assert_eq!(
            transport.url("/projects"),
            "http://localhost:8080/api/projects"
        );
        assert_eq!(transport.url("users/me"), "http://localhost:8080/api/users/me");
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest(Method::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest(Method::Patch), reqwest::Method::PATCH);
        assert_eq!(to_reqwest(Method::Delete), reqwest::Method::DELETE);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 9 (discard) is closed on loopback in test environments.
        let transport =
            ReqwestTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = transport
            .send(HttpRequest {
                method: Method::Get,
                endpoint: "/projects".to_string(),
                query: Vec::new(),
                body: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(TransportError::Network(_)) | Err(TransportError::Timeout(_))
        ));
    }
}
