//! HTTP transport seam.
//!
//! The gateway and the refresh coordinator speak to the network through
//! [`HttpTransport`], an object-safe trait. Production wires in
//! [`ReqwestTransport`]; tests wire in scripted transports that replay
//! canned responses with artificial latency.
//!
//! A [`TransportResponse`] always carries the body as text: error bodies
//! arrive in half a dozen shapes (see `error`), so the transport never
//! tries to interpret them.

pub mod refresh;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ApiConfig;

/// HTTP method subset the backend surface uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        write!(f, "{s}")
    }
}

/// One wire-level request, fully resolved (absolute URL, bearer decided).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

/// One wire-level response: status plus the raw body text.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Failures below the HTTP layer: nothing came back at all.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The fixed request timeout elapsed.
    #[error("request timed out")]
    Timeout,
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Anything else the HTTP stack reports.
    #[error("transport failure: {0}")]
    Other(String),
}

/// The seam between the gateway and the wire.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one HTTP exchange.
    ///
    /// Non-2xx statuses are NOT errors at this layer; they come back as a
    /// [`TransportResponse`] for the gateway to interpret.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

// =============================================================================
// ReqwestTransport
// =============================================================================

/// Production transport over `reqwest` with the fixed timeout and
/// User-Agent from [`ApiConfig`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Other` if the underlying client cannot be
    /// constructed (malformed user agent, TLS backend failure).
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);

        if let Some(token) = &request.bearer {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();

        // Body as text first: error bodies vary in shape and success bodies
        // are parsed by the caller, so no interpretation happens here.
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(TransportResponse { status, body })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        assert!(TransportResponse { status: 200, body: String::new() }.is_success());
        assert!(TransportResponse { status: 204, body: String::new() }.is_success());
        assert!(!TransportResponse { status: 301, body: String::new() }.is_success());
        assert!(!TransportResponse { status: 401, body: String::new() }.is_success());
        assert!(!TransportResponse { status: 500, body: String::new() }.is_success());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
