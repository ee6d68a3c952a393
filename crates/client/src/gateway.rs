//! Authenticated request gateway.
//!
//! Every outbound call flows through [`Gateway::execute`]:
//!
//! 1. read the access token from the credential store (a read failure is
//!    treated as "no credentials" - fail closed to anonymous);
//! 2. send the request with a bearer header when a token exists;
//! 3. on 401, hand off to the [`RefreshCoordinator`] - one refresh shared
//!    by all concurrent 401s - then replay the identical request once with
//!    the rotated token;
//! 4. a 401 on the replayed request, or a failed refresh, surfaces as
//!    [`ApiError::SessionExpired`] without another refresh cycle;
//! 5. non-2xx responses are normalized into the [`ApiError`] taxonomy.
//!
//! The gateway keeps no token copies; the credential store is read on
//! every request.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use clementine_core::CredentialStore;

use crate::config::ApiConfig;
use crate::error::{ApiError, normalize_error_response};
use crate::http::refresh::RefreshCoordinator;
use crate::http::{HttpTransport, Method, TransportError, TransportRequest, TransportResponse};

const REFRESH_PATH: &str = "/users/refresh/";

/// A request description: method, backend path, optional JSON body.
///
/// Requests are replayable - the gateway re-resolves the bearer token when
/// it re-issues one after a refresh.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl Request {
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::Get,
            path: path.to_owned(),
            body: None,
        }
    }

    #[must_use]
    pub fn post(path: &str, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.to_owned(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn patch(path: &str, body: serde_json::Value) -> Self {
        Self {
            method: Method::Patch,
            path: path.to_owned(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn put(path: &str, body: serde_json::Value) -> Self {
        Self {
            method: Method::Put,
            path: path.to_owned(),
            body: Some(body),
        }
    }

    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self {
            method: Method::Delete,
            path: path.to_owned(),
            body: None,
        }
    }

    #[must_use]
    pub fn delete_with_body(path: &str, body: serde_json::Value) -> Self {
        Self {
            method: Method::Delete,
            path: path.to_owned(),
            body: Some(body),
        }
    }
}

/// The authenticated request gateway. Cheaply cloneable.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialStore>,
    refresher: RefreshCoordinator,
    base_url: url::Url,
}

impl Gateway {
    /// Wire a gateway from its collaborators.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialStore>,
        config: &ApiConfig,
    ) -> Self {
        let refresh_url = config
            .base_url
            .join(REFRESH_PATH)
            .map_or_else(|_| format!("{}{REFRESH_PATH}", config.base_url), Into::into);

        let refresher = RefreshCoordinator::new(
            Arc::clone(&transport),
            Arc::clone(&credentials),
            refresh_url,
        );

        Self {
            inner: Arc::new(GatewayInner {
                transport,
                credentials,
                refresher,
                base_url: config.base_url.clone(),
            }),
        }
    }

    /// The credential store this gateway reads tokens from.
    #[must_use]
    pub fn credentials(&self) -> Arc<dyn CredentialStore> {
        Arc::clone(&self.inner.credentials)
    }

    /// Execute a request and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures, session expiry,
    /// normalized backend rejections, or an undecodable success body.
    pub async fn execute<T: DeserializeOwned>(&self, request: Request) -> Result<T, ApiError> {
        let body = self.execute_raw(request).await?;
        serde_json::from_str(&body).map_err(ApiError::from)
    }

    /// Execute a request, discarding the response body (deletes, logouts).
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Gateway::execute`], minus decoding.
    pub async fn execute_empty(&self, request: Request) -> Result<(), ApiError> {
        self.execute_raw(request).await.map(drop)
    }

    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn execute_raw(&self, request: Request) -> Result<String, ApiError> {
        let bearer = self.access_token().await;
        let response = self.send(&request, bearer).await?;

        if response.status != 401 {
            return into_body(response);
        }

        // First 401: one shared refresh, then one replay. The refresh
        // coordinator guarantees a single exchange no matter how many
        // requests land here concurrently.
        debug!("401 received, joining token refresh");
        let token = match self.inner.refresher.refresh().await {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "refresh failed, session expired");
                return Err(ApiError::SessionExpired);
            }
        };

        let replayed = self.send(&request, Some(token)).await?;
        if replayed.status == 401 {
            // Already retried once: the backend is rejecting the user, not
            // the token. Never start a second refresh cycle.
            warn!("request 401'd again after refresh, treating session as expired");
            return Err(ApiError::SessionExpired);
        }

        into_body(replayed)
    }

    async fn send(
        &self,
        request: &Request,
        bearer: Option<String>,
    ) -> Result<TransportResponse, ApiError> {
        let url = self
            .inner
            .base_url
            .join(&request.path)
            .map_err(|e| ApiError::Unexpected(format!("unresolvable path {}: {e}", request.path)))?;

        let wire = TransportRequest {
            method: request.method,
            url: url.into(),
            bearer,
            body: request.body.clone(),
        };

        self.inner.transport.send(wire).await.map_err(|e| match e {
            TransportError::Timeout => ApiError::Network("request timed out".to_owned()),
            TransportError::Connect(msg) => ApiError::Network(format!("connection failed: {msg}")),
            TransportError::Other(msg) => ApiError::Network(msg),
        })
    }

    /// Current access token; storage read failures fail closed to
    /// anonymous.
    async fn access_token(&self) -> Option<String> {
        match self.inner.credentials.get().await {
            Ok(session) => session.and_then(|s| s.access_token),
            Err(e) => {
                warn!(error = %e, "credential read failed, proceeding anonymously");
                None
            }
        }
    }
}

fn into_body(response: TransportResponse) -> Result<String, ApiError> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(normalize_error_response(response.status, &response.body))
    }
}
