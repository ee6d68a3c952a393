//! Shared test doubles for Clementine integration tests.
//!
//! [`MockBackend`] is a scripted [`HttpTransport`]: tests enqueue
//! responses per route, the backend replays them in order (after an
//! optional artificial delay) and records every request it saw - bearer
//! tokens included - so tests can assert on exactly what went over the
//! wire. An unscripted route answers with a transport error, which keeps a
//! test that forgot a script from hanging or passing silently.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use clementine_client::credentials::InMemoryCredentialStore;
use clementine_client::http::{
    HttpTransport, Method, TransportError, TransportRequest, TransportResponse,
};
use clementine_client::{ApiConfig, CommerceClient};
use clementine_core::{AuthSession, CredentialError, CredentialStore};

/// Base URL every test client points at.
pub const TEST_BASE_URL: &str = "https://api.test";

/// One scripted exchange: an optional delay, then a canned outcome.
pub struct ScriptedResponse {
    pub delay: Duration,
    pub result: Result<TransportResponse, TransportError>,
}

impl ScriptedResponse {
    /// Immediate 200 with a JSON body.
    #[must_use]
    pub fn ok(body: serde_json::Value) -> Self {
        Self::status(200, body)
    }

    /// Immediate response with an arbitrary status.
    #[must_use]
    pub fn status(status: u16, body: serde_json::Value) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(TransportResponse {
                status,
                body: body.to_string(),
            }),
        }
    }

    /// Immediate connectivity failure.
    #[must_use]
    pub fn network_error() -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(TransportError::Connect("connection refused".to_owned())),
        }
    }

    /// Delay this response by the given duration.
    #[must_use]
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Everything the backend saw about one request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<serde_json::Value>,
}

/// Scripted in-memory backend.
#[derive(Default)]
pub struct MockBackend {
    scripts: Mutex<HashMap<String, VecDeque<ScriptedResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a response for `METHOD path`.
    pub fn script(&self, method: Method, path: &str, response: ScriptedResponse) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(route_key(&method.to_string(), path))
            .or_default()
            .push_back(response);
    }

    /// Enqueue the same response body N times for `METHOD path`.
    pub fn script_n(&self, method: Method, path: &str, status: u16, body: &serde_json::Value, n: usize) {
        for _ in 0..n {
            self.script(method, path, ScriptedResponse::status(status, body.clone()));
        }
    }

    /// Every request recorded so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many requests hit `METHOD path`.
    #[must_use]
    pub fn hits(&self, method: Method, path: &str) -> usize {
        let key = route_key(&method.to_string(), path);
        self.requests()
            .iter()
            .filter(|r| route_key(&r.method, &r.path) == key)
            .count()
    }
}

#[async_trait]
impl HttpTransport for MockBackend {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let path = url::Url::parse(&request.url)
            .map(|u| u.path().to_owned())
            .unwrap_or_else(|_| request.url.clone());

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method: request.method.to_string(),
                path: path.clone(),
                bearer: request.bearer.clone(),
                body: request.body.clone(),
            });

        let scripted = self
            .scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&route_key(&request.method.to_string(), &path))
            .and_then(VecDeque::pop_front);

        let Some(scripted) = scripted else {
            return Err(TransportError::Other(format!(
                "no script for {} {path}",
                request.method
            )));
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }

        scripted.result
    }
}

fn route_key(method: &str, path: &str) -> String {
    format!("{method} {path}")
}

// =============================================================================
// Credential store doubles
// =============================================================================

/// A credential store whose reads always fail, for fail-closed tests.
#[derive(Default)]
pub struct BrokenCredentialStore;

#[async_trait]
impl CredentialStore for BrokenCredentialStore {
    async fn get(&self) -> Result<Option<AuthSession>, CredentialError> {
        Err(CredentialError::Io("disk on fire".to_owned()))
    }

    async fn set(&self, _session: &AuthSession) -> Result<(), CredentialError> {
        Err(CredentialError::Io("disk on fire".to_owned()))
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        Err(CredentialError::Io("disk on fire".to_owned()))
    }
}

// =============================================================================
// Client wiring helpers
// =============================================================================

/// A test client over a mock backend, optionally pre-authenticated.
#[must_use]
pub fn test_client(
    backend: Arc<MockBackend>,
    session: Option<AuthSession>,
) -> (CommerceClient, Arc<InMemoryCredentialStore>) {
    let config = ApiConfig::new(TEST_BASE_URL).expect("test base url parses");
    let credentials = Arc::new(session.map_or_else(InMemoryCredentialStore::new, |s| {
        InMemoryCredentialStore::with_session(s)
    }));

    let client = CommerceClient::with_parts(
        &config,
        backend as Arc<dyn HttpTransport>,
        Arc::clone(&credentials) as Arc<dyn CredentialStore>,
    );

    (client, credentials)
}

/// A session with both tokens present.
#[must_use]
pub fn authenticated_session() -> AuthSession {
    AuthSession::authenticated("access-0".into(), "refresh-0".into(), None)
}
