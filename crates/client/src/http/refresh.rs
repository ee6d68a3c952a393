//! Single-flight token refresh coordination.
//!
//! When several in-flight requests hit 401 at once, exactly one refresh
//! call may reach the backend. The first caller to observe the 401 becomes
//! the leader and performs the exchange; everyone else enqueues a oneshot
//! waiter and suspends. When the exchange settles, the leader resolves
//! every waiter with the same outcome - a fresh access token, or the error
//! that ended the session.
//!
//! State machine: `Idle -> Refreshing -> Idle`. The `Mutex` around
//! [`RefreshState`] is only ever held between awaits, so the async runtime
//! never blocks on it.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use clementine_core::CredentialStore;

use super::{HttpTransport, Method, TransportError, TransportRequest};

/// Why a refresh attempt failed. Cloneable so one outcome can fan out to
/// every queued waiter.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// No session or no refresh token to exchange.
    #[error("no refresh token available")]
    NoSession,
    /// The backend rejected the refresh token.
    #[error("refresh rejected by backend: {0}")]
    Rejected(String),
    /// The refresh call never got a response.
    #[error("network failure during refresh: {0}")]
    Network(String),
    /// Reading or persisting the session failed mid-refresh.
    #[error("credential storage during refresh: {0}")]
    Credential(String),
}

type RefreshOutcome = Result<String, RefreshError>;

/// A caller blocked on the in-flight refresh. Each waiter is resolved
/// exactly once when the exchange settles.
type Waiter = oneshot::Sender<RefreshOutcome>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: Vec<Waiter>,
}

/// Coordinates token refresh so at most one exchange is ever in flight.
pub struct RefreshCoordinator {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialStore>,
    refresh_url: String,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialStore>,
        refresh_url: String,
    ) -> Self {
        Self {
            transport,
            credentials,
            refresh_url,
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Obtain a fresh access token, joining the in-flight refresh if one
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns the shared [`RefreshError`] when the exchange fails; by the
    /// time the error is observed the session has already been cleared
    /// (logout semantics).
    pub async fn refresh(&self) -> RefreshOutcome {
        let receiver = {
            let mut state = self.lock();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = receiver {
            debug!("refresh already in flight, queueing as waiter");
            // The leader resolves every waiter before leaving the
            // Refreshing state, so a dropped sender means the process is
            // tearing down mid-refresh.
            return rx
                .await
                .unwrap_or_else(|_| Err(RefreshError::Rejected("refresh abandoned".to_owned())));
        }

        let outcome = self.run_exchange().await;

        if outcome.is_err() {
            // Logout semantics: a failed refresh ends the session for every
            // caller, uniformly.
            if let Err(e) = self.credentials.clear().await {
                warn!(error = %e, "failed to clear session after refresh failure");
            }
        }

        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };

        debug!(waiters = waiters.len(), ok = outcome.is_ok(), "refresh settled");
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        outcome
    }

    /// The leader's exchange: read the refresh token, call the backend,
    /// persist the rotated access token.
    async fn run_exchange(&self) -> RefreshOutcome {
        let session = self
            .credentials
            .get()
            .await
            .map_err(|e| RefreshError::Credential(e.to_string()))?
            .ok_or(RefreshError::NoSession)?;

        let Some(refresh_token) = session.refresh_token.clone() else {
            return Err(RefreshError::NoSession);
        };

        let request = TransportRequest {
            method: Method::Post,
            url: self.refresh_url.clone(),
            bearer: None,
            body: Some(serde_json::json!({ "refresh_token": refresh_token })),
        };

        let response = self.transport.send(request).await.map_err(|e| match e {
            TransportError::Timeout => RefreshError::Network("request timed out".to_owned()),
            TransportError::Connect(msg) | TransportError::Other(msg) => {
                RefreshError::Network(msg)
            }
        })?;

        if !response.is_success() {
            return Err(RefreshError::Rejected(
                response.body.chars().take(200).collect(),
            ));
        }

        let access_token =
            parse_access_token(&response.body).ok_or_else(|| {
                RefreshError::Rejected("malformed refresh response".to_owned())
            })?;

        self.credentials
            .set(&session.with_access_token(access_token.clone()))
            .await
            .map_err(|e| RefreshError::Credential(e.to_string()))?;

        Ok(access_token)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The backend answers with `access_token` or `access` depending on the
/// deployment; accept both.
fn parse_access_token(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["access_token", "access"]
        .iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use clementine_core::AuthSession;

    use crate::credentials::InMemoryCredentialStore;
    use crate::http::TransportResponse;

    struct CannedTransport {
        response: Result<TransportResponse, TransportError>,
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        async fn send(
            &self,
            _request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.response.clone()
        }
    }

    fn coordinator(
        response: Result<TransportResponse, TransportError>,
        credentials: Arc<InMemoryCredentialStore>,
    ) -> RefreshCoordinator {
        RefreshCoordinator::new(
            Arc::new(CannedTransport { response }),
            credentials,
            "https://api.example.com/users/refresh/".to_owned(),
        )
    }

    fn authenticated_store() -> Arc<InMemoryCredentialStore> {
        Arc::new(InMemoryCredentialStore::with_session(
            AuthSession::authenticated("stale".into(), "refresh-token".into(), None),
        ))
    }

    #[tokio::test]
    async fn test_success_rotates_and_persists_access_token() {
        let credentials = authenticated_store();
        let coordinator = coordinator(
            Ok(TransportResponse {
                status: 200,
                body: r#"{"access_token": "fresh"}"#.to_owned(),
            }),
            Arc::clone(&credentials),
        );

        let token = coordinator.refresh().await.expect("refresh succeeds");
        assert_eq!(token, "fresh");

        let session = credentials
            .get()
            .await
            .expect("read")
            .expect("session kept");
        assert_eq!(session.access_token.as_deref(), Some("fresh"));
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-token"));
    }

    #[tokio::test]
    async fn test_accepts_access_alias() {
        let credentials = authenticated_store();
        let coordinator = coordinator(
            Ok(TransportResponse {
                status: 200,
                body: r#"{"access": "fresh"}"#.to_owned(),
            }),
            Arc::clone(&credentials),
        );

        assert_eq!(coordinator.refresh().await.expect("refresh succeeds"), "fresh");
    }

    #[tokio::test]
    async fn test_rejection_clears_session() {
        let credentials = authenticated_store();
        let coordinator = coordinator(
            Ok(TransportResponse {
                status: 401,
                body: r#"{"detail": "token revoked"}"#.to_owned(),
            }),
            Arc::clone(&credentials),
        );

        let err = coordinator.refresh().await.expect_err("refresh fails");
        assert!(matches!(err, RefreshError::Rejected(_)));
        assert!(credentials.get().await.expect("read").is_none());
    }

    #[tokio::test]
    async fn test_anonymous_session_fails_without_network_call() {
        let credentials = Arc::new(InMemoryCredentialStore::new());
        let coordinator = coordinator(
            Err(TransportError::Other("must not be called".to_owned())),
            Arc::clone(&credentials),
        );

        let err = coordinator.refresh().await.expect_err("no session");
        assert!(matches!(err, RefreshError::NoSession));
    }

    #[tokio::test]
    async fn test_network_failure_clears_session() {
        let credentials = authenticated_store();
        let coordinator = coordinator(Err(TransportError::Timeout), Arc::clone(&credentials));

        let err = coordinator.refresh().await.expect_err("refresh fails");
        assert!(matches!(err, RefreshError::Network(_)));
        assert!(credentials.get().await.expect("read").is_none());
    }
}
