//! Auth session state and the credential persistence boundary.
//!
//! The [`CredentialStore`] trait is defined here (boundary-safe, no I/O in
//! this crate) and implemented in the client crate; the gateway and the
//! refresh coordinator read and write sessions exclusively through it,
//! holding no token copies of their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::user::User;

/// The persisted auth session: token pair plus the last-known user record.
///
/// A session is never partially valid - either both tokens are present
/// (authenticated) or the session is anonymous. `Debug` redacts token
/// material.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthSession {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
}

impl AuthSession {
    /// Build an authenticated session from a fresh token pair.
    #[must_use]
    pub const fn authenticated(
        access_token: String,
        refresh_token: String,
        user: Option<User>,
    ) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            user,
        }
    }

    /// Both tokens present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }

    /// Copy of this session with the access token replaced (refresh path).
    #[must_use]
    pub fn with_access_token(&self, access_token: String) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: self.refresh_token.clone(),
            user: self.user.clone(),
        }
    }

    /// Copy of this session with the user record replaced (profile fetch).
    #[must_use]
    pub fn with_user(&self, user: User) -> Self {
        Self {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            user: Some(user),
        }
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("user", &self.user)
            .finish()
    }
}

/// Errors from the credential persistence layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    /// Underlying storage read/write failed.
    #[error("credential storage i/o: {0}")]
    Io(String),
    /// Stored data could not be decoded.
    #[error("credential storage corrupt: {0}")]
    Corrupt(String),
}

/// Durable session persistence backend.
///
/// An opaque blob mover: no validation of token contents happens here.
/// Callers treat a read failure the same as "no credentials" where
/// fail-closed behavior is required (the gateway does).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the current session, if any.
    async fn get(&self) -> Result<Option<AuthSession>, CredentialError>;

    /// Persist the session, replacing any previous one.
    async fn set(&self, session: &AuthSession) -> Result<(), CredentialError>;

    /// Remove the session entirely (logout semantics).
    async fn clear(&self) -> Result<(), CredentialError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sessions_are_anonymous() {
        let missing_refresh = AuthSession {
            access_token: Some("a".to_owned()),
            refresh_token: None,
            user: None,
        };
        assert!(!missing_refresh.is_authenticated());
        assert!(!AuthSession::default().is_authenticated());
        assert!(
            AuthSession::authenticated("a".into(), "r".into(), None).is_authenticated()
        );
    }

    #[test]
    fn test_with_access_token_keeps_refresh_token() {
        let session = AuthSession::authenticated("old".into(), "r".into(), None);
        let rotated = session.with_access_token("new".into());
        assert_eq!(rotated.access_token.as_deref(), Some("new"));
        assert_eq!(rotated.refresh_token.as_deref(), Some("r"));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let session = AuthSession::authenticated("secret-access".into(), "secret-refresh".into(), None);
        let debug = format!("{session:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }
}
