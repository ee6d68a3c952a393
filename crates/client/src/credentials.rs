//! Credential store implementations.
//!
//! The [`CredentialStore`] trait (defined in `clementine-core`) is an
//! opaque blob mover: it persists and retrieves the [`AuthSession`] without
//! inspecting token contents. Two implementations:
//!
//! - [`InMemoryCredentialStore`] - process-local, used in tests and by
//!   embedders that manage persistence themselves
//! - [`FileCredentialStore`] - a JSON document on disk, the durable
//!   default for the CLI

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use clementine_core::{AuthSession, CredentialError, CredentialStore};

// =============================================================================
// InMemoryCredentialStore
// =============================================================================

/// Process-local session storage.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    session: RwLock<Option<AuthSession>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a session (test convenience).
    #[must_use]
    pub fn with_session(session: AuthSession) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self) -> Result<Option<AuthSession>, CredentialError> {
        Ok(self
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn set(&self, session: &AuthSession) -> Result<(), CredentialError> {
        *self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        *self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// =============================================================================
// FileCredentialStore
// =============================================================================

/// Durable session storage as a JSON document on disk.
///
/// A missing file reads as "no session"; a corrupt file surfaces as
/// [`CredentialError::Corrupt`] so the caller can fail closed to anonymous.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Result<Option<AuthSession>, CredentialError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CredentialError::Io(e.to_string())),
        };

        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|e| CredentialError::Corrupt(e.to_string()))
    }

    async fn set(&self, session: &AuthSession) -> Result<(), CredentialError> {
        let raw = serde_json::to_vec_pretty(session)
            .map_err(|e| CredentialError::Corrupt(e.to_string()))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CredentialError::Io(e.to_string()))?;
        }

        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| CredentialError::Io(e.to_string()))
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CredentialError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AuthSession {
        AuthSession::authenticated("access".into(), "refresh".into(), None)
    }

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let store = InMemoryCredentialStore::new();
        assert!(store.get().await.expect("read").is_none());

        store.set(&session()).await.expect("write");
        let loaded = store.get().await.expect("read").expect("session present");
        assert!(loaded.is_authenticated());

        store.clear().await.expect("clear");
        assert!(store.get().await.expect("read").is_none());
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let path = std::env::temp_dir().join(format!("clementine-creds-{}.json", uuid::Uuid::new_v4()));
        let store = FileCredentialStore::new(&path);

        assert!(store.get().await.expect("missing file is fine").is_none());

        store.set(&session()).await.expect("write");
        let loaded = store.get().await.expect("read").expect("session present");
        assert_eq!(loaded.access_token.as_deref(), Some("access"));

        store.clear().await.expect("clear");
        assert!(store.get().await.expect("read").is_none());
        // clearing twice is a no-op
        store.clear().await.expect("idempotent clear");
    }

    #[tokio::test]
    async fn test_file_store_corrupt_payload() {
        let path = std::env::temp_dir().join(format!("clementine-creds-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, b"not json").await.expect("seed file");

        let store = FileCredentialStore::new(&path);
        let err = store.get().await.expect_err("corrupt file must error");
        assert!(matches!(err, CredentialError::Corrupt(_)));

        tokio::fs::remove_file(&path).await.expect("cleanup");
    }
}
