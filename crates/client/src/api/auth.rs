//! Authentication and profile endpoints.
//!
//! The one place with credential write-through: successful login,
//! registration, and profile responses persist to the credential store so
//! the gateway picks the tokens up on the next request.

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use clementine_core::{AuthSession, CredentialStore, Email, User};

use crate::error::ApiError;
use crate::gateway::{Gateway, Request};

/// Registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterData {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
}

/// Profile patch; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Auth response body. Token field names vary by deployment
/// (`access_token` vs `access`), so both are accepted.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    user: Option<User>,
    #[serde(default, alias = "access")]
    access_token: Option<String>,
    #[serde(default, alias = "refresh")]
    refresh_token: Option<String>,
}

/// Client for `/users/` auth and profile endpoints.
#[derive(Clone)]
pub struct AuthApi {
    gateway: Gateway,
}

impl AuthApi {
    #[must_use]
    pub const fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Log in with email and password.
    ///
    /// On success the session (token pair + user record) is persisted to
    /// the credential store.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a malformed email before any
    /// network traffic, otherwise the gateway's normalized errors.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let email = Email::parse(email)
            .map_err(|e| ApiError::validation_field("email", e.to_string()))?;

        let response: AuthResponse = self
            .gateway
            .execute(Request::post(
                "/users/login/",
                serde_json::json!({ "email": email.as_str(), "password": password }),
            ))
            .await?;

        self.persist(response).await
    }

    /// Register a new account. Persists the session like `login`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a malformed email or mismatched
    /// password confirmation before any network traffic.
    #[instrument(skip(self, data), fields(email = %data.email))]
    pub async fn register(&self, data: RegisterData) -> Result<AuthSession, ApiError> {
        Email::parse(&data.email)
            .map_err(|e| ApiError::validation_field("email", e.to_string()))?;
        if data.password != data.password_confirm {
            return Err(ApiError::validation_field(
                "password_confirm",
                "passwords do not match",
            ));
        }

        let response: AuthResponse = self
            .gateway
            .execute(Request::post(
                "/users/register/",
                serde_json::to_value(&data)?,
            ))
            .await?;

        self.persist(response).await
    }

    /// Log out: revoke the refresh token and clear the local session.
    ///
    /// The local session is cleared even when the revoke call fails - the
    /// user asked to leave, the backend's opinion is secondary.
    ///
    /// # Errors
    ///
    /// Returns the revoke call's error after the local session is gone.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let refresh_token = self
            .gateway
            .credentials()
            .get()
            .await
            .ok()
            .flatten()
            .and_then(|s| s.refresh_token);

        let result = match refresh_token {
            Some(refresh) => {
                self.gateway
                    .execute_empty(Request::post(
                        "/users/logout/",
                        serde_json::json!({ "refresh": refresh }),
                    ))
                    .await
            }
            None => Ok(()),
        };

        if let Err(e) = self.gateway.credentials().clear().await {
            warn!(error = %e, "failed to clear local session on logout");
        }

        result
    }

    /// Fetch the current user and refresh the stored user record.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors; `SessionExpired` when anonymous.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        let user: User = self.gateway.execute(Request::get("/users/me/")).await?;
        self.store_user(&user).await;
        Ok(user)
    }

    /// Patch the current user's profile and refresh the stored record.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors, including per-field validation.
    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, patch: &ProfileUpdate) -> Result<User, ApiError> {
        let user: User = self
            .gateway
            .execute(Request::patch("/users/me/", serde_json::to_value(patch)?))
            .await?;
        self.store_user(&user).await;
        Ok(user)
    }

    /// Change the account password.
    ///
    /// # Errors
    ///
    /// `ApiError::Validation` client-side on mismatched confirmation,
    /// otherwise normalized gateway errors.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        new_password_confirm: &str,
    ) -> Result<(), ApiError> {
        if new_password != new_password_confirm {
            return Err(ApiError::validation_field(
                "new_password_confirm",
                "passwords do not match",
            ));
        }

        self.gateway
            .execute_empty(Request::patch(
                "/users/password/change/",
                serde_json::json!({
                    "old_password": old_password,
                    "new_password": new_password,
                    "new_password_confirm": new_password_confirm,
                }),
            ))
            .await
    }

    /// Persist an auth response as the new session.
    async fn persist(&self, response: AuthResponse) -> Result<AuthSession, ApiError> {
        let (Some(access), Some(refresh)) = (response.access_token, response.refresh_token)
        else {
            return Err(ApiError::Unexpected(
                "auth response did not include a token pair".to_owned(),
            ));
        };

        let session = AuthSession::authenticated(access, refresh, response.user);
        self.gateway.credentials().set(&session).await?;
        Ok(session)
    }

    /// Best-effort user-record write-through; the request already
    /// succeeded, so a storage hiccup only costs staleness.
    async fn store_user(&self, user: &User) {
        let credentials = self.gateway.credentials();
        match credentials.get().await {
            Ok(Some(session)) => {
                if let Err(e) = credentials.set(&session.with_user(user.clone())).await {
                    warn!(error = %e, "failed to store refreshed user record");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to read session for user write-through"),
        }
    }
}
