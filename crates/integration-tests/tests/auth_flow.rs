//! Auth flows: credential write-through on login, tolerant token-field
//! parsing, logout semantics, and fail-closed behavior when the
//! credential store is broken.

use std::sync::Arc;

use serde_json::json;

use clementine_client::api::RegisterData;
use clementine_client::http::{HttpTransport, Method};
use clementine_client::{ApiConfig, ApiError, CommerceClient};
use clementine_core::{CredentialStore, UserId};
use clementine_integration_tests::{
    BrokenCredentialStore, MockBackend, ScriptedResponse, authenticated_session, test_client,
};

fn user_body() -> serde_json::Value {
    json!({ "id": 1, "email": "user@example.com", "first_name": "Ada" })
}

/// Login persists the full session and later requests carry the token.
#[tokio::test]
async fn test_login_writes_session_through() {
    let backend = Arc::new(MockBackend::new());
    backend.script(
        Method::Post,
        "/users/login/",
        ScriptedResponse::ok(json!({
            "user": user_body(),
            "access_token": "access-1",
            "refresh_token": "refresh-1",
        })),
    );
    backend.script(Method::Get, "/users/me/", ScriptedResponse::ok(user_body()));

    let (client, credentials) = test_client(Arc::clone(&backend), None);

    let session = client
        .auth()
        .login("user@example.com", "hunter2!")
        .await
        .expect("login succeeds");
    assert!(session.is_authenticated());
    assert_eq!(session.user.as_ref().map(|u| u.id.clone()), Some(UserId::new("1")));

    let stored = credentials
        .get()
        .await
        .expect("readable")
        .expect("session stored");
    assert_eq!(stored.access_token.as_deref(), Some("access-1"));

    client.auth().me().await.expect("me succeeds");
    let me_request = backend
        .requests()
        .into_iter()
        .find(|r| r.path == "/users/me/")
        .expect("me recorded");
    assert_eq!(me_request.bearer.as_deref(), Some("access-1"));
}

/// Deployments that answer with `access`/`refresh` instead of
/// `access_token`/`refresh_token` still log in.
#[tokio::test]
async fn test_login_accepts_short_token_keys() {
    let backend = Arc::new(MockBackend::new());
    backend.script(
        Method::Post,
        "/users/login/",
        ScriptedResponse::ok(json!({ "access": "a", "refresh": "r" })),
    );

    let (client, _) = test_client(Arc::clone(&backend), None);
    let session = client
        .auth()
        .login("user@example.com", "hunter2!")
        .await
        .expect("login succeeds");
    assert!(session.is_authenticated());
}

/// A token-less auth response is an error, not a half-written session.
#[tokio::test]
async fn test_login_without_tokens_fails() {
    let backend = Arc::new(MockBackend::new());
    backend.script(
        Method::Post,
        "/users/login/",
        ScriptedResponse::ok(json!({ "user": user_body() })),
    );

    let (client, credentials) = test_client(Arc::clone(&backend), None);
    let outcome = client.auth().login("user@example.com", "hunter2!").await;

    assert!(matches!(outcome, Err(ApiError::Unexpected(_))));
    assert!(credentials.get().await.expect("readable").is_none());
}

/// A malformed email never reaches the network.
#[tokio::test]
async fn test_login_validates_email_locally() {
    let backend = Arc::new(MockBackend::new());
    let (client, _) = test_client(Arc::clone(&backend), None);

    let outcome = client.auth().login("not-an-email", "hunter2!").await;
    assert!(matches!(outcome, Err(ApiError::Validation { .. })));
    assert!(backend.requests().is_empty());
}

/// Registration surfaces the backend's per-field rejections.
#[tokio::test]
async fn test_register_surfaces_field_errors() {
    let backend = Arc::new(MockBackend::new());
    backend.script(
        Method::Post,
        "/users/register/",
        ScriptedResponse::status(400, json!({ "email": ["already registered"] })),
    );

    let (client, _) = test_client(Arc::clone(&backend), None);
    let outcome = client
        .auth()
        .register(RegisterData {
            email: "user@example.com".to_owned(),
            password: "hunter2!".to_owned(),
            password_confirm: "hunter2!".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
        })
        .await;

    match outcome {
        Err(ApiError::Validation { field_errors, .. }) => {
            assert_eq!(
                field_errors.get("email"),
                Some(&vec!["already registered".to_owned()])
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

/// Logout clears the local session even when the revoke call fails.
#[tokio::test]
async fn test_logout_clears_session_despite_revoke_failure() {
    let backend = Arc::new(MockBackend::new());
    backend.script(Method::Post, "/users/logout/", ScriptedResponse::network_error());

    let (client, credentials) = test_client(Arc::clone(&backend), Some(authenticated_session()));

    let outcome = client.auth().logout().await;
    assert!(outcome.is_err(), "revoke failure propagates");
    assert!(
        credentials.get().await.expect("readable").is_none(),
        "local session cleared regardless"
    );
}

/// A broken credential store fails closed: requests go out anonymously.
#[tokio::test]
async fn test_broken_credential_store_fails_closed_to_anonymous() {
    let backend = Arc::new(MockBackend::new());
    backend.script(
        Method::Get,
        "/products/products/",
        ScriptedResponse::ok(json!([])),
    );

    let config = ApiConfig::new("https://api.test").expect("config");
    let client = CommerceClient::with_parts(
        &config,
        Arc::clone(&backend) as Arc<dyn HttpTransport>,
        Arc::new(BrokenCredentialStore),
    );

    client.catalog().products().await.expect("anonymous catalog read");
    assert!(
        backend
            .requests()
            .first()
            .is_some_and(|r| r.bearer.is_none()),
        "no bearer attached when credentials are unreadable"
    );
    assert!(!client.is_authenticated().await);
}
