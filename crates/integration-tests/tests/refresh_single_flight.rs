//! Single-flight refresh coordination across concurrent requests.
//!
//! The invariants under test: N concurrent 401s produce exactly one call
//! to the refresh endpoint; every caller completes uniformly (all with
//! fresh data, or all with `SessionExpired`); and a request that already
//! replayed once never starts a second refresh cycle.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use clementine_client::ApiError;
use clementine_client::http::Method;
use clementine_core::CredentialStore;
use clementine_integration_tests::{
    MockBackend, ScriptedResponse, authenticated_session, test_client,
};

const ME: &str = "/users/me/";
const REFRESH: &str = "/users/refresh/";

fn user_body() -> serde_json::Value {
    json!({ "id": 1, "email": "user@example.com" })
}

/// Two simultaneous 401s; the refresh endpoint answers once, after 50ms.
#[tokio::test]
async fn test_two_concurrent_401s_share_one_refresh() {
    let backend = Arc::new(MockBackend::new());

    // Both requests 401 on their first attempt, then succeed on replay.
    backend.script_n(Method::Get, ME, 401, &json!({}), 2);
    backend.script_n(Method::Get, ME, 200, &user_body(), 2);
    backend.script(
        Method::Post,
        REFRESH,
        ScriptedResponse::ok(json!({ "access_token": "access-1" }))
            .after(Duration::from_millis(50)),
    );

    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));

    let (a, b) = tokio::join!(client.auth().me(), client.auth().me());
    assert!(a.is_ok(), "first caller should succeed: {a:?}");
    assert!(b.is_ok(), "second caller should succeed: {b:?}");

    assert_eq!(backend.hits(Method::Post, REFRESH), 1);

    // Both replays carried the rotated token.
    let replays: Vec<_> = backend
        .requests()
        .into_iter()
        .filter(|r| r.path == ME && r.bearer.as_deref() == Some("access-1"))
        .collect();
    assert_eq!(replays.len(), 2);
}

/// Five concurrent 401s still mean one refresh.
#[tokio::test]
async fn test_many_concurrent_401s_share_one_refresh() {
    let backend = Arc::new(MockBackend::new());

    backend.script_n(Method::Get, ME, 401, &json!({}), 5);
    backend.script_n(Method::Get, ME, 200, &user_body(), 5);
    backend.script(
        Method::Post,
        REFRESH,
        ScriptedResponse::ok(json!({ "access_token": "access-1" }))
            .after(Duration::from_millis(50)),
    );

    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move { client.auth().me().await }));
    }

    for task in tasks {
        let outcome = task.await.expect("task completes");
        assert!(outcome.is_ok(), "every caller should succeed: {outcome:?}");
    }

    assert_eq!(backend.hits(Method::Post, REFRESH), 1);
}

/// A failed refresh rejects every queued waiter and clears the session.
#[tokio::test]
async fn test_refresh_failure_rejects_all_waiters_uniformly() {
    let backend = Arc::new(MockBackend::new());

    backend.script_n(Method::Get, ME, 401, &json!({}), 3);
    backend.script(
        Method::Post,
        REFRESH,
        ScriptedResponse::status(401, json!({ "detail": "token revoked" }))
            .after(Duration::from_millis(50)),
    );

    let (client, credentials) = test_client(Arc::clone(&backend), Some(authenticated_session()));

    let (a, b, c) = tokio::join!(client.auth().me(), client.auth().me(), client.auth().me());
    for outcome in [a, b, c] {
        assert!(
            matches!(outcome, Err(ApiError::SessionExpired)),
            "every caller should see SessionExpired"
        );
    }

    assert_eq!(backend.hits(Method::Post, REFRESH), 1);
    assert!(
        credentials.get().await.expect("readable").is_none(),
        "failed refresh must clear the session"
    );
}

/// A request that 401s again after its replay does not refresh twice.
#[tokio::test]
async fn test_no_second_refresh_after_replayed_401() {
    let backend = Arc::new(MockBackend::new());

    backend.script_n(Method::Get, ME, 401, &json!({}), 2);
    backend.script(
        Method::Post,
        REFRESH,
        ScriptedResponse::ok(json!({ "access_token": "access-1" })),
    );

    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));

    let outcome = client.auth().me().await;
    assert!(matches!(outcome, Err(ApiError::SessionExpired)));
    assert_eq!(backend.hits(Method::Post, REFRESH), 1);
    assert_eq!(backend.hits(Method::Get, ME), 2);
}

/// An anonymous 401 cannot refresh (nothing to exchange) and surfaces as
/// session expiry without any refresh-endpoint traffic.
#[tokio::test]
async fn test_anonymous_401_does_not_hit_refresh_endpoint() {
    let backend = Arc::new(MockBackend::new());
    backend.script(Method::Get, ME, ScriptedResponse::status(401, json!({})));

    let (client, _) = test_client(Arc::clone(&backend), None);

    let outcome = client.auth().me().await;
    assert!(matches!(outcome, Err(ApiError::SessionExpired)));
    assert_eq!(backend.hits(Method::Post, REFRESH), 0);
}

/// After a successful refresh the rotated token is persisted and used by
/// subsequent requests without further refreshes.
#[tokio::test]
async fn test_rotated_token_is_persisted_for_later_requests() {
    let backend = Arc::new(MockBackend::new());

    backend.script(Method::Get, ME, ScriptedResponse::status(401, json!({})));
    backend.script_n(Method::Get, ME, 200, &user_body(), 2);
    backend.script(
        Method::Post,
        REFRESH,
        ScriptedResponse::ok(json!({ "access_token": "access-1" })),
    );

    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));

    client.auth().me().await.expect("refresh and replay succeed");
    client.auth().me().await.expect("second call succeeds directly");

    assert_eq!(backend.hits(Method::Post, REFRESH), 1);
    let last = backend.requests().pop().expect("requests recorded");
    assert_eq!(last.bearer.as_deref(), Some("access-1"));
}
