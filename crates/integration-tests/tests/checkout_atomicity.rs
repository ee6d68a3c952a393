//! Checkout: order creation is atomic from the client's perspective, and
//! order cancellation honors the pending-only lifecycle policy.

use std::sync::Arc;

use serde_json::json;

use clementine_client::ApiError;
use clementine_client::http::Method;
use clementine_core::{AddressId, CardId, OrderId, OrderStatus, Price, Product};
use clementine_integration_tests::{
    MockBackend, ScriptedResponse, authenticated_session, test_client,
};

const ORDERS: &str = "/orders/";

fn product(id: i64, price: i64) -> Product {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("product-{id}"),
        "price": price.to_string(),
        "stock": 10,
        "rating_count": 0,
    }))
    .expect("product fixture parses")
}

fn order_body(id: &str, status: &str, total: &str) -> serde_json::Value {
    json!({
        "id": id,
        "order_number": format!("ORD-{id}"),
        "status": status,
        "total_amount": total,
        "items": [],
    })
}

/// Success path: the order exists, the cart is empty, the order store has
/// the new order at the front.
#[tokio::test]
async fn test_successful_checkout_clears_cart() {
    let backend = Arc::new(MockBackend::new());
    backend.script_n(Method::Post, "/cart/add/", 200, &json!({}), 2);
    backend.script(Method::Post, ORDERS, ScriptedResponse::ok(order_body("o1", "pending", "230.00")));
    backend.script(Method::Delete, "/cart/clear/", ScriptedResponse::ok(json!({})));

    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));

    client.cart().add(&product(1, 100), 2).await.expect("add p1");
    client.cart().add(&product(2, 30), 1).await.expect("add p2");

    let order = client
        .checkout()
        .place_order(AddressId::new("a1"), CardId::new("c1"), None)
        .await
        .expect("checkout succeeds");

    assert_eq!(order.status, OrderStatus::Pending);
    assert!(client.cart().items().is_empty(), "cart cleared after checkout");
    assert_eq!(client.orders().orders().first().map(|o| o.id.clone()), Some(order.id));

    // The create payload carried the snapshot: line totals and the sum.
    let create = backend
        .requests()
        .into_iter()
        .find(|r| r.path == ORDERS)
        .expect("create call recorded");
    let body = create.body.expect("create body");
    assert_eq!(body["total_amount"], "230");
    assert_eq!(body["shipping_address"], "a1");
    assert_eq!(body["payment_method"], "c1");
    assert_eq!(body["items"][0]["price"], "200");
}

/// Failure path: the cart is bit-identical to before the attempt and no
/// order appears anywhere.
#[tokio::test]
async fn test_failed_checkout_leaves_cart_untouched() {
    let backend = Arc::new(MockBackend::new());
    backend.script_n(Method::Post, "/cart/add/", 200, &json!({}), 2);
    backend.script(
        Method::Post,
        ORDERS,
        ScriptedResponse::status(500, json!({ "detail": "order pipeline down" })),
    );

    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));

    client.cart().add(&product(1, 100), 2).await.expect("add p1");
    client.cart().add(&product(2, 30), 1).await.expect("add p2");
    let before = client.cart().items();

    let outcome = client
        .checkout()
        .place_order(AddressId::new("a1"), CardId::new("c1"), None)
        .await;

    assert!(matches!(outcome, Err(ApiError::Server { status: 500, .. })));
    assert_eq!(client.cart().items(), before, "cart bit-identical after failure");
    assert_eq!(client.cart().total(), Price::from(230));
    assert!(client.orders().orders().is_empty());
    assert_eq!(backend.hits(Method::Delete, "/cart/clear/"), 0);
}

/// An empty cart fails the precondition before any network traffic.
#[tokio::test]
async fn test_empty_cart_cannot_checkout() {
    let backend = Arc::new(MockBackend::new());
    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));

    let outcome = client
        .checkout()
        .place_order(AddressId::new("a1"), CardId::new("c1"), None)
        .await;

    assert!(matches!(outcome, Err(ApiError::Validation { .. })));
    assert_eq!(backend.hits(Method::Post, ORDERS), 0);
}

/// The cart clears even when the server-side cart clear fails; the order
/// already exists and local truth moves on.
#[tokio::test]
async fn test_checkout_survives_failed_server_cart_clear() {
    let backend = Arc::new(MockBackend::new());
    backend.script(Method::Post, "/cart/add/", ScriptedResponse::ok(json!({})));
    backend.script(Method::Post, ORDERS, ScriptedResponse::ok(order_body("o1", "pending", "200.00")));
    backend.script(Method::Delete, "/cart/clear/", ScriptedResponse::network_error());

    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));
    client.cart().add(&product(1, 100), 2).await.expect("add");

    client
        .checkout()
        .place_order(AddressId::new("a1"), CardId::new("c1"), None)
        .await
        .expect("checkout succeeds despite clear failure");

    assert!(client.cart().items().is_empty());
}

// =============================================================================
// Cancellation policy
// =============================================================================

/// Pending orders cancel; the local status flips and the backend is told.
#[tokio::test]
async fn test_cancel_pending_order() {
    let backend = Arc::new(MockBackend::new());
    backend.script(
        Method::Get,
        "/orders/my-orders/",
        ScriptedResponse::ok(json!([order_body("o1", "pending", "100.00")])),
    );
    backend.script(
        Method::Put,
        "/orders/o1/cancel/",
        ScriptedResponse::ok(order_body("o1", "cancelled", "100.00")),
    );

    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));
    client.orders().fetch().await.expect("fetch orders");

    client
        .orders()
        .cancel(&OrderId::new("o1"))
        .await
        .expect("cancel succeeds");

    assert_eq!(
        client.orders().get(&OrderId::new("o1")).map(|o| o.status),
        Some(OrderStatus::Cancelled)
    );
    assert_eq!(backend.hits(Method::Put, "/orders/o1/cancel/"), 1);
}

/// Anything past pending is rejected client-side, with no network call.
#[tokio::test]
async fn test_cancel_shipped_order_is_rejected_locally() {
    let backend = Arc::new(MockBackend::new());
    backend.script(
        Method::Get,
        "/orders/my-orders/",
        ScriptedResponse::ok(json!([order_body("o2", "shipped", "50.00")])),
    );

    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));
    client.orders().fetch().await.expect("fetch orders");

    let outcome = client.orders().cancel(&OrderId::new("o2")).await;
    assert!(matches!(outcome, Err(ApiError::Conflict(_))));
    assert_eq!(
        client.orders().get(&OrderId::new("o2")).map(|o| o.status),
        Some(OrderStatus::Shipped),
        "status untouched"
    );
    assert_eq!(backend.hits(Method::Put, "/orders/o2/cancel/"), 0);
}

/// A failed cancel reconciliation surfaces but the local transition is
/// retained (strict update policy), with fetch as the repair path.
#[tokio::test]
async fn test_cancel_retains_local_transition_on_failure() {
    let backend = Arc::new(MockBackend::new());
    backend.script(
        Method::Get,
        "/orders/my-orders/",
        ScriptedResponse::ok(json!([order_body("o1", "pending", "100.00")])),
    );
    backend.script(Method::Put, "/orders/o1/cancel/", ScriptedResponse::network_error());

    let (client, _) = test_client(Arc::clone(&backend), Some(authenticated_session()));
    client.orders().fetch().await.expect("fetch orders");

    let outcome = client.orders().cancel(&OrderId::new("o1")).await;
    assert!(matches!(outcome, Err(ApiError::Network(_))));
    assert_eq!(
        client.orders().get(&OrderId::new("o1")).map(|o| o.status),
        Some(OrderStatus::Cancelled),
        "local transition retained until fetch"
    );
}
