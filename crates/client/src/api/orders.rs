//! Order endpoints.

use serde::Deserialize;
use tracing::instrument;

use clementine_core::{Order, OrderDraft, OrderId};

use crate::error::ApiError;
use crate::gateway::{Gateway, Request};

/// Order list envelope: a bare array or a paginated `results` wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum OrderListEnvelope {
    Items(Vec<Order>),
    Paged { results: Vec<Order> },
}

impl OrderListEnvelope {
    fn into_items(self) -> Vec<Order> {
        match self {
            Self::Items(items) => items,
            Self::Paged { results } => results,
        }
    }
}

/// Client for the `/orders/` endpoints.
#[derive(Clone)]
pub struct OrderApi {
    gateway: Gateway,
}

impl OrderApi {
    #[must_use]
    pub const fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// List the current user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Order>, ApiError> {
        let envelope: OrderListEnvelope = self
            .gateway
            .execute(Request::get("/orders/my-orders/"))
            .await?;
        Ok(envelope.into_items())
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown IDs, otherwise normalized gateway
    /// errors.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.gateway
            .execute(Request::get(&format!("/orders/{id}/")))
            .await
    }

    /// Create an order from a priced-out draft.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors, including per-field validation.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: &OrderDraft) -> Result<Order, ApiError> {
        self.gateway
            .execute(Request::post("/orders/", serde_json::to_value(draft)?))
            .await
    }

    /// Cancel an order. The backend enforces the same pending-only policy
    /// the client checks before calling.
    ///
    /// # Errors
    ///
    /// `ApiError::Conflict` when the backend rejects the transition,
    /// otherwise normalized gateway errors.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel(&self, id: &OrderId) -> Result<Order, ApiError> {
        self.gateway
            .execute(Request::put(
                &format!("/orders/{id}/cancel/"),
                serde_json::json!({ "status": "cancelled" }),
            ))
            .await
    }
}
