//! Server-side cart endpoints.
//!
//! The cart payload is the least disciplined part of the backend: the item
//! list arrives as a bare array, an `items` wrapper, or a paginated
//! `results` wrapper, and each item may embed the product or flatten it
//! into `product_name`/`product_price` fields. The parsing here is
//! deliberately tolerant; anything unresolvable is skipped with a warning
//! rather than failing the fetch.

use serde::Deserialize;
use tracing::{instrument, warn};

use clementine_core::{CartItem, Price, Product, ProductId};

use crate::error::ApiError;
use crate::gateway::{Gateway, Request};

/// One cart row as the backend sends it.
#[derive(Debug, Deserialize)]
struct ServerCartItem {
    #[serde(default)]
    product: Option<Product>,
    #[serde(default)]
    product_id: Option<i64>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    product_price: Option<Price>,
    quantity: u32,
}

impl ServerCartItem {
    fn into_item(self) -> Option<CartItem> {
        if let Some(product) = &self.product {
            return Some(CartItem::for_product(product, self.quantity));
        }

        Some(CartItem {
            product_id: ProductId::new(self.product_id?),
            name: self.product_name.unwrap_or_else(|| "unknown product".to_owned()),
            unit_price: self.product_price.unwrap_or_else(Price::zero),
            quantity: self.quantity,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CartEnvelope {
    Items(Vec<ServerCartItem>),
    Wrapped { items: Vec<ServerCartItem> },
    Paged { results: Vec<ServerCartItem> },
}

impl CartEnvelope {
    fn into_rows(self) -> Vec<ServerCartItem> {
        match self {
            Self::Items(rows) => rows,
            Self::Wrapped { items } => items,
            Self::Paged { results } => results,
        }
    }
}

/// Client for the `/cart/` endpoints.
#[derive(Clone)]
pub struct CartApi {
    gateway: Gateway,
}

impl CartApi {
    #[must_use]
    pub const fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Fetch the server's view of the cart.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors. Individually unresolvable rows are
    /// skipped, not fatal.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Vec<CartItem>, ApiError> {
        let envelope: CartEnvelope = self.gateway.execute(Request::get("/cart/")).await?;

        let rows = envelope.into_rows();
        let total_rows = rows.len();
        let items: Vec<CartItem> = rows
            .into_iter()
            .filter_map(ServerCartItem::into_item)
            .collect();

        if items.len() < total_rows {
            warn!(
                skipped = total_rows - items.len(),
                "cart fetch skipped unresolvable rows"
            );
        }

        Ok(items)
    }

    /// Add a quantity of a product to the server cart.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        self.gateway
            .execute_empty(Request::post(
                "/cart/add/",
                serde_json::json!({ "product_id": product_id, "quantity": quantity }),
            ))
            .await
    }

    /// Set the quantity of a product in the server cart.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        self.gateway
            .execute_empty(Request::put(
                "/cart/update/",
                serde_json::json!({ "product_id": product_id, "quantity": quantity }),
            ))
            .await
    }

    /// Remove a product from the server cart.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: ProductId) -> Result<(), ApiError> {
        self.gateway
            .execute_empty(Request::delete_with_body(
                "/cart/remove/",
                serde_json::json!({ "product_id": product_id }),
            ))
            .await
    }

    /// Empty the server cart.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), ApiError> {
        self.gateway
            .execute_empty(Request::delete("/cart/clear/"))
            .await
    }
}
