//! Cart-to-order orchestration.
//!
//! From the client's perspective order creation is atomic: either the
//! order exists and the cart is empty, or the create call failed and the
//! cart is bit-identical to before the attempt. The orchestrator works on
//! a snapshot and only touches the live cart after the backend has
//! confirmed the order.
//!
//! Collaborators (cart store, order store, order API) are injected at
//! construction - the orchestrator never reaches into ambient state.

use tracing::{instrument, warn};

use clementine_core::{AddressId, CardId, CartItem, Order, OrderDraft, OrderLineDraft};

use crate::api::OrderApi;
use crate::error::ApiError;
use crate::stores::{CartStore, OrderStore};

/// Turns the current cart into a persisted order.
#[derive(Clone)]
pub struct CheckoutService {
    api: OrderApi,
    cart: CartStore,
    orders: OrderStore,
}

impl CheckoutService {
    #[must_use]
    pub const fn new(api: OrderApi, cart: CartStore, orders: OrderStore) -> Self {
        Self { api, cart, orders }
    }

    /// Place an order from the current cart.
    ///
    /// Preconditions: a non-empty cart, a selected address, a selected
    /// card. On success the cart is cleared unconditionally (locally at
    /// once, server-side best-effort) and the order lands in the order
    /// store. On failure the cart is untouched.
    ///
    /// # Errors
    ///
    /// `ApiError::Validation` for an empty cart before any network
    /// traffic; otherwise the create call's normalized error.
    #[instrument(skip(self), fields(address_id = %shipping_address, card_id = %payment_method))]
    pub async fn place_order(
        &self,
        shipping_address: AddressId,
        payment_method: CardId,
        notes: Option<String>,
    ) -> Result<Order, ApiError> {
        let snapshot = self.cart.snapshot();
        if snapshot.is_empty() {
            return Err(ApiError::validation_field("items", "cart is empty"));
        }

        let draft = OrderDraft {
            shipping_address,
            billing_address: None,
            payment_method,
            notes,
            items: snapshot.items.iter().map(line_draft).collect(),
            total_amount: snapshot.total,
        };

        // The cart is not touched until the backend confirms the order.
        let order = self.api.create(&draft).await?;

        // Unconditional from here: the local cart empties immediately, and
        // a failed server-side clear only costs a later fetch.
        if let Err(e) = self.cart.clear().await {
            warn!(error = %e, "server cart clear failed after order creation");
        }

        self.orders.insert(order.clone());
        Ok(order)
    }
}

/// Price one cart line for the create payload: the backend expects the
/// line total, not the unit price.
fn line_draft(item: &CartItem) -> OrderLineDraft {
    OrderLineDraft {
        product_id: item.product_id,
        quantity: item.quantity,
        price: item.line_total(),
    }
}
