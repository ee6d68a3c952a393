//! Optimistic cart store.
//!
//! The cart is the fully offline-tolerant store: every mutation lands
//! locally first and a network failure during reconciliation is logged and
//! swallowed. The derived `total` is recomputed from the items on every
//! read, so it can never drift from them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::instrument;

use clementine_core::{CartItem, CartSnapshot, Price, Product, ProductId, cart::total_of};

use crate::api::CartApi;
use crate::error::ApiError;

use super::{StorePolicy, settle};

/// Optimistic cart state. Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    api: CartApi,
    policy: StorePolicy,
    items: Mutex<Vec<CartItem>>,
}

impl CartStore {
    #[must_use]
    pub fn new(api: CartApi) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                api,
                policy: StorePolicy::cart(),
                items: Mutex::new(Vec::new()),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current items, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().clone()
    }

    /// Derived total: sum of line totals, always consistent with `items`.
    #[must_use]
    pub fn total(&self) -> Price {
        total_of(&self.lock())
    }

    /// Total unit count across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lock().iter().map(|item| item.quantity).sum()
    }

    /// Immutable snapshot of items and total, for checkout.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::of(self.items())
    }

    // =========================================================================
    // Mutations (local first, then reconcile)
    // =========================================================================

    /// Add a quantity of a product; existing lines merge by product.
    ///
    /// # Errors
    ///
    /// `ApiError::Validation` for a zero quantity; reconciliation network
    /// failures are swallowed per the cart policy.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product, quantity: u32) -> Result<(), ApiError> {
        if quantity == 0 {
            return Err(ApiError::validation_field(
                "quantity",
                "quantity must be positive",
            ));
        }

        {
            let mut items = self.lock();
            if let Some(line) = items.iter_mut().find(|i| i.product_id == product.id) {
                line.quantity += quantity;
            } else {
                items.push(CartItem::for_product(product, quantity));
            }
        }

        let outcome = self.inner.api.add(product.id, quantity).await;
        settle(self.inner.policy.add, "cart.add", outcome)
    }

    /// Set a line's quantity; 0 removes the line.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` when no line references the product;
    /// reconciliation network failures are swallowed per the cart policy.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        {
            let mut items = self.lock();
            let Some(position) = items.iter().position(|i| i.product_id == product_id) else {
                return Err(ApiError::NotFound(format!(
                    "no cart line for product {product_id}"
                )));
            };

            if quantity == 0 {
                items.remove(position);
            } else if let Some(line) = items.get_mut(position) {
                line.quantity = quantity;
            }
        }

        let outcome = if quantity == 0 {
            self.inner.api.remove(product_id).await
        } else {
            self.inner.api.update(product_id, quantity).await
        };
        settle(self.inner.policy.update, "cart.update_quantity", outcome)
    }

    /// Remove a line. Removing an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Reconciliation network failures are swallowed per the cart policy.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: ProductId) -> Result<(), ApiError> {
        let was_present = {
            let mut items = self.lock();
            let before = items.len();
            items.retain(|i| i.product_id != product_id);
            items.len() < before
        };

        if !was_present {
            return Ok(());
        }

        let outcome = self.inner.api.remove(product_id).await;
        settle(self.inner.policy.remove, "cart.remove", outcome)
    }

    /// Empty the cart locally and best-effort on the server.
    ///
    /// The local cart is empty when this returns, regardless of the
    /// server call's outcome.
    ///
    /// # Errors
    ///
    /// Reconciliation network failures are swallowed per the cart policy.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), ApiError> {
        self.lock().clear();

        let outcome = self.inner.api.clear().await;
        settle(self.inner.policy.remove, "cart.clear", outcome)
    }

    /// Replace the local cart with the server's view - the one
    /// divergence-repair path.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors; local state is untouched on failure.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<(), ApiError> {
        let items = self.inner.api.fetch().await?;
        *self.lock() = items;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CartItem>> {
        self.inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items = self.lock();
        f.debug_struct("CartStore")
            .field("lines", &items.len())
            .field("total", &total_of(&items))
            .finish()
    }
}
