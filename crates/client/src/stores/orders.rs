//! Order store.
//!
//! Orders are created by the checkout service ([`crate::checkout`]) and
//! inserted here; the only user-initiated mutation is cancellation, which
//! follows the strict update policy: the status flips locally first, a
//! reconciliation failure surfaces but the local transition is retained
//! until the next fetch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::instrument;

use clementine_core::{Order, OrderId, OrderStatus};

use crate::api::OrderApi;
use crate::error::ApiError;

use super::{StorePolicy, settle};

/// Local order collection, newest first. Cheaply cloneable; clones share
/// state.
#[derive(Clone)]
pub struct OrderStore {
    inner: Arc<OrderStoreInner>,
}

struct OrderStoreInner {
    api: OrderApi,
    policy: StorePolicy,
    items: Mutex<Vec<Order>>,
}

impl OrderStore {
    #[must_use]
    pub fn new(api: OrderApi) -> Self {
        Self {
            inner: Arc::new(OrderStoreInner {
                api,
                policy: StorePolicy::orders(),
                items: Mutex::new(Vec::new()),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current orders, newest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().clone()
    }

    /// Look up one order.
    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<Order> {
        self.lock().iter().find(|o| &o.id == id).cloned()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Prepend a freshly created order (checkout's insert path).
    pub(crate) fn insert(&self, order: Order) {
        self.lock().insert(0, order);
    }

    /// Cancel an order.
    ///
    /// The pending-only policy is enforced before any mutation or network
    /// traffic; the backend enforces the same rule server-side. On policy
    /// pass the status flips locally, then reconciles.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown IDs, `ApiError::Conflict` when
    /// the order is past `pending`; a reconciliation failure surfaces with
    /// the local cancellation retained.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel(&self, id: &OrderId) -> Result<(), ApiError> {
        {
            let mut items = self.lock();
            let Some(order) = items.iter_mut().find(|o| &o.id == id) else {
                return Err(ApiError::NotFound(format!("no order {id}")));
            };

            if !order.status.is_cancellable() {
                return Err(ApiError::Conflict(format!(
                    "order {id} cannot be cancelled from status {}",
                    order.status
                )));
            }

            order.status = OrderStatus::Cancelled;
        }

        let outcome = match self.inner.api.cancel(id).await {
            Ok(confirmed) => {
                // Adopt the server's view of the cancelled order.
                let mut items = self.lock();
                if let Some(order) = items.iter_mut().find(|o| &o.id == id) {
                    *order = confirmed;
                }
                Ok(())
            }
            Err(e) => Err(e),
        };

        settle(self.inner.policy.update, "orders.cancel", outcome)
    }

    /// Replace the local collection with the server's view.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors; local state is untouched on failure.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<(), ApiError> {
        let items = self.inner.api.list().await?;
        *self.lock() = items;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Order>> {
        self.inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore")
            .field("count", &self.lock().len())
            .finish()
    }
}
