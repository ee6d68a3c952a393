//! Optimistic address store.
//!
//! Addresses are identity-bearing: the backend must own a created address,
//! so a failed create rolls the optimistic entry back and surfaces the
//! error. Updates keep the locally applied patch on failure (last local
//! write wins until the next fetch); removals are offline-tolerant.
//!
//! The "exactly one default" invariant is enforced locally in single
//! locked passes; remote confirmation is best-effort and `fetch()` is the
//! reconciliation path.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{instrument, warn};

use clementine_core::{Address, AddressDraft, AddressId};

use crate::api::{AddressApi, AddressUpdate};
use crate::error::ApiError;

use super::{DefaultFlagged, StorePolicy, promote_default, push_with_default, remove_promoting, settle};

impl DefaultFlagged for Address {
    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, value: bool) {
        self.is_default = value;
    }
}

/// Optimistic address collection. Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct AddressStore {
    inner: Arc<AddressStoreInner>,
}

struct AddressStoreInner {
    api: AddressApi,
    policy: StorePolicy,
    items: Mutex<Vec<Address>>,
}

impl AddressStore {
    #[must_use]
    pub fn new(api: AddressApi) -> Self {
        Self {
            inner: Arc::new(AddressStoreInner {
                api,
                policy: StorePolicy::addresses(),
                items: Mutex::new(Vec::new()),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current addresses, in insertion order.
    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        self.lock().clone()
    }

    /// The default address, if the collection is non-empty.
    #[must_use]
    pub fn default_address(&self) -> Option<Address> {
        self.lock().iter().find(|a| a.is_default).cloned()
    }

    /// Look up one address.
    #[must_use]
    pub fn get(&self, id: &AddressId) -> Option<Address> {
        self.lock().iter().find(|a| &a.id == id).cloned()
    }

    // =========================================================================
    // Mutations (local first, then reconcile)
    // =========================================================================

    /// Add an address optimistically under a placeholder ID; the server
    /// entity replaces it when the create call returns.
    ///
    /// # Errors
    ///
    /// Any create failure rolls the optimistic entry back and surfaces
    /// (strict add policy).
    #[instrument(skip(self, draft))]
    pub async fn add(&self, draft: AddressDraft) -> Result<Address, ApiError> {
        let local_id = AddressId::local();
        {
            let mut items = self.lock();
            push_with_default(&mut items, Address::from_draft(local_id.clone(), draft.clone()));
        }

        match self.inner.api.create(&draft).await {
            Ok(created) => Ok(self.confirm_add(&local_id, created)),
            Err(e) if self.inner.policy.add.absorbs(&e) => {
                warn!(error = %e, "offline-tolerant create kept locally");
                Ok(self.get(&local_id).unwrap_or_else(|| {
                    Address::from_draft(local_id.clone(), draft)
                }))
            }
            Err(e) => {
                let mut items = self.lock();
                remove_promoting(&mut items, local_id.as_str());
                Err(e)
            }
        }
    }

    /// Patch an address locally, then reconcile.
    ///
    /// A failed reconciliation surfaces but the local patch is retained -
    /// last local write wins until the next fetch. The default flag is
    /// not patchable here; use [`AddressStore::set_default`].
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown IDs, otherwise surfaced
    /// reconciliation failures.
    #[instrument(skip(self, patch), fields(address_id = %id))]
    pub async fn update(&self, id: &AddressId, patch: AddressUpdate) -> Result<(), ApiError> {
        {
            let mut items = self.lock();
            let Some(address) = items.iter_mut().find(|a| &a.id == id) else {
                return Err(ApiError::NotFound(format!("no address {id}")));
            };
            patch.apply_to(address);
        }

        if id.is_local() {
            // Not confirmed by the backend yet; nothing to reconcile with.
            warn!(address_id = %id, "updated an unconfirmed address, skipping reconciliation");
            return Ok(());
        }

        let outcome = self.inner.api.update(id, &patch).await.map(drop);
        settle(self.inner.policy.update, "addresses.update", outcome)
    }

    /// Remove an address locally, then reconcile (offline-tolerant).
    ///
    /// Removing the default promotes the first survivor so the invariant
    /// holds.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown IDs; reconciliation network
    /// failures are swallowed.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn remove(&self, id: &AddressId) -> Result<(), ApiError> {
        {
            let mut items = self.lock();
            if remove_promoting(&mut items, id.as_str()).is_none() {
                return Err(ApiError::NotFound(format!("no address {id}")));
            }
        }

        if id.is_local() {
            return Ok(());
        }

        let outcome = self.inner.api.delete(id).await;
        settle(self.inner.policy.remove, "addresses.remove", outcome)
    }

    /// Make one address the default.
    ///
    /// Both flags flip in a single locked pass, so no caller ever observes
    /// two defaults or (with a non-empty collection) zero. Remotely this
    /// is two calls: the demotion of the previous holder is best-effort
    /// (a failure is logged and the flow proceeds); the promotion of the
    /// target follows the strict update policy.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown IDs; a failed remote promotion
    /// surfaces while local state keeps the new default.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn set_default(&self, id: &AddressId) -> Result<(), ApiError> {
        let previous = {
            let mut items = self.lock();
            match promote_default(&mut items, id.as_str()) {
                Ok(previous) => previous,
                Err(_) => return Err(ApiError::NotFound(format!("no address {id}"))),
            }
        };

        if let Some(previous) = previous {
            let previous_id = AddressId::new(previous);
            if !previous_id.is_local()
                && let Err(e) = self
                    .inner
                    .api
                    .update(&previous_id, &AddressUpdate::default_flag(false))
                    .await
            {
                // The local invariant already holds; a refetch reconciles
                // whatever the backend believes.
                warn!(address_id = %previous_id, error = %e, "failed to demote previous default remotely");
            }
        }

        if id.is_local() {
            return Ok(());
        }

        let outcome = self
            .inner
            .api
            .update(id, &AddressUpdate::default_flag(true))
            .await
            .map(drop);
        settle(self.inner.policy.update, "addresses.set_default", outcome)
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

    /// Swap the optimistic entry for the server entity, preserving the
    /// locally decided default flag until the next fetch.
    fn confirm_add(&self, local_id: &AddressId, mut created: Address) -> Address {
        let mut items = self.lock();
        if let Some(position) = items.iter().position(|a| &a.id == local_id) {
            created.is_default = items.get(position).is_some_and(|a| a.is_default);
            if let Some(slot) = items.get_mut(position) {
                *slot = created.clone();
            }
        }
        created
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Address>> {
        self.inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AddressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressStore")
            .field("count", &self.lock().len())
            .finish()
    }
}
