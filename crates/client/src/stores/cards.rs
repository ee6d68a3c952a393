//! Optimistic payment-card store.
//!
//! The backend is authoritative for billing, so every card operation is
//! strict: failures surface to the caller. Mutations still apply locally
//! first - the UI reflects them immediately - and a failed update or
//! removal retains the local state until the next fetch reconciles it.
//!
//! The optimistic entry for a create holds only the masked card number;
//! the full PAN exists solely in the create payload.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{instrument, warn};

use clementine_core::{CardDraft, CardId, PaymentCard};

use crate::api::{CardApi, CardUpdate};
use crate::error::ApiError;

use super::{DefaultFlagged, StorePolicy, promote_default, push_with_default, remove_promoting, settle};

impl DefaultFlagged for PaymentCard {
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

/// Optimistic card collection. Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct CardStore {
    inner: Arc<CardStoreInner>,
}

struct CardStoreInner {
    api: CardApi,
    policy: StorePolicy,
    items: Mutex<Vec<PaymentCard>>,
}

impl CardStore {
    #[must_use]
    pub fn new(api: CardApi) -> Self {
        Self {
            inner: Arc::new(CardStoreInner {
                api,
                policy: StorePolicy::cards(),
                items: Mutex::new(Vec::new()),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current cards, in insertion order.
    #[must_use]
    pub fn cards(&self) -> Vec<PaymentCard> {
        self.lock().clone()
    }

    /// The default card, if the collection is non-empty.
    #[must_use]
    pub fn default_card(&self) -> Option<PaymentCard> {
        self.lock().iter().find(|c| c.is_default).cloned()
    }

    /// Look up one card.
    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<PaymentCard> {
        self.lock().iter().find(|c| &c.id == id).cloned()
    }

    // =========================================================================
    // Mutations (local first, then reconcile)
    // =========================================================================

    /// Register a card optimistically (masked) under a placeholder ID; the
    /// server entity replaces it when the create call returns.
    ///
    /// # Errors
    ///
    /// Any create failure rolls the optimistic entry back and surfaces
    /// (strict add policy).
    #[instrument(skip(self, draft))]
    pub async fn add(&self, draft: CardDraft) -> Result<PaymentCard, ApiError> {
        let local_id = CardId::local();
        {
            let mut items = self.lock();
            push_with_default(&mut items, PaymentCard::from_draft(local_id.clone(), &draft));
        }

        match self.inner.api.create(&draft).await {
            Ok(created) => Ok(self.confirm_add(&local_id, created)),
            Err(e) if self.inner.policy.add.absorbs(&e) => {
                warn!(error = %e, "offline-tolerant create kept locally");
                Ok(self
                    .get(&local_id)
                    .unwrap_or_else(|| PaymentCard::from_draft(local_id.clone(), &draft)))
            }
            Err(e) => {
                let mut items = self.lock();
                remove_promoting(&mut items, local_id.as_str());
                Err(e)
            }
        }
    }

    /// Patch a card locally, then reconcile (strict: failures surface,
    /// local patch retained). The default flag is not patchable here; use
    /// [`CardStore::set_default`].
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown IDs, otherwise surfaced
    /// reconciliation failures.
    #[instrument(skip(self, patch), fields(card_id = %id))]
    pub async fn update(&self, id: &CardId, patch: CardUpdate) -> Result<(), ApiError> {
        {
            let mut items = self.lock();
            let Some(card) = items.iter_mut().find(|c| &c.id == id) else {
                return Err(ApiError::NotFound(format!("no card {id}")));
            };
            patch.apply_to(card);
        }

        if id.is_local() {
            warn!(card_id = %id, "updated an unconfirmed card, skipping reconciliation");
            return Ok(());
        }

        let outcome = self.inner.api.update(id, &patch).await.map(drop);
        settle(self.inner.policy.update, "cards.update", outcome)
    }

    /// Remove a card locally, then reconcile (strict: a failure surfaces,
    /// the removal stays applied and the next fetch reconciles).
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown IDs; every reconciliation failure
    /// surfaces.
    #[instrument(skip(self), fields(card_id = %id))]
    pub async fn remove(&self, id: &CardId) -> Result<(), ApiError> {
        {
            let mut items = self.lock();
            if remove_promoting(&mut items, id.as_str()).is_none() {
                return Err(ApiError::NotFound(format!("no card {id}")));
            }
        }

        if id.is_local() {
            return Ok(());
        }

        let outcome = self.inner.api.delete(id).await;
        settle(self.inner.policy.remove, "cards.remove", outcome)
    }

    /// Make one card the default. Same two-phase shape as the address
    /// store: single locked local pass, best-effort remote demotion,
    /// strict remote promotion.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown IDs; a failed remote promotion
    /// surfaces while local state keeps the new default.
    #[instrument(skip(self), fields(card_id = %id))]
    pub async fn set_default(&self, id: &CardId) -> Result<(), ApiError> {
        let previous = {
            let mut items = self.lock();
            match promote_default(&mut items, id.as_str()) {
                Ok(previous) => previous,
                Err(_) => return Err(ApiError::NotFound(format!("no card {id}"))),
            }
        };

        if let Some(previous) = previous {
            let previous_id = CardId::new(previous);
            if !previous_id.is_local()
                && let Err(e) = self
                    .inner
                    .api
                    .update(&previous_id, &CardUpdate::default_flag(false))
                    .await
            {
                warn!(card_id = %previous_id, error = %e, "failed to demote previous default remotely");
            }
        }

        if id.is_local() {
            return Ok(());
        }

        let outcome = self
            .inner
            .api
            .update(id, &CardUpdate::default_flag(true))
            .await
            .map(drop);
        settle(self.inner.policy.update, "cards.set_default", outcome)
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
    fn confirm_add(&self, local_id: &CardId, mut created: PaymentCard) -> PaymentCard {
        let mut items = self.lock();
        if let Some(position) = items.iter().position(|c| &c.id == local_id) {
            created.is_default = items.get(position).is_some_and(|c| c.is_default);
            if let Some(slot) = items.get_mut(position) {
                *slot = created.clone();
            }
        }
        created
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PaymentCard>> {
        self.inner
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardStore")
            .field("count", &self.lock().len())
            .finish()
    }
}
