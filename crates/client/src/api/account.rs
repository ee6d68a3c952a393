//! Address and payment-card endpoints.

use serde::Serialize;
use tracing::instrument;

use clementine_core::{Address, AddressDraft, AddressId, CardDraft, CardId, PaymentCard};

use crate::error::ApiError;
use crate::gateway::{Gateway, Request};

// =============================================================================
// Addresses
// =============================================================================

/// Address patch; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddressUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line_2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl AddressUpdate {
    /// A patch that only flips the default flag (the set-default flow).
    #[must_use]
    pub fn default_flag(value: bool) -> Self {
        Self {
            is_default: Some(value),
            ..Self::default()
        }
    }

    /// Apply this patch to a local entity.
    ///
    /// The default flag is deliberately NOT applied here: promotion and
    /// demotion go through the store's set-default pass so the
    /// one-default invariant can never be violated by a stray patch.
    pub fn apply_to(&self, address: &mut Address) {
        if let Some(v) = &self.title {
            address.title.clone_from(v);
        }
        if let Some(v) = &self.first_name {
            address.first_name.clone_from(v);
        }
        if let Some(v) = &self.last_name {
            address.last_name.clone_from(v);
        }
        if let Some(v) = &self.company {
            address.company = Some(v.clone());
        }
        if let Some(v) = &self.address_line {
            address.address_line.clone_from(v);
        }
        if let Some(v) = &self.address_line_2 {
            address.address_line_2 = Some(v.clone());
        }
        if let Some(v) = &self.city {
            address.city.clone_from(v);
        }
        if let Some(v) = &self.district {
            address.district.clone_from(v);
        }
        if let Some(v) = &self.postal_code {
            address.postal_code.clone_from(v);
        }
        if let Some(v) = &self.country {
            address.country.clone_from(v);
        }
        if let Some(v) = &self.phone_number {
            address.phone_number = Some(v.clone());
        }
    }
}

/// Client for `/users/addresses/`.
#[derive(Clone)]
pub struct AddressApi {
    gateway: Gateway,
}

impl AddressApi {
    #[must_use]
    pub const fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// List all saved addresses.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Address>, ApiError> {
        self.gateway.execute(Request::get("/users/addresses/")).await
    }

    /// Fetch one address.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown IDs, otherwise normalized gateway
    /// errors.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn get(&self, id: &AddressId) -> Result<Address, ApiError> {
        self.gateway
            .execute(Request::get(&format!("/users/addresses/{id}/")))
            .await
    }

    /// Create an address; the backend assigns the ID.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors, including per-field validation.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: &AddressDraft) -> Result<Address, ApiError> {
        self.gateway
            .execute(Request::post(
                "/users/addresses/",
                serde_json::to_value(draft)?,
            ))
            .await
    }

    /// Patch an address.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self, patch), fields(address_id = %id))]
    pub async fn update(&self, id: &AddressId, patch: &AddressUpdate) -> Result<Address, ApiError> {
        self.gateway
            .execute(Request::patch(
                &format!("/users/addresses/{id}/"),
                serde_json::to_value(patch)?,
            ))
            .await
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete(&self, id: &AddressId) -> Result<(), ApiError> {
        self.gateway
            .execute_empty(Request::delete(&format!("/users/addresses/{id}/")))
            .await
    }
}

// =============================================================================
// Payment cards
// =============================================================================

/// Card patch; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_holder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl CardUpdate {
    /// A patch that only flips the default flag (the set-default flow).
    #[must_use]
    pub fn default_flag(value: bool) -> Self {
        Self {
            is_default: Some(value),
            ..Self::default()
        }
    }

    /// Apply this patch to a local entity; the default flag is handled by
    /// the store's set-default pass, as for addresses.
    pub fn apply_to(&self, card: &mut PaymentCard) {
        if let Some(v) = &self.card_holder_name {
            card.card_holder_name.clone_from(v);
        }
        if let Some(v) = &self.expiry_month {
            card.expiry_month.clone_from(v);
        }
        if let Some(v) = &self.expiry_year {
            card.expiry_year.clone_from(v);
        }
    }
}

/// Client for `/users/cards/`.
#[derive(Clone)]
pub struct CardApi {
    gateway: Gateway,
}

impl CardApi {
    #[must_use]
    pub const fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// List all saved cards (numbers arrive masked).
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PaymentCard>, ApiError> {
        self.gateway.execute(Request::get("/users/cards/")).await
    }

    /// Fetch one card.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` for unknown IDs, otherwise normalized gateway
    /// errors.
    #[instrument(skip(self), fields(card_id = %id))]
    pub async fn get(&self, id: &CardId) -> Result<PaymentCard, ApiError> {
        self.gateway
            .execute(Request::get(&format!("/users/cards/{id}/")))
            .await
    }

    /// Register a card; the CVV travels only in this payload.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors, including per-field validation.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: &CardDraft) -> Result<PaymentCard, ApiError> {
        self.gateway
            .execute(Request::post("/users/cards/", serde_json::to_value(draft)?))
            .await
    }

    /// Patch a card.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self, patch), fields(card_id = %id))]
    pub async fn update(&self, id: &CardId, patch: &CardUpdate) -> Result<PaymentCard, ApiError> {
        self.gateway
            .execute(Request::patch(
                &format!("/users/cards/{id}/"),
                serde_json::to_value(patch)?,
            ))
            .await
    }

    /// Delete a card.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self), fields(card_id = %id))]
    pub async fn delete(&self, id: &CardId) -> Result<(), ApiError> {
        self.gateway
            .execute_empty(Request::delete(&format!("/users/cards/{id}/")))
            .await
    }
}
