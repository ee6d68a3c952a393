//! Shipping address entity and create payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// A saved shipping address.
///
/// At most one address per account has `is_default == true`; the address
/// store maintains that invariant locally (see the client crate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: Option<String>,
    pub address_line: String,
    #[serde(default)]
    pub address_line_2: Option<String>,
    pub city: String,
    pub district: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating an address.
///
/// Also the shape of the optimistic local entry before the backend assigns
/// the real ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub address_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line_2: Option<String>,
    pub city: String,
    pub district: String,
    pub postal_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Build the optimistic local entry for a draft under a placeholder ID.
    #[must_use]
    pub fn from_draft(id: AddressId, draft: AddressDraft) -> Self {
        Self {
            id,
            title: draft.title,
            first_name: draft.first_name,
            last_name: draft.last_name,
            company: draft.company,
            address_line: draft.address_line,
            address_line_2: draft.address_line_2,
            city: draft.city,
            district: draft.district,
            postal_code: draft.postal_code,
            country: draft.country,
            phone_number: draft.phone_number,
            is_default: draft.is_default,
            created_at: None,
            updated_at: None,
        }
    }
}
