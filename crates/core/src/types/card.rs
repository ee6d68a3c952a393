//! Payment card entity and create payload.
//!
//! The backend stores cards masked; the CVV travels only in the create
//! payload and is never part of the persisted entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::CardId;

/// A saved payment card, with the number masked by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCard {
    pub id: CardId,
    pub card_holder_name: String,
    /// Masked number, e.g. `**** **** **** 1234`.
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for registering a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDraft {
    pub card_holder_name: String,
    /// Full PAN; the backend masks it before echoing the entity back.
    pub card_number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl CardDraft {
    /// Masked display form of the card number, keeping the last four digits.
    ///
    /// Used for the optimistic local entry so the full PAN never sits in
    /// store state.
    #[must_use]
    pub fn masked_number(&self) -> String {
        let digits: String = self.card_number.chars().filter(char::is_ascii_digit).collect();
        let split = digits.len().saturating_sub(4);
        let last_four = digits.get(split..).unwrap_or("");
        format!("**** **** **** {last_four}")
    }
}

impl PaymentCard {
    /// Build the optimistic local entry for a draft under a placeholder ID.
    #[must_use]
    pub fn from_draft(id: CardId, draft: &CardDraft) -> Self {
        Self {
            id,
            card_holder_name: draft.card_holder_name.clone(),
            card_number: draft.masked_number(),
            expiry_month: draft.expiry_month.clone(),
            expiry_year: draft.expiry_year.clone(),
            brand: draft.brand.clone(),
            is_default: draft.is_default,
            created_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(number: &str) -> CardDraft {
        CardDraft {
            card_holder_name: "ADA LOVELACE".to_owned(),
            card_number: number.to_owned(),
            expiry_month: "12".to_owned(),
            expiry_year: "28".to_owned(),
            cvv: "123".to_owned(),
            brand: Some("visa".to_owned()),
            is_default: false,
        }
    }

    #[test]
    fn test_masked_number_keeps_last_four() {
        assert_eq!(
            draft("4111 1111 1111 1234").masked_number(),
            "**** **** **** 1234"
        );
    }

    #[test]
    fn test_optimistic_entry_never_holds_full_pan() {
        let draft = draft("4111111111111234");
        let card = PaymentCard::from_draft(CardId::local(), &draft);
        assert!(!card.card_number.contains("4111"));
        assert!(card.card_number.ends_with("1234"));
    }
}
