//! Core types for Clementine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod card;
pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod session;
pub mod user;

pub use address::{Address, AddressDraft};
pub use card::{CardDraft, PaymentCard};
pub use cart::{CartItem, CartSnapshot};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderDraft, OrderItem, OrderLineDraft, OrderStatus};
pub use price::Price;
pub use product::Product;
pub use session::{AuthSession, CredentialError, CredentialStore};
pub use user::User;
