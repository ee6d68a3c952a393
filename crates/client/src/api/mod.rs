//! Typed endpoint wrappers over the gateway.
//!
//! One thin client per backend resource. These carry no local state (the
//! optimistic stores do); they translate typed calls into gateway requests
//! and typed responses back. All of them are cheap clones around the
//! shared [`crate::gateway::Gateway`].

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

pub use account::{AddressApi, AddressUpdate, CardApi, CardUpdate};
pub use auth::{AuthApi, ProfileUpdate, RegisterData};
pub use cart::CartApi;
pub use catalog::CatalogApi;
pub use orders::OrderApi;
