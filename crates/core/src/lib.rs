//! Clementine Core - Shared types library.
//!
//! This crate provides common types used across all Clementine components:
//! - `client` - The commerce SDK (gateway, stores, checkout)
//! - `cli` - Command-line surface driving the SDK
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! The one trait defined here, [`types::session::CredentialStore`], is the
//! persistence boundary for auth sessions; implementations live in the
//! `client` crate and are injected at construction time.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, domain entities, order status machine,
//!   auth session and the credential-store trait

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
