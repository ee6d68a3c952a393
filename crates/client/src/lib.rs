//! Clementine client SDK.
//!
//! A headless client for a remote commerce backend, designed to be embedded
//! by UI surfaces (mobile, web, CLI). The SDK owns everything between the
//! UI and the wire:
//!
//! - [`gateway`] - authenticated request pipeline: bearer attachment, 401
//!   detection, a single shared token refresh, request replay, and error
//!   normalization
//! - [`http`] - the transport seam (`reqwest` in production, scripted
//!   transports in tests) and the refresh coordinator
//! - [`credentials`] - in-memory and file-backed session persistence
//! - [`stores`] - optimistic, offline-first resource stores (cart,
//!   addresses, payment cards, orders)
//! - [`checkout`] - the cart-to-order orchestrator
//! - [`api`] - typed endpoint wrappers the stores reconcile through
//!
//! # Architecture
//!
//! Every collaborator is constructed explicitly and injected - there are no
//! module-level singletons. [`client::CommerceClient`] is the application
//! root that wires a configuration into one connected object graph.
//!
//! Local state is the source of truth between fetches: store mutations
//! apply synchronously before any network suspension point, then reconcile
//! in the background of the same call. See the `stores` module for the
//! per-operation tolerant/strict policy table.
//!
//! # Example
//!
//! ```rust,ignore
//! use clementine_client::{ApiConfig, CommerceClient};
//!
//! let client = CommerceClient::new(ApiConfig::from_env()?)?;
//! client.auth().login("user@example.com", "hunter2!").await?;
//!
//! let products = client.catalog().products().await?;
//! client.cart().add(&products[0], 2).await?;
//! let order = client
//!     .checkout()
//!     .place_order(address_id, card_id, None)
//!     .await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod http;
pub mod stores;

pub use checkout::CheckoutService;
pub use client::CommerceClient;
pub use config::{ApiConfig, ConfigError};
pub use error::ApiError;
pub use gateway::{Gateway, Request};
pub use http::{HttpTransport, ReqwestTransport, TransportError};
