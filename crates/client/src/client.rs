//! Application root: one connected object graph.
//!
//! [`CommerceClient`] constructs and owns every collaborator - transport,
//! credential store, gateway, endpoint APIs, resource stores, checkout -
//! and hands out references. Nothing in the SDK is a module-level
//! singleton; embedders that need different wiring (a scripted transport,
//! a custom credential store) use [`CommerceClient::with_parts`].

use std::sync::Arc;

use clementine_core::CredentialStore;

use crate::api::{AddressApi, AuthApi, CardApi, CartApi, CatalogApi, OrderApi};
use crate::checkout::CheckoutService;
use crate::config::ApiConfig;
use crate::credentials::{FileCredentialStore, InMemoryCredentialStore};
use crate::error::ApiError;
use crate::gateway::Gateway;
use crate::http::{HttpTransport, ReqwestTransport};
use crate::stores::{AddressStore, CardStore, CartStore, OrderStore};

/// The SDK's application root.
#[derive(Clone)]
pub struct CommerceClient {
    gateway: Gateway,
    auth: AuthApi,
    catalog: CatalogApi,
    cart: CartStore,
    addresses: AddressStore,
    cards: CardStore,
    orders: OrderStore,
    checkout: CheckoutService,
}

impl CommerceClient {
    /// Build a production client: `reqwest` transport, file-backed
    /// credential store when the config names a path, in-memory otherwise.
    ///
    /// # Errors
    ///
    /// `ApiError::Network` when the HTTP client cannot be constructed.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(&config)
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let credentials: Arc<dyn CredentialStore> = match &config.credentials_path {
            Some(path) => Arc::new(FileCredentialStore::new(path.clone())),
            None => Arc::new(InMemoryCredentialStore::new()),
        };

        Ok(Self::with_parts(&config, Arc::new(transport), credentials))
    }

    /// Build a client from explicit collaborators (tests, custom wiring).
    #[must_use]
    pub fn with_parts(
        config: &ApiConfig,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let gateway = Gateway::new(transport, credentials, config);

        let auth = AuthApi::new(gateway.clone());
        let catalog = CatalogApi::new(gateway.clone());
        let cart = CartStore::new(CartApi::new(gateway.clone()));
        let addresses = AddressStore::new(AddressApi::new(gateway.clone()));
        let cards = CardStore::new(CardApi::new(gateway.clone()));
        let order_api = OrderApi::new(gateway.clone());
        let orders = OrderStore::new(order_api.clone());
        let checkout = CheckoutService::new(order_api, cart.clone(), orders.clone());

        Self {
            gateway,
            auth,
            catalog,
            cart,
            addresses,
            cards,
            orders,
            checkout,
        }
    }

    /// Whether a complete session (both tokens) is stored. Storage read
    /// failures read as anonymous.
    pub async fn is_authenticated(&self) -> bool {
        self.gateway
            .credentials()
            .get()
            .await
            .ok()
            .flatten()
            .is_some_and(|s| s.is_authenticated())
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthApi {
        &self.auth
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogApi {
        &self.catalog
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn addresses(&self) -> &AddressStore {
        &self.addresses
    }

    #[must_use]
    pub const fn cards(&self) -> &CardStore {
        &self.cards
    }

    #[must_use]
    pub const fn orders(&self) -> &OrderStore {
        &self.orders
    }

    #[must_use]
    pub const fn checkout(&self) -> &CheckoutService {
        &self.checkout
    }

    /// The underlying gateway, for embedders that need raw requests.
    #[must_use]
    pub const fn gateway(&self) -> &Gateway {
        &self.gateway
    }
}
