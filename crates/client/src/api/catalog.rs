//! Product catalog endpoints, cached in memory.
//!
//! Catalog reads are hot and rarely change; responses are cached with
//! `moka` for 5 minutes, the same policy the rest of the read path uses
//! for server-owned reference data. Mutable resources (cart, orders) are
//! never cached.

use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};

use clementine_core::{Product, ProductId};

use crate::error::ApiError;
use crate::gateway::{Gateway, Request};

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Cached catalog values.
#[derive(Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}

/// Product list envelope: a bare array or a paginated `results` wrapper.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProductListEnvelope {
    Items(Vec<Product>),
    Paged { results: Vec<Product> },
}

impl ProductListEnvelope {
    fn into_items(self) -> Vec<Product> {
        match self {
            Self::Items(items) => items,
            Self::Paged { results } => results,
        }
    }
}

/// Client for the `/products/` catalog endpoints.
#[derive(Clone)]
pub struct CatalogApi {
    gateway: Gateway,
    cache: Cache<String, CacheValue>,
}

impl CatalogApi {
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self { gateway, cache }
    }

    /// List all products.
    ///
    /// # Errors
    ///
    /// Normalized gateway errors.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let cache_key = "products".to_owned();

        if let Some(CacheValue::Products(products)) = self.cache.get(&cache_key).await {
            debug!("cache hit for product list");
            return Ok(products);
        }

        let envelope: ProductListEnvelope = self
            .gateway
            .execute(Request::get("/products/products/"))
            .await?;
        let products = envelope.into_items();

        self.cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// `ApiError::NotFound` when the catalog does not know the ID,
    /// otherwise normalized gateway errors.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{product_id}");

        if let Some(CacheValue::Product(product)) = self.cache.get(&cache_key).await {
            debug!("cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .gateway
            .execute(Request::get(&format!("/products/products/{product_id}/")))
            .await?;

        self.cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
