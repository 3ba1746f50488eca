//! Product catalog reads with an in-memory TTL cache.
//!
//! Products are read-mostly, so listings and single products are cached via
//! `moka`. Carts are never cached. Admin deletions invalidate the cache.

use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use tracing::instrument;

use shopfront_core::{ProductCategory, ProductId};

use crate::api::{ApiClient, Product};
use crate::error::StoreError;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    Products,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}

/// Criteria from the product listing's filter bar. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name or description.
    pub search: Option<String>,
    pub category: Option<ProductCategory>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            let needle = search.to_lowercase();
            if !product.name.to_lowercase().contains(&needle)
                && !product.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(category) = self.category
            && product.category != Some(category)
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        true
    }
}

/// Products matching `filter`, in their original order.
#[must_use]
pub fn filter_products(products: &[Product], filter: &ProductFilter) -> Vec<Product> {
    products
        .iter()
        .filter(|product| filter.matches(product))
        .cloned()
        .collect()
}

/// Catalog client. Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct Catalog {
    api: ApiClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1000).time_to_live(ttl).build();
        Self { api, cache }
    }

    /// Every product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the listing cannot be fetched.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::Products).await {
            tracing::debug!("Cache hit for product listing");
            return Ok(products);
        }

        let products = self.api.list_products().await?;
        self.cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api(ApiError::NotFound)` for unknown IDs.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Product, StoreError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            tracing::debug!(product_id = %id, "Cache hit for product");
            return Ok(*product);
        }

        let product = self.api.get_product(id).await?;
        self.cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// The first `count` products, for the home page.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the listing cannot be fetched.
    pub async fn featured(&self, count: usize) -> Result<Vec<Product>, StoreError> {
        let mut products = self.list_products().await?;
        products.truncate(count);
        Ok(products)
    }

    /// Products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Api` if the listing cannot be fetched.
    pub async fn search(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let products = self.list_products().await?;
        Ok(filter_products(&products, filter))
    }

    /// Drop everything cached.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}
