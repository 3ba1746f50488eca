//! Catalog endpoints. Both are public.

use shopfront_core::ProductId;
use tracing::instrument;

use super::{ApiClient, ApiError, Product};

impl ApiClient {
    /// List every product.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a product list.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/api/products", None).await
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no product has this ID.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.get_json(&format!("/api/products/{id}"), None).await
    }
}
