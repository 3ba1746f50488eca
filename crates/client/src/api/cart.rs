//! Cart endpoints. All of them act on the cart of the token's owner.

use secrecy::SecretString;
use shopfront_core::ProductId;
use tracing::instrument;

use super::{ApiClient, ApiError, CartItem, CartLineRequest};

impl ApiClient {
    /// Fetch every line of the caller's cart.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &SecretString) -> Result<Vec<CartItem>, ApiError> {
        self.get_json("/api/cart", Some(token)).await
    }

    /// Add `quantity` of a product; the backend merges into an existing line.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the request.
    #[instrument(skip(self, token, line), fields(product_id = %line.product_id, quantity = line.quantity))]
    pub async fn add_to_cart(
        &self,
        token: &SecretString,
        line: &CartLineRequest,
    ) -> Result<(), ApiError> {
        self.post_unit("/api/cart/add", line, Some(token)).await
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the request.
    #[instrument(skip(self, token, line), fields(product_id = %line.product_id, quantity = line.quantity))]
    pub async fn update_cart(
        &self,
        token: &SecretString,
        line: &CartLineRequest,
    ) -> Result<(), ApiError> {
        self.put_unit("/api/cart/update", Some(line), Some(token))
            .await
    }

    /// Remove the line holding `product_id`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the request.
    #[instrument(skip(self, token))]
    pub async fn remove_from_cart(
        &self,
        token: &SecretString,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        self.delete_unit(&format!("/api/cart/remove/{product_id}"), Some(token))
            .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the request.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &SecretString) -> Result<(), ApiError> {
        self.delete_unit("/api/cart/clear", Some(token)).await
    }
}
