//! Order endpoints for the signed-in customer.

use secrecy::SecretString;
use shopfront_core::OrderId;
use tracing::instrument;

use super::{ApiClient, ApiError, CreateOrderRequest, Order};

impl ApiClient {
    /// Place an order from the current cart contents.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the order (e.g. empty cart).
    #[instrument(skip(self, token, request))]
    pub async fn create_order(
        &self,
        token: &SecretString,
        request: &CreateOrderRequest,
    ) -> Result<Order, ApiError> {
        self.post_json("/api/orders/create", request, Some(token))
            .await
    }

    /// The caller's order history.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        self.get_json("/api/orders/my-orders", Some(token)).await
    }

    /// Cancel a pending order.
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses (e.g. already shipped).
    #[instrument(skip(self, token))]
    pub async fn cancel_order(&self, token: &SecretString, id: OrderId) -> Result<(), ApiError> {
        self.put_unit::<()>(&format!("/api/orders/{id}/cancel"), None, Some(token))
            .await
    }
}
