//! Administrative endpoints. The backend enforces the admin role on all of these.

use secrecy::SecretString;
use shopfront_core::{OrderId, OrderStatus, ProductId, UserId};
use tracing::instrument;

use super::{AdminUser, ApiClient, ApiError, Order, OrderStatusUpdate};

impl ApiClient {
    /// Every order in the store.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token lacks the admin role.
    #[instrument(skip(self, token))]
    pub async fn admin_orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        self.get_json("/api/admin/orders", Some(token)).await
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the transition.
    #[instrument(skip(self, token))]
    pub async fn admin_update_order_status(
        &self,
        token: &SecretString,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), ApiError> {
        self.put_unit(
            &format!("/api/admin/orders/{id}/status"),
            Some(&OrderStatusUpdate { status }),
            Some(token),
        )
        .await
    }

    /// Every registered account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token lacks the admin role.
    #[instrument(skip(self, token))]
    pub async fn admin_users(&self, token: &SecretString) -> Result<Vec<AdminUser>, ApiError> {
        self.get_json("/api/admin/users", Some(token)).await
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses.
    #[instrument(skip(self, token))]
    pub async fn admin_delete_user(&self, token: &SecretString, id: UserId) -> Result<(), ApiError> {
        self.delete_unit(&format!("/api/admin/users/{id}"), Some(token))
            .await
    }

    /// Delete a product from the catalog.
    ///
    /// # Errors
    ///
    /// Returns error if the backend refuses.
    #[instrument(skip(self, token))]
    pub async fn admin_delete_product(
        &self,
        token: &SecretString,
        id: ProductId,
    ) -> Result<(), ApiError> {
        self.delete_unit(&format!("/api/admin/products/{id}"), Some(token))
            .await
    }
}
