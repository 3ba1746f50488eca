//! Administrative console operations.
//!
//! Every call first checks the local identity for the administrator role, so
//! customers never send admin requests. The backend enforces the role again.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::instrument;

use shopfront_core::{OrderId, OrderStatus, ProductId, Role};

use crate::api::{AdminUser, ApiClient, Order};
use crate::catalog::Catalog;
use crate::error::StoreError;
use crate::notify::{Notification, Notifier};
use crate::session::SessionStore;

/// Admin console. Cheap to clone.
#[derive(Clone)]
pub struct AdminConsole {
    api: ApiClient,
    session: SessionStore,
    catalog: Catalog,
    notifier: Arc<dyn Notifier>,
}

impl AdminConsole {
    #[must_use]
    pub fn new(
        api: ApiClient,
        session: SessionStore,
        catalog: Catalog,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            session,
            catalog,
            notifier,
        }
    }

    fn admin_token(&self) -> Result<SecretString, StoreError> {
        let token = self.session.token().ok_or(StoreError::NotAuthenticated)?;
        if !self.session.is_admin() {
            return Err(StoreError::Forbidden);
        }
        Ok(token)
    }

    fn finish(&self, result: Result<(), StoreError>, success: &str, failure: &str) -> bool {
        match result {
            Ok(()) => {
                self.notifier.notify(Notification::success(success));
                true
            }
            Err(StoreError::Forbidden) => {
                self.notifier.notify(Notification::error(
                    "You don't have permission to access this page.",
                ));
                false
            }
            Err(StoreError::Validation(message)) => {
                self.notifier.notify(Notification::error(message));
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Admin operation failed");
                self.notifier.notify(Notification::error(failure));
                false
            }
        }
    }

    /// Every order in the store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Forbidden` without the admin role, or
    /// `StoreError::Api` if the listing cannot be fetched.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, StoreError> {
        let token = self.admin_token()?;
        Ok(self.api.admin_orders(&token).await?)
    }

    /// Every registered account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Forbidden` without the admin role, or
    /// `StoreError::Api` if the listing cannot be fetched.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<AdminUser>, StoreError> {
        let token = self.admin_token()?;
        Ok(self.api.admin_users(&token).await?)
    }

    /// Move an order to `status`.
    #[instrument(skip(self))]
    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> bool {
        let result = async {
            let token = self.admin_token()?;
            self.api.admin_update_order_status(&token, id, status).await?;
            Ok::<(), StoreError>(())
        }
        .await;
        self.finish(result, "Order status updated", "Failed to update order status")
    }

    /// Delete an account. Administrator accounts are protected.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete_user(&self, user: &AdminUser) -> bool {
        let result = async {
            let token = self.admin_token()?;
            if user.role == Role::Admin {
                return Err(StoreError::validation("Administrator accounts cannot be deleted"));
            }
            self.api.admin_delete_user(&token, user.id).await?;
            Ok::<(), StoreError>(())
        }
        .await;
        self.finish(result, "User deleted", "Failed to delete user")
    }

    /// Delete a product and drop the cached catalog.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> bool {
        let result = async {
            let token = self.admin_token()?;
            self.api.admin_delete_product(&token, id).await?;
            self.catalog.invalidate();
            Ok::<(), StoreError>(())
        }
        .await;
        self.finish(result, "Product deleted", "Failed to delete product")
    }
}
