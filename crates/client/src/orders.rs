//! Order history for the signed-in customer.

use std::sync::Arc;

use tracing::instrument;

use crate::api::{ApiClient, Order};
use crate::error::StoreError;
use crate::notify::{Notification, Notifier};
use crate::session::SessionStore;

/// Order history and cancellation.
#[derive(Clone)]
pub struct Orders {
    api: ApiClient,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
}

impl Orders {
    #[must_use]
    pub fn new(api: ApiClient, session: SessionStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            session,
            notifier,
        }
    }

    /// The caller's orders, as returned by the backend.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotAuthenticated` while anonymous, or
    /// `StoreError::Api` if the history cannot be fetched.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, StoreError> {
        let token = self.session.token().ok_or(StoreError::NotAuthenticated)?;
        let orders = self.api.my_orders(&token).await.inspect_err(|e| {
            tracing::error!(error = %e, "Error fetching orders");
        })?;
        Ok(orders)
    }

    /// Cancel `order`. Only pending orders can be cancelled.
    #[instrument(skip(self, order), fields(order_id = %order.id, status = %order.status))]
    pub async fn cancel(&self, order: &Order) -> bool {
        match self.try_cancel(order).await {
            Ok(()) => {
                tracing::info!("Order cancelled");
                self.notifier
                    .notify(Notification::success("Order cancelled successfully"));
                true
            }
            Err(StoreError::Validation(message)) => {
                self.notifier.notify(Notification::error(message));
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order cancellation failed");
                self.notifier
                    .notify(Notification::error("Failed to cancel order"));
                false
            }
        }
    }

    async fn try_cancel(&self, order: &Order) -> Result<(), StoreError> {
        let token = self.session.token().ok_or(StoreError::NotAuthenticated)?;
        if !order.is_cancellable() {
            return Err(StoreError::validation(format!(
                "Order #{} is {} and can no longer be cancelled",
                order.id, order.status
            )));
        }
        self.api.cancel_order(&token, order.id).await?;
        Ok(())
    }
}
