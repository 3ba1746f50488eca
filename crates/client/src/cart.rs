//! Cart store: a backend-synchronized mirror of the signed-in user's cart.
//!
//! Every successful mutation is followed by a full re-fetch; quantities and
//! prices are never patched locally. The subtotal is derived from the line
//! items each time they are replaced, so it cannot drift from them.
//!
//! Concurrent mutations are not serialized: each one triggers its own
//! refresh and the last refresh to finish wins. The backend is the arbiter.

use std::sync::Arc;

use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use shopfront_core::ProductId;

use crate::api::{ApiClient, CartItem, CartLineRequest, CreateOrderRequest, Order, Product};
use crate::error::StoreError;
use crate::notify::{Notification, Notifier};
use crate::session::{SessionSnapshot, SessionStore};

/// Notification texts for one cart operation.
struct Messages {
    success: &'static str,
    failure: &'static str,
    needs_login: &'static str,
}

const LOGIN_FIRST: &str = "Please login first";

const ADD: Messages = Messages {
    success: "Product added to cart!",
    failure: "Failed to add product to cart",
    needs_login: "Please login to add items to cart",
};

const UPDATE: Messages = Messages {
    success: "Cart updated!",
    failure: "Failed to update cart",
    needs_login: LOGIN_FIRST,
};

const REMOVE: Messages = Messages {
    success: "Product removed from cart!",
    failure: "Failed to remove product from cart",
    needs_login: LOGIN_FIRST,
};

const CLEAR: Messages = Messages {
    success: "Cart cleared!",
    failure: "Failed to clear cart",
    needs_login: LOGIN_FIRST,
};

const CHECKOUT: Messages = Messages {
    success: "Order placed successfully!",
    failure: "Failed to place order. Please try again.",
    needs_login: LOGIN_FIRST,
};

/// Observable state of the cart store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    /// A refresh is in flight.
    pub loading: bool,
}

impl CartSnapshot {
    /// Build a snapshot from backend lines, normalising them first.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let items = normalize_lines(items);
        let subtotal = subtotal(&items);
        Self {
            items,
            subtotal,
            loading: false,
        }
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line holding `product_id`, if any.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }
}

/// Sum of `unit_price × quantity` over `items`.
#[must_use]
pub fn subtotal(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

/// Drop zero-quantity lines and merge lines for the same product.
///
/// The backend should never send either; the mirror enforces its own
/// invariants regardless. Order of first appearance is preserved.
fn normalize_lines(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut lines: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity == 0 {
            tracing::warn!(product_id = %item.product.id, "Dropping zero-quantity cart line");
            continue;
        }
        if let Some(existing) = lines.iter_mut().find(|l| l.product.id == item.product.id) {
            tracing::warn!(product_id = %item.product.id, "Merging duplicate cart line");
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            lines.push(item);
        }
    }
    lines
}

/// Mirror of the signed-in user's cart.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

struct CartInner {
    api: ApiClient,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<CartSnapshot>,
}

impl CartStore {
    /// Create an empty store. Call [`bind`](Self::bind) to follow the session.
    #[must_use]
    pub fn new(api: ApiClient, session: SessionStore, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(CartSnapshot::default());
        Self {
            inner: Arc::new(CartInner {
                api,
                session,
                notifier,
                state,
            }),
        }
    }

    /// Follow session identity changes: fetch the cart when a user signs
    /// in, empty it locally when the session becomes anonymous.
    ///
    /// The current identity is applied immediately. Must be called from
    /// within a Tokio runtime.
    pub fn bind(&self) -> JoinHandle<()> {
        let store = self.clone();
        let mut session = self.inner.session.subscribe();
        tokio::spawn(async move {
            let mut seen_epoch = None;
            loop {
                let snapshot = session.borrow_and_update().clone();
                if seen_epoch != Some(snapshot.epoch) {
                    seen_epoch = Some(snapshot.epoch);
                    store.follow_session(&snapshot).await;
                }
                if session.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// Apply one session state to the cart.
    pub async fn follow_session(&self, session: &SessionSnapshot) {
        if session.is_authenticated() {
            self.refresh().await;
        } else {
            self.reset();
        }
    }

    /// Empty the local mirror without contacting the backend.
    pub fn reset(&self) {
        self.inner.state.send_replace(CartSnapshot::default());
    }

    fn notify(&self, notification: Notification) {
        self.inner.notifier.notify(notification);
    }

    fn require_token(&self) -> Result<SecretString, StoreError> {
        self.inner
            .session
            .token()
            .ok_or(StoreError::NotAuthenticated)
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receive every future state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.inner.state.borrow().items.clone()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.inner.state.borrow().subtotal
    }

    /// Sum of quantities across all lines, for badges.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.inner.state.borrow().item_count()
    }

    /// Replace the mirror with the backend's cart.
    ///
    /// Failures are logged and leave the previous mirror in place. While
    /// anonymous the mirror is emptied instead.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> bool {
        let session = self.inner.session.snapshot();
        let Some(identity) = session.identity else {
            self.reset();
            return false;
        };

        self.inner.state.send_modify(|state| state.loading = true);
        match self.inner.api.get_cart(&identity.token).await {
            Ok(items) => {
                let snapshot = CartSnapshot::from_items(items);
                let lines = snapshot.items.len();
                let subtotal = snapshot.subtotal;
                let mut applied = false;
                // The epoch is compared under the cart lock; every identity
                // change bumps it before the cart is reset.
                self.inner.state.send_if_modified(|state| {
                    if self.inner.session.epoch() == session.epoch {
                        *state = snapshot;
                        applied = true;
                    } else {
                        state.loading = false;
                    }
                    true
                });
                if applied {
                    tracing::debug!(lines, subtotal = %subtotal, "Cart refreshed");
                } else {
                    tracing::debug!("Discarding cart fetched for a previous session");
                }
                applied
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching cart items");
                self.inner.state.send_modify(|state| state.loading = false);
                false
            }
        }
    }

    /// Add `quantity` of a product, merging into an existing line server-side.
    #[instrument(skip(self))]
    pub async fn add_item(&self, product_id: ProductId, quantity: u32) -> bool {
        let result = self.try_add(product_id, quantity).await;
        self.report(result, &ADD)
    }

    /// Add from a product page, refusing quantities above the known stock.
    ///
    /// Products without a reported stock are left for the backend to check.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_product(&self, product: &Product, quantity: u32) -> bool {
        if product.stock.is_some_and(|stock| quantity > stock) {
            self.notify(Notification::error("Quantity exceeds available stock"));
            return false;
        }
        self.add_item(product.id, quantity).await
    }

    async fn try_add(&self, product_id: ProductId, quantity: u32) -> Result<(), StoreError> {
        let token = self.require_token()?;
        validate_quantity(quantity)?;
        self.inner
            .api
            .add_to_cart(
                &token,
                &CartLineRequest {
                    product_id,
                    quantity,
                },
            )
            .await?;
        self.refresh().await;
        Ok(())
    }

    /// Set the quantity of a line. `quantity` must be at least 1; removing a
    /// line is [`remove_item`](Self::remove_item)'s job.
    #[instrument(skip(self))]
    pub async fn update_item(&self, product_id: ProductId, quantity: u32) -> bool {
        let result = self.try_update(product_id, quantity).await;
        self.report(result, &UPDATE)
    }

    async fn try_update(&self, product_id: ProductId, quantity: u32) -> Result<(), StoreError> {
        let token = self.require_token()?;
        validate_quantity(quantity)?;
        self.inner
            .api
            .update_cart(
                &token,
                &CartLineRequest {
                    product_id,
                    quantity,
                },
            )
            .await?;
        self.refresh().await;
        Ok(())
    }

    /// Translate a quantity stepper gesture: zero or less removes the line.
    pub async fn set_quantity(&self, product_id: ProductId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(product_id).await;
        }
        if let Ok(quantity) = u32::try_from(quantity) {
            self.update_item(product_id, quantity).await
        } else {
            self.notify(Notification::error("Quantity is too large"));
            false
        }
    }

    /// Remove the line holding `product_id`.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: ProductId) -> bool {
        let result = self.try_remove(product_id).await;
        self.report(result, &REMOVE)
    }

    async fn try_remove(&self, product_id: ProductId) -> Result<(), StoreError> {
        let token = self.require_token()?;
        self.inner.api.remove_from_cart(&token, product_id).await?;
        self.refresh().await;
        Ok(())
    }

    /// Empty the cart. The result is known, so no re-fetch follows.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> bool {
        let result = self.try_clear().await;
        self.report(result, &CLEAR)
    }

    async fn try_clear(&self) -> Result<(), StoreError> {
        let token = self.require_token()?;
        self.inner.api.clear_cart(&token).await?;
        self.reset();
        Ok(())
    }

    /// Place an order for the cart contents, then empty the cart.
    ///
    /// Both addresses are required; blank ones are rejected before any
    /// request is sent.
    #[instrument(skip(self, shipping_address, billing_address))]
    pub async fn checkout(&self, shipping_address: &str, billing_address: &str) -> Option<Order> {
        match self.try_checkout(shipping_address, billing_address).await {
            Ok(order) => {
                tracing::info!(order_id = %order.id, total = %order.total_amount, "Order placed");
                self.notify(Notification::success(CHECKOUT.success));
                self.clear().await;
                Some(order)
            }
            Err(e) => {
                self.report_failure(&e, &CHECKOUT);
                None
            }
        }
    }

    async fn try_checkout(&self, shipping: &str, billing: &str) -> Result<Order, StoreError> {
        let token = self.require_token()?;
        let (shipping, billing) = (shipping.trim(), billing.trim());
        if shipping.is_empty() || billing.is_empty() {
            return Err(StoreError::validation(
                "Please fill in both shipping and billing addresses",
            ));
        }
        if self.inner.state.borrow().is_empty() {
            return Err(StoreError::validation("Your cart is empty"));
        }

        let order = self
            .inner
            .api
            .create_order(
                &token,
                &CreateOrderRequest {
                    shipping_address: shipping.to_string(),
                    billing_address: billing.to_string(),
                },
            )
            .await?;
        Ok(order)
    }

    fn report(&self, result: Result<(), StoreError>, messages: &Messages) -> bool {
        match result {
            Ok(()) => {
                self.notify(Notification::success(messages.success));
                true
            }
            Err(e) => {
                self.report_failure(&e, messages);
                false
            }
        }
    }

    fn report_failure(&self, error: &StoreError, messages: &Messages) {
        match error {
            StoreError::NotAuthenticated => {
                self.notify(Notification::error(messages.needs_login));
            }
            StoreError::Validation(message) => {
                self.notify(Notification::error(message.clone()));
            }
            other => {
                tracing::warn!(error = %other, "Cart operation failed");
                self.notify(Notification::error(messages.failure));
            }
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

fn validate_quantity(quantity: u32) -> Result<(), StoreError> {
    if quantity == 0 {
        return Err(StoreError::validation(
            "Quantity must be at least 1; remove the item instead",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::CartItemId;

    use super::*;

    fn product(id: i64, price: Decimal) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price,
            stock: Some(10),
            category: None,
            image_url: None,
        }
    }

    fn line(id: i64, product_id: i64, price: Decimal, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product: product(product_id, price),
            quantity,
        }
    }

    #[test]
    fn test_subtotal_sums_line_totals() {
        let snapshot = CartSnapshot::from_items(vec![
            line(1, 7, Decimal::new(999, 2), 3),
            line(2, 8, Decimal::new(150, 2), 2),
        ]);
        assert_eq!(snapshot.subtotal, Decimal::new(3297, 2));
        assert_eq!(snapshot.item_count(), 5);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CartSnapshot::from_items(Vec::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.item_count(), 0);
        assert_eq!(snapshot.subtotal, Decimal::ZERO);
    }

    #[test]
    fn test_zero_quantity_lines_dropped() {
        let snapshot = CartSnapshot::from_items(vec![
            line(1, 7, Decimal::new(999, 2), 0),
            line(2, 8, Decimal::ONE, 1),
        ]);
        assert_eq!(snapshot.items.len(), 1);
        assert!(snapshot.line(ProductId::new(7)).is_none());
        assert!(snapshot.items.iter().all(|item| item.quantity >= 1));
    }

    #[test]
    fn test_duplicate_product_lines_merged() {
        let snapshot = CartSnapshot::from_items(vec![
            line(1, 7, Decimal::new(999, 2), 2),
            line(2, 8, Decimal::ONE, 1),
            line(3, 7, Decimal::new(999, 2), 1),
        ]);
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.line(ProductId::new(7)).unwrap().quantity, 3);
        assert_eq!(snapshot.items.first().unwrap().product.id, ProductId::new(7));
        assert_eq!(snapshot.subtotal, Decimal::new(3097, 2));
    }

    #[test]
    fn test_subtotal_matches_lines_for_many_shapes() {
        // Every combination of a few prices and quantities keeps the derived
        // values consistent with the lines.
        let prices = [Decimal::new(1, 2), Decimal::new(999, 2), Decimal::new(12345, 1)];
        for (i, price) in prices.iter().enumerate() {
            for quantity in 0..4_u32 {
                let items = vec![
                    line(1, 1, *price, quantity),
                    line(2, 2, Decimal::new(250, 2), quantity + 1),
                ];
                let snapshot = CartSnapshot::from_items(items);
                let expected: Decimal = snapshot
                    .items
                    .iter()
                    .map(|item| item.product.price * Decimal::from(item.quantity))
                    .sum();
                assert_eq!(snapshot.subtotal, expected, "price index {i}, quantity {quantity}");
                assert_eq!(
                    snapshot.item_count(),
                    snapshot.items.iter().map(|l| u64::from(l.quantity)).sum::<u64>()
                );
                assert_eq!(snapshot.item_count() == 0, snapshot.is_empty());
            }
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(matches!(validate_quantity(0), Err(StoreError::Validation(_))));
        assert!(validate_quantity(1).is_ok());
    }
}
