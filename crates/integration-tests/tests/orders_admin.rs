//! Order history and admin console against the mock backend.

use axum::http::Method;
use shopfront_core::{OrderStatus, ProductId, Role};

use shopfront_integration_tests::MockBackend;

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_my_orders_lists_only_own_orders() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 7, 1);
    let bob = backend.signed_in("bob", "hunter22").await;
    let placed = bob.shop.cart().checkout("Home", "Home").await.expect("order placed");

    let alice = backend.signed_in("alice", "correctpw").await;

    let mine = bob.shop.orders().my_orders().await.expect("bob's orders");
    assert_eq!(mine.iter().map(|o| o.id).collect::<Vec<_>>(), vec![placed.id]);
    assert!(alice.shop.orders().my_orders().await.expect("alice's orders").is_empty());
}

#[tokio::test]
async fn test_cancel_pending_order() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 2, 1);
    let t = backend.signed_in("bob", "hunter22").await;
    let order = t.shop.cart().checkout("Home", "Home").await.expect("order placed");

    assert!(t.shop.orders().cancel(&order).await);

    assert_eq!(backend.order_status(order.id), Some(OrderStatus::Cancelled));
    assert_eq!(
        t.notifier.last().map(|n| n.message),
        Some("Order cancelled successfully".to_string())
    );
}

#[tokio::test]
async fn test_cancel_non_pending_order_is_refused_locally() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 2, 1);
    let t = backend.signed_in("bob", "hunter22").await;
    let mut order = t.shop.cart().checkout("Home", "Home").await.expect("order placed");
    order.status = OrderStatus::Shipped;
    backend.clear_requests();

    assert!(!t.shop.orders().cancel(&order).await);

    assert!(backend.requests().is_empty());
    assert_eq!(backend.order_status(order.id), Some(OrderStatus::Pending));
}

#[tokio::test]
async fn test_my_orders_requires_login() {
    let backend = MockBackend::start().await;
    let t = backend.storefront();

    assert!(t.shop.orders().my_orders().await.is_err());
    assert!(backend.requests().is_empty());
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn test_admin_updates_order_status() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 7, 1);
    let bob = backend.signed_in("bob", "hunter22").await;
    let order = bob.shop.cart().checkout("Home", "Home").await.expect("order placed");

    let alice = backend.signed_in("alice", "correctpw").await;
    let all = alice.shop.admin().orders().await.expect("admin order list");
    assert_eq!(all.len(), 1);
    assert_eq!(
        all.first().and_then(|o| o.user.as_ref()).map(|u| u.username.as_str()),
        Some("bob")
    );

    assert!(alice.shop.admin().update_order_status(order.id, OrderStatus::Shipped).await);
    assert_eq!(backend.order_status(order.id), Some(OrderStatus::Shipped));

    // Once shipped, the customer can no longer cancel.
    let refreshed = bob.shop.orders().my_orders().await.expect("bob's orders");
    assert!(refreshed.iter().all(|o| !o.is_cancellable()));
}

#[tokio::test]
async fn test_customer_cannot_use_admin_console() {
    let backend = MockBackend::start().await;
    let t = backend.signed_in("bob", "hunter22").await;
    backend.clear_requests();

    assert!(t.shop.admin().users().await.is_err());
    assert!(!t.shop.admin().delete_product(ProductId::new(7)).await);

    assert!(backend.requests().is_empty());
    assert!(backend.has_product(7));
    assert_eq!(
        t.notifier.last().map(|n| n.message),
        Some("You don't have permission to access this page.".to_string())
    );
}

#[tokio::test]
async fn test_admin_deletes_customer_but_not_admin() {
    let backend = MockBackend::start().await;
    let t = backend.signed_in("alice", "correctpw").await;
    let users = t.shop.admin().users().await.expect("user list");

    let admin = users.iter().find(|u| u.role == Role::Admin).expect("an admin");
    assert!(!t.shop.admin().delete_user(admin).await);
    assert!(backend.has_user("alice"));

    let customer = users.iter().find(|u| u.username == "bob").expect("bob listed");
    assert!(t.shop.admin().delete_user(customer).await);
    assert!(!backend.has_user("bob"));
    assert_eq!(backend.count(&Method::DELETE, "/api/admin/users/2"), 1);
}

#[tokio::test]
async fn test_delete_product_invalidates_catalog() {
    let backend = MockBackend::start().await;
    let t = backend.signed_in("alice", "correctpw").await;

    let before = t.shop.catalog().list_products().await.expect("catalog");
    assert!(before.iter().any(|p| p.id == ProductId::new(7)));

    assert!(t.shop.admin().delete_product(ProductId::new(7)).await);

    let after = t.shop.catalog().list_products().await.expect("catalog");
    assert!(after.iter().all(|p| p.id != ProductId::new(7)));
    assert_eq!(backend.count(&Method::GET, "/api/products"), 2);
}
