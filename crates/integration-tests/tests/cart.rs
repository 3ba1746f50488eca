//! Cart store against the mock backend.

use axum::http::Method;
use rust_decimal::Decimal;
use shopfront_core::ProductId;

use shopfront_integration_tests::MockBackend;

const MUG: ProductId = ProductId::new(7);
const NOVEL: ProductId = ProductId::new(2);

// =============================================================================
// Add
// =============================================================================

#[tokio::test]
async fn test_adding_existing_product_merges_line() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 7, 2);
    let t = backend.signed_in("bob", "hunter22").await;
    assert_eq!(t.shop.cart().subtotal(), Decimal::new(1998, 2));

    assert!(t.shop.cart().add_item(MUG, 1).await);

    let cart = t.shop.cart().snapshot();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.line(MUG).map(|item| item.quantity), Some(3));
    assert_eq!(cart.subtotal, Decimal::new(2997, 2));
    assert_eq!(cart.item_count(), 3);
    assert_eq!(backend.cart_of("bob"), vec![(7, 3)]);
}

#[tokio::test]
async fn test_every_mutation_refetches_cart() {
    let backend = MockBackend::start().await;
    let t = backend.signed_in("bob", "hunter22").await;
    backend.clear_requests();

    assert!(t.shop.cart().add_item(NOVEL, 1).await);

    let paths: Vec<_> = backend
        .requests()
        .into_iter()
        .map(|r| (r.method, r.path))
        .collect();
    assert_eq!(
        paths,
        vec![
            (Method::POST, "/api/cart/add".to_string()),
            (Method::GET, "/api/cart".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_anonymous_add_sends_nothing() {
    let backend = MockBackend::start().await;
    let t = backend.storefront();

    assert!(!t.shop.cart().add_item(MUG, 1).await);

    assert!(backend.requests().is_empty());
    assert!(t.shop.cart().snapshot().is_empty());
    assert_eq!(
        t.notifier.last().map(|n| n.message),
        Some("Please login to add items to cart".to_string())
    );
}

#[tokio::test]
async fn test_add_product_over_stock_is_refused_locally() {
    let backend = MockBackend::start().await;
    let t = backend.signed_in("bob", "hunter22").await;
    let laptop = t.shop.catalog().product(ProductId::new(1)).await.expect("laptop exists");
    backend.clear_requests();

    let stock = laptop.stock.expect("laptop reports stock");
    assert!(!t.shop.cart().add_product(&laptop, stock + 1).await);

    assert!(backend.requests().is_empty());
    assert_eq!(
        t.notifier.last().map(|n| n.message),
        Some("Quantity exceeds available stock".to_string())
    );
}

#[tokio::test]
async fn test_add_product_without_known_stock_reaches_backend() {
    let backend = MockBackend::start().await;
    let t = backend.signed_in("bob", "hunter22").await;
    let mut mug = t.shop.catalog().product(ProductId::new(7)).await.expect("mug exists");
    mug.stock = None;

    assert!(t.shop.cart().add_product(&mug, 25).await);

    assert_eq!(backend.cart_of("bob"), vec![(7, 25)]);
    assert_eq!(t.shop.cart().item_count(), 25);
}

// =============================================================================
// Update / remove
// =============================================================================

#[tokio::test]
async fn test_update_sets_quantity() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 7, 1);
    let t = backend.signed_in("bob", "hunter22").await;

    assert!(t.shop.cart().update_item(MUG, 4).await);

    assert_eq!(t.shop.cart().snapshot().line(MUG).map(|i| i.quantity), Some(4));
    assert_eq!(t.shop.cart().subtotal(), Decimal::new(3996, 2));
    assert_eq!(t.notifier.last().map(|n| n.message), Some("Cart updated!".to_string()));
}

#[tokio::test]
async fn test_update_to_zero_is_rejected_without_request() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 7, 1);
    let t = backend.signed_in("bob", "hunter22").await;
    backend.clear_requests();

    assert!(!t.shop.cart().update_item(MUG, 0).await);

    assert_eq!(backend.count(&Method::PUT, "/api/cart/update"), 0);
    assert_eq!(t.shop.cart().item_count(), 1);
}

#[tokio::test]
async fn test_set_quantity_zero_removes_line() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 7, 1);
    backend.seed_cart("bob", 2, 1);
    let t = backend.signed_in("bob", "hunter22").await;

    assert!(t.shop.cart().set_quantity(MUG, 0).await);

    assert_eq!(backend.count(&Method::DELETE, "/api/cart/remove/7"), 1);
    let cart = t.shop.cart().snapshot();
    assert!(cart.line(MUG).is_none());
    assert_eq!(cart.subtotal, Decimal::new(1299, 2));
}

// =============================================================================
// Clear
// =============================================================================

#[tokio::test]
async fn test_clear_empties_without_refetch() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 7, 3);
    let t = backend.signed_in("bob", "hunter22").await;
    backend.clear_requests();

    assert!(t.shop.cart().clear().await);

    assert!(t.shop.cart().snapshot().is_empty());
    assert_eq!(t.shop.cart().subtotal(), Decimal::ZERO);
    assert_eq!(backend.count(&Method::DELETE, "/api/cart/clear"), 1);
    assert_eq!(backend.count(&Method::GET, "/api/cart"), 0);
    assert!(backend.cart_of("bob").is_empty());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_backend_failure_leaves_cart_untouched() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 7, 2);
    let t = backend.signed_in("bob", "hunter22").await;
    let before = t.shop.cart().snapshot();

    backend.set_failing(true);
    assert!(!t.shop.cart().add_item(NOVEL, 1).await);
    assert!(!t.shop.cart().refresh().await);

    assert_eq!(t.shop.cart().snapshot().items, before.items);
    assert_eq!(t.shop.cart().subtotal(), before.subtotal);
    assert!(!t.shop.cart().snapshot().loading);
    assert_eq!(
        t.notifier.last().map(|n| n.message),
        Some("Failed to add product to cart".to_string())
    );
}

#[tokio::test]
async fn test_anonymous_mutations_ask_for_login() {
    let backend = MockBackend::start().await;
    let t = backend.storefront();

    assert!(!t.shop.cart().update_item(MUG, 2).await);
    assert!(!t.shop.cart().remove_item(MUG).await);
    assert!(!t.shop.cart().clear().await);

    assert!(backend.requests().is_empty());
    assert_eq!(
        t.messages(),
        vec!["Please login first", "Please login first", "Please login first"]
    );
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let backend = MockBackend::start().await;
    backend.seed_cart("bob", 7, 2);
    backend.seed_cart("bob", 2, 1);
    let t = backend.signed_in("bob", "hunter22").await;

    let order = t
        .shop
        .cart()
        .checkout("1 Main St", "1 Main St")
        .await
        .expect("order placed");

    assert_eq!(order.total_amount, Decimal::new(3297, 2));
    assert_eq!(order.order_items.len(), 2);
    assert!(order.is_cancellable());
    assert!(t.shop.cart().snapshot().is_empty());
    assert!(t.messages().contains(&"Order placed successfully!".to_string()));
}

#[tokio::test]
async fn test_checkout_requires_addresses_and_items() {
    let backend = MockBackend::start().await;
    let t = backend.signed_in("bob", "hunter22").await;
    backend.clear_requests();

    assert!(t.shop.cart().checkout("1 Main St", "  ").await.is_none());
    assert!(t.shop.cart().checkout("1 Main St", "1 Main St").await.is_none());

    assert_eq!(backend.count(&Method::POST, "/api/orders/create"), 0);
    assert_eq!(
        t.notifier.last().map(|n| n.message),
        Some("Your cart is empty".to_string())
    );
}
