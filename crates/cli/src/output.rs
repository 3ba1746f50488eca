//! Terminal rendering.

use shopfront_client::api::{AdminUser, CartItem, Order, Product};
use shopfront_client::{CartSnapshot, Level, Notification, Notifier};
use shopfront_core::format_money;

/// Prints notifications the way the web client shows toasts.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    #[allow(clippy::print_stdout, clippy::print_stderr)]
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Success => println!("✓ {}", notification.message),
            Level::Error => eprintln!("✗ {}", notification.message),
        }
    }
}

#[allow(clippy::print_stdout)]
pub fn line(text: impl std::fmt::Display) {
    println!("{text}");
}

pub fn product_row(product: &Product) {
    let category = product.category.map_or("-", |c| c.as_str());
    let stock = match product.stock {
        Some(0) => "out of stock".to_string(),
        Some(stock) => format!("{stock} in stock"),
        None => String::new(),
    };
    line(format!(
        "{:>5}  {:<32} {:>10}  {:<12} {stock}",
        product.id.as_i64(),
        product.name,
        format_money(product.price),
        category,
    ));
}

pub fn product_detail(product: &Product) {
    line(format!("#{} {}", product.id, product.name));
    line(format!("  Price:    {}", format_money(product.price)));
    if let Some(stock) = product.stock {
        line(format!("  Stock:    {stock}"));
    }
    if let Some(category) = product.category {
        line(format!("  Category: {category}"));
    }
    if !product.description.is_empty() {
        line(format!("  {}", product.description));
    }
}

fn cart_row(item: &CartItem) {
    line(format!(
        "{:>5}  {:<32} {:>4} x {:>10} = {:>10}",
        item.product.id.as_i64(),
        item.product.name,
        item.quantity,
        format_money(item.product.price),
        format_money(item.line_total()),
    ));
}

pub fn cart(snapshot: &CartSnapshot) {
    if snapshot.is_empty() {
        line("Your cart is empty");
        return;
    }
    for item in &snapshot.items {
        cart_row(item);
    }
    line(format!(
        "{} item(s), subtotal {}",
        snapshot.item_count(),
        format_money(snapshot.subtotal)
    ));
}

pub fn order(order: &Order) {
    let customer = order
        .user
        .as_ref()
        .map_or(String::new(), |user| format!("  {}", user.username));
    line(format!(
        "#{:<5} {}  {:<10} {:>10}{customer}",
        order.id.as_i64(),
        order.order_date.format("%Y-%m-%d %H:%M"),
        order.status.as_str(),
        format_money(order.total_amount),
    ));
    for item in &order.order_items {
        line(format!(
            "         {} x {} @ {}",
            item.quantity,
            item.product.name,
            format_money(item.price)
        ));
    }
}

pub fn user(user: &AdminUser) {
    line(format!(
        "{:>5}  {:<20} {:<30} {:<24} {}",
        user.id.as_i64(),
        user.username,
        user.email,
        user.full_name(),
        user.role
    ));
}
