//! Order history commands.

use shopfront_client::{Access, Storefront};
use shopfront_core::OrderId;

use super::{CommandError, guard, reported};
use crate::output;

pub async fn list(shop: &Storefront) -> Result<(), CommandError> {
    guard(shop, Access::Authenticated)?;
    let orders = shop.orders().my_orders().await?;
    if orders.is_empty() {
        output::line("No orders yet");
    }
    for order in &orders {
        output::order(order);
    }
    Ok(())
}

pub async fn cancel(shop: &Storefront, id: OrderId) -> Result<(), CommandError> {
    guard(shop, Access::Authenticated)?;
    let orders = shop.orders().my_orders().await?;
    let order = orders
        .iter()
        .find(|order| order.id == id)
        .ok_or_else(|| CommandError::NotFound(format!("No order #{id}")))?;
    reported(shop.orders().cancel(order).await, "could not cancel order")
}
