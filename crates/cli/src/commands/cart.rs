//! Cart and checkout commands.
//!
//! Each invocation starts from a fresh mirror, so every command refreshes
//! before it reads or prints.

use shopfront_client::{Access, Storefront};
use shopfront_core::{ProductId, format_money};

use super::{CommandError, guard, reported};
use crate::output;

pub async fn show(shop: &Storefront) -> Result<(), CommandError> {
    guard(shop, Access::Authenticated)?;
    reported(shop.cart().refresh().await, "could not load cart")?;
    output::cart(&shop.cart().snapshot());
    Ok(())
}

pub async fn add(shop: &Storefront, product: ProductId, quantity: u32) -> Result<(), CommandError> {
    // Stock is only known from the catalog, so check it when the product resolves.
    let added = match shop.catalog().product(product).await {
        Ok(product) => shop.cart().add_product(&product, quantity).await,
        Err(e) => {
            tracing::debug!(error = %e, "Product lookup failed; adding without stock check");
            shop.cart().add_item(product, quantity).await
        }
    };
    reported(added, "could not add to cart")?;
    output::cart(&shop.cart().snapshot());
    Ok(())
}

pub async fn update(shop: &Storefront, product: ProductId, quantity: i64) -> Result<(), CommandError> {
    reported(
        shop.cart().set_quantity(product, quantity).await,
        "could not update cart",
    )?;
    output::cart(&shop.cart().snapshot());
    Ok(())
}

pub async fn remove(shop: &Storefront, product: ProductId) -> Result<(), CommandError> {
    reported(shop.cart().remove_item(product).await, "could not remove item")?;
    output::cart(&shop.cart().snapshot());
    Ok(())
}

pub async fn clear(shop: &Storefront) -> Result<(), CommandError> {
    reported(shop.cart().clear().await, "could not clear cart")
}

pub async fn checkout(shop: &Storefront, shipping: &str, billing: &str) -> Result<(), CommandError> {
    guard(shop, Access::Authenticated)?;
    reported(shop.cart().refresh().await, "could not load cart")?;
    let order = shop
        .cart()
        .checkout(shipping, billing)
        .await
        .ok_or(CommandError::Failed("checkout failed"))?;
    output::line(format!(
        "Order #{} placed, total {}",
        order.id,
        format_money(order.total_amount)
    ));
    Ok(())
}
