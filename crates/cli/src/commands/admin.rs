//! Staff commands. All of them require the administrator role.

use shopfront_client::{Access, Storefront};
use shopfront_core::{OrderId, OrderStatus, ProductId, UserId};

use super::{CommandError, guard, reported};
use crate::output;

pub async fn orders(shop: &Storefront) -> Result<(), CommandError> {
    guard(shop, Access::Admin)?;
    for order in &shop.admin().orders().await? {
        output::order(order);
    }
    Ok(())
}

pub async fn update_status(
    shop: &Storefront,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), CommandError> {
    guard(shop, Access::Admin)?;
    reported(
        shop.admin().update_order_status(id, status).await,
        "could not update order status",
    )
}

pub async fn users(shop: &Storefront) -> Result<(), CommandError> {
    guard(shop, Access::Admin)?;
    for user in &shop.admin().users().await? {
        output::user(user);
    }
    Ok(())
}

pub async fn delete_user(shop: &Storefront, id: UserId) -> Result<(), CommandError> {
    guard(shop, Access::Admin)?;
    let users = shop.admin().users().await?;
    let user = users
        .iter()
        .find(|user| user.id == id)
        .ok_or_else(|| CommandError::NotFound(format!("No user #{id}")))?;
    reported(shop.admin().delete_user(user).await, "could not delete user")
}

pub async fn delete_product(shop: &Storefront, id: ProductId) -> Result<(), CommandError> {
    guard(shop, Access::Admin)?;
    reported(
        shop.admin().delete_product(id).await,
        "could not delete product",
    )
}
