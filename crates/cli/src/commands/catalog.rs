//! Catalog commands.

use shopfront_client::Storefront;
use shopfront_client::catalog::ProductFilter;
use shopfront_core::ProductId;

use super::CommandError;
use crate::output;

pub async fn list(shop: &Storefront, filter: &ProductFilter) -> Result<(), CommandError> {
    let products = shop.catalog().search(filter).await?;
    if products.is_empty() {
        output::line("No products found");
    }
    for product in &products {
        output::product_row(product);
    }
    Ok(())
}

pub async fn show(shop: &Storefront, id: ProductId) -> Result<(), CommandError> {
    let product = shop.catalog().product(id).await?;
    output::product_detail(&product);
    Ok(())
}
