//! List and history commands

use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::store::{PriceObservation, Product, ProductSummary};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A product and its full price history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductHistory {
    pub product: Product,
    pub observations: Vec<PriceObservation>,
}

/// List all tracked products with their latest price
pub async fn cmd_list(ctx: &AppContext) -> Result<Vec<ProductSummary>> {
    info!("Listing products");
    ctx.store.list_product_summaries().await
}

/// Load a product's price history, oldest first
pub async fn cmd_history(ctx: &AppContext, product_id: i64) -> Result<ProductHistory> {
    let product = ctx
        .store
        .get_product(product_id)
        .await?
        .ok_or(Error::ProductNotFound(product_id))?;
    let observations = ctx.store.history_for(product_id).await?;
    Ok(ProductHistory {
        product,
        observations,
    })
}

/// Print tracked products in a human-readable format
pub fn print_products(products: &[ProductSummary]) {
    if products.is_empty() {
        println!("No products are being tracked.");
        return;
    }

    println!("Tracked products ({}):", products.len());
    for product in products {
        println!();
        println!("  [{}] {}", product.id, product.name);
        println!("    URL: {}", product.url);
        println!("    Target: ${:.2}", product.target_price);
        match (product.latest_price, &product.latest_at) {
            (Some(price), Some(at)) => println!("    Latest: ${:.2} ({})", price, at),
            _ => println!("    Latest: never checked"),
        }
    }
}

/// Print a product's history
pub fn print_history(history: &ProductHistory) {
    println!("Price history: {}", history.product.name);
    if history.observations.is_empty() {
        println!("  No price history available");
        return;
    }
    for obs in &history.observations {
        let marker = if obs.price <= history.product.target_price {
            " ✓"
        } else {
            ""
        };
        println!("  {}  ${:.2}{}", obs.timestamp, obs.price, marker);
    }
}
