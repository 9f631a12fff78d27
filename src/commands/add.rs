//! Add command - start tracking a product or change its target price

use crate::context::AppContext;
use crate::error::{Error, Result};
use crate::tracker::{self, AddedProduct};
use tracing::info;

/// Check that `url` points at a supported site
pub fn validate_product_url(url: &str, site_markers: &[String]) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::Validation("product URL must not be empty".to_string()));
    }

    let supported = site_markers
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .any(|marker| url.contains(marker));
    if !supported {
        return Err(Error::Validation(format!(
            "Please provide a valid product URL (expected one of: {})",
            site_markers.join(", ")
        )));
    }
    Ok(())
}

/// Check that a target price is a positive amount
pub fn validate_target_price(target_price: f64) -> Result<()> {
    if !target_price.is_finite() || target_price <= 0.0 {
        return Err(Error::Validation(
            "Target price must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Validate input, resolve the product name, and store the product
pub async fn cmd_add(ctx: &AppContext, url: &str, target_price: f64) -> Result<AddedProduct> {
    validate_product_url(url, &ctx.config.tracking.site_markers)?;
    validate_target_price(target_price)?;

    info!("Adding product {}", url);
    tracker::add_product(ctx, url.trim(), target_price).await
}

/// Print the confirmation for an added product
pub fn print_added(added: &AddedProduct) {
    if added.created {
        println!("✓ Successfully added product: {}", added.name);
    } else {
        println!("✓ Updated product: {}", added.name);
    }
    println!("  Product ID: {}", added.id);
    println!("  Target price set to: ${:.2}", added.target_price);
    println!("\nRun 'pricewatch check' to check current prices");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_site_markers, Config};
    use crate::fetch::HttpFetcher;
    use crate::store::ProductStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn setup_ctx() -> (AppContext, TempDir) {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.db_file = tmp.path().join("products.db");
        let store = ProductStore::open(&config.paths.db_file).await.unwrap();
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch).unwrap());
        (AppContext::new(config, store, fetcher), tmp)
    }

    #[test]
    fn test_validate_product_url() {
        let markers = default_site_markers();
        assert!(validate_product_url("https://www.amazon.com/dp/B0001", &markers).is_ok());
        assert!(validate_product_url("https://www.amazon.co.uk/dp/B0001", &markers).is_ok());
        assert!(validate_product_url("https://www.example.com/item/1", &markers).is_err());
        assert!(validate_product_url("   ", &markers).is_err());
    }

    #[test]
    fn test_validate_target_price() {
        assert!(validate_target_price(19.99).is_ok());
        assert!(validate_target_price(0.0).is_err());
        assert!(validate_target_price(-5.0).is_err());
        assert!(validate_target_price(f64::INFINITY).is_err());
    }

    #[tokio::test]
    async fn test_rejected_url_writes_nothing() {
        let (ctx, _tmp) = setup_ctx().await;

        let result = cmd_add(&ctx, "https://shop.example.com/item/9", 10.0).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(ctx.store.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_target_writes_nothing() {
        let (ctx, _tmp) = setup_ctx().await;

        let result = cmd_add(&ctx, "https://www.amazon.com/dp/B0001", 0.0).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(ctx.store.list_products().await.unwrap().is_empty());
    }
}
