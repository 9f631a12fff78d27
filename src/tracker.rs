//! Price tracking cycle
//!
//! One cycle walks every tracked product in store order: fetch the page, read
//! the price, append it to the history, compare it with the target, and send
//! an alert when the target is reached. A product whose price cannot be read
//! is reported and skipped; it never stops the cycle.

use crate::context::AppContext;
use crate::error::Result;
use crate::notify::PriceAlert;
use crate::parse::{parse_name, parse_price, UNKNOWN_PRODUCT};
use crate::progress::CycleProgress;
use crate::store::{format_timestamp, Product, Upserted};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of comparing a current price with a target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceVerdict {
    /// Price is at or below target
    Drop { savings: f64 },
    /// Price is still above target
    Waiting { deficit: f64 },
}

impl PriceVerdict {
    pub fn is_drop(&self) -> bool {
        matches!(self, PriceVerdict::Drop { .. })
    }
}

/// The alert predicate: `current <= target`, boundary inclusive
pub fn evaluate(current_price: f64, target_price: f64) -> PriceVerdict {
    if current_price <= target_price {
        PriceVerdict::Drop {
            savings: target_price - current_price,
        }
    } else {
        PriceVerdict::Waiting {
            deficit: current_price - target_price,
        }
    }
}

/// Result of checking one product during a cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckStatus {
    PriceDrop { savings: f64, notified: bool },
    Waiting { deficit: f64 },
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCheck {
    pub product_id: i64,
    pub name: String,
    pub url: String,
    pub target_price: f64,
    pub current_price: Option<f64>,
    #[serde(flatten)]
    pub status: CheckStatus,
}

/// Everything that happened in one cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleReport {
    pub started_at: String,
    pub checks: Vec<ProductCheck>,
}

impl CycleReport {
    pub fn checked(&self) -> usize {
        self.checks.len()
    }

    pub fn drops(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| matches!(c.status, CheckStatus::PriceDrop { .. }))
            .count()
    }

    pub fn unavailable(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Unavailable)
            .count()
    }
}

/// Fetch a page and read its current price; `None` on any failure
pub async fn current_price(ctx: &AppContext, url: &str) -> Option<f64> {
    match ctx.fetcher.fetch(url).await {
        Ok(markup) => parse_price(&markup),
        Err(e) => {
            warn!(%url, "Error fetching price: {}", e);
            None
        }
    }
}

/// Fetch a page and read its display name; falls back to the unknown sentinel
pub async fn product_name(ctx: &AppContext, url: &str) -> String {
    match ctx.fetcher.fetch(url).await {
        Ok(markup) => parse_name(&markup),
        Err(e) => {
            warn!(%url, "Error fetching product name: {}", e);
            UNKNOWN_PRODUCT.to_string()
        }
    }
}

/// A product after it was added or refreshed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddedProduct {
    pub id: i64,
    pub name: String,
    pub target_price: f64,
    pub created: bool,
}

/// Resolve the product's current name and insert or update it by URL
pub async fn add_product(ctx: &AppContext, url: &str, target_price: f64) -> Result<AddedProduct> {
    let name = product_name(ctx, url).await;
    let Upserted { id, created } = ctx.store.upsert_product(url, &name, target_price).await?;
    Ok(AddedProduct {
        id,
        name,
        target_price,
        created,
    })
}

/// Run one tracking cycle over all products
pub async fn run_once(ctx: &AppContext) -> Result<CycleReport> {
    let products = ctx.store.list_products().await?;
    let mut report = CycleReport {
        started_at: format_timestamp(Utc::now()),
        checks: Vec::with_capacity(products.len()),
    };

    info!("Tracking {} products...", products.len());
    let progress = CycleProgress::new(products.len());
    let delay = ctx.request_delay();

    for (idx, product) in products.iter().enumerate() {
        progress.checking(&product.name);
        report.checks.push(check_product(ctx, product).await?);
        progress.advance();

        if idx + 1 < products.len() && !delay.is_zero() {
            progress.pausing();
            tokio::time::sleep(delay).await;
        }
    }

    Ok(report)
}

async fn check_product(ctx: &AppContext, product: &Product) -> Result<ProductCheck> {
    let mut check = ProductCheck {
        product_id: product.id,
        name: product.name.clone(),
        url: product.url.clone(),
        target_price: product.target_price,
        current_price: None,
        status: CheckStatus::Unavailable,
    };

    let Some(price) = current_price(ctx, &product.url).await else {
        warn!(product_id = product.id, "Failed to fetch price for {}", product.name);
        return Ok(check);
    };

    ctx.store
        .record_observation(product.id, price, Utc::now())
        .await?;
    check.current_price = Some(price);

    check.status = match evaluate(price, product.target_price) {
        PriceVerdict::Drop { savings } => {
            info!(
                product_id = product.id,
                price, "PRICE DROP ALERT for {}: save ${:.2}", product.name, savings
            );
            let alert = PriceAlert {
                product_name: product.name.clone(),
                url: product.url.clone(),
                current_price: price,
                target_price: product.target_price,
            };
            let notified = ctx.notifier.notify(&alert).await;
            CheckStatus::PriceDrop { savings, notified }
        }
        PriceVerdict::Waiting { deficit } => {
            info!(
                product_id = product.id,
                price, "Waiting for price drop on {} (-${:.2})", product.name, deficit
            );
            CheckStatus::Waiting { deficit }
        }
    };

    Ok(check)
}
