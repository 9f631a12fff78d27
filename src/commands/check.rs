//! Check command - run one tracking cycle

use crate::context::AppContext;
use crate::error::Result;
use crate::tracker::{self, CheckStatus, CycleReport};
use tracing::info;

/// Run one tracking cycle over every product
pub async fn cmd_check(ctx: &AppContext) -> Result<CycleReport> {
    info!("Starting one-time price check");
    tracker::run_once(ctx).await
}

/// Print a per-product report for a cycle
pub fn print_report(report: &CycleReport) {
    if report.checks.is_empty() {
        println!("No products are being tracked. Add one with 'pricewatch add'.");
        return;
    }

    for check in &report.checks {
        let Some(price) = check.current_price else {
            println!("Failed to fetch price for {}", check.name);
            println!();
            continue;
        };

        println!("PRODUCT: {}", check.name);
        println!("CURRENT PRICE: ${:.2}", price);
        println!("TARGET PRICE: ${:.2}", check.target_price);
        match &check.status {
            CheckStatus::PriceDrop { savings, notified } => {
                println!("STATUS: ✅ PRICE DROP ALERT! Save ${:.2}", savings);
                if *notified {
                    println!("NOTIFICATION: Email sent");
                }
            }
            CheckStatus::Waiting { deficit } => {
                println!("STATUS: Waiting for price drop (-${:.2})", deficit);
            }
            CheckStatus::Unavailable => {}
        }
        println!("PRICE HISTORY: pricewatch chart {}", check.product_id);
        println!();
    }

    println!(
        "✓ Checked {} products: {} price drops, {} unavailable",
        report.checked(),
        report.drops(),
        report.unavailable()
    );
}
