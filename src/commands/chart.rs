//! Chart command - render a product's price history

use crate::chart::{self, default_chart_path, ChartOutcome};
use crate::context::AppContext;
use crate::error::Result;
use std::path::PathBuf;

/// Render the chart to `output`, or to the default charts directory
pub async fn cmd_chart(
    ctx: &AppContext,
    product_id: i64,
    output: Option<PathBuf>,
) -> Result<ChartOutcome> {
    let output =
        output.unwrap_or_else(|| default_chart_path(&ctx.config.charts_dir(), product_id));
    chart::render(&ctx.store, product_id, &output).await
}

pub fn print_chart_outcome(outcome: &ChartOutcome) {
    match outcome {
        ChartOutcome::NoHistory => println!("No price history available"),
        ChartOutcome::Written { path } => println!("✓ Chart saved to {}", path.display()),
    }
}
