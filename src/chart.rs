//! Price history charts
//!
//! Renders one product's history as a line plot with marked points. `.svg`
//! paths use the SVG backend; anything else is written as a bitmap (PNG).

use crate::error::{Error, Result};
use crate::store::{PriceObservation, ProductStore};
use chrono::{DateTime, Duration, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CHART_SIZE: (u32, u32) = (1000, 600);

/// What `render` did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ChartOutcome {
    NoHistory,
    Written { path: PathBuf },
}

/// Render the price history of `product_id` to `output`
pub async fn render(store: &ProductStore, product_id: i64, output: &Path) -> Result<ChartOutcome> {
    let product = store
        .get_product(product_id)
        .await?
        .ok_or(Error::ProductNotFound(product_id))?;

    let history = store.history_for(product_id).await?;
    let points = chart_points(&history);
    if points.is_empty() {
        info!(product_id, "No price history available");
        return Ok(ChartOutcome::NoHistory);
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    debug!(product_id, points = points.len(), "Rendering chart to {:?}", output);
    let title = format!("Price History: {}", product.name);
    let is_svg = output
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("svg"));

    let drawn = if is_svg {
        draw(SVGBackend::new(output, CHART_SIZE).into_drawing_area(), &title, &points)
    } else {
        draw(BitMapBackend::new(output, CHART_SIZE).into_drawing_area(), &title, &points)
    };
    drawn.map_err(|e| Error::Chart(e.to_string()))?;

    info!("Chart saved to {}", output.display());
    Ok(ChartOutcome::Written {
        path: output.to_path_buf(),
    })
}

/// Default chart location for a product
pub fn default_chart_path(charts_dir: &Path, product_id: i64) -> PathBuf {
    charts_dir.join(format!("product-{}.svg", product_id))
}

/// Plot points in time order; rows with unreadable timestamps are skipped
pub fn chart_points(history: &[PriceObservation]) -> Vec<(DateTime<Utc>, f64)> {
    let mut points: Vec<_> = history
        .iter()
        .filter_map(|obs| obs.observed_at().map(|ts| (ts, obs.price)))
        .collect();
    points.sort_by_key(|(ts, _)| *ts);
    points
}

/// X range covering all points; a single point gets a day around it
pub fn time_range(points: &[(DateTime<Utc>, f64)]) -> Option<Range<DateTime<Utc>>> {
    let first = points.first()?.0;
    let last = points.last()?.0;
    if first == last {
        return Some(first - Duration::hours(12)..last + Duration::hours(12));
    }
    Some(first..last)
}

/// Y range covering all prices with 5% headroom on both sides
pub fn price_range(points: &[(DateTime<Utc>, f64)]) -> Option<Range<f64>> {
    let min = points.iter().map(|p| p.1).reduce(f64::min)?;
    let max = points.iter().map(|p| p.1).reduce(f64::max)?;
    let pad = if max > min { (max - min) * 0.05 } else { (max * 0.05).max(1.0) };
    Some((min - pad).max(0.0)..max + pad)
}

fn draw<DB>(
    root: DrawingArea<DB, Shift>,
    title: &str,
    points: &[(DateTime<Utc>, f64)],
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x_range = time_range(points).ok_or_else(|| anyhow::anyhow!("no points to plot"))?;
    let y_range = price_range(points).ok_or_else(|| anyhow::anyhow!("no points to plot"))?;

    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Price ($)")
        .x_label_formatter(&|ts: &DateTime<Utc>| ts.format("%Y-%m-%d").to_string())
        .y_label_formatter(&|price: &f64| format!("{:.2}", price))
        .draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(ts, price)| Circle::new((ts, price), 4, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn obs(id: i64, price: f64, timestamp: &str) -> PriceObservation {
        PriceObservation {
            id,
            product_id: 1,
            price,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_chart_points_sorted_and_filtered() {
        let history = vec![
            obs(1, 20.0, "2024-01-02T00:00:00.000000Z"),
            obs(2, 25.0, "2024-01-01T00:00:00.000000Z"),
            obs(3, 30.0, "garbage"),
        ];
        let points = chart_points(&history);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].1, 25.0);
        assert_eq!(points[1].1, 20.0);
    }

    #[test]
    fn test_ranges() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = vec![(t0, 10.0), (t0 + Duration::days(2), 30.0)];

        let y = price_range(&points).unwrap();
        assert!(y.start < 10.0 && y.end > 30.0);
        assert_eq!(time_range(&points).unwrap(), t0..t0 + Duration::days(2));

        let single = vec![(t0, 50.0)];
        let y = price_range(&single).unwrap();
        assert!(y.start < 50.0 && y.end > 50.0);
        let x = time_range(&single).unwrap();
        assert!(x.start < t0 && x.end > t0);

        assert!(price_range(&[]).is_none());
        assert!(time_range(&[]).is_none());
    }

    #[test]
    fn test_default_chart_path() {
        let path = default_chart_path(Path::new("/data/charts"), 7);
        assert_eq!(path, PathBuf::from("/data/charts/product-7.svg"));
    }

    #[tokio::test]
    async fn test_render_without_history() {
        let tmp = TempDir::new().unwrap();
        let store = ProductStore::open(&tmp.path().join("products.db")).await.unwrap();
        let added = store
            .upsert_product("https://www.amazon.com/dp/NEW", "New Thing", 10.0)
            .await
            .unwrap();

        let output = tmp.path().join("chart.png");
        let outcome = render(&store, added.id, &output).await.unwrap();
        assert_eq!(outcome, ChartOutcome::NoHistory);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_render_writes_svg_and_png() {
        let tmp = TempDir::new().unwrap();
        let store = ProductStore::open(&tmp.path().join("products.db")).await.unwrap();
        let added = store
            .upsert_product("https://www.amazon.com/dp/LAMP", "Desk Lamp", 20.0)
            .await
            .unwrap();

        let base = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        for (hours, price) in [(0, 29.99), (6, 24.50), (12, 19.99)] {
            store
                .record_observation(added.id, price, base + Duration::hours(hours))
                .await
                .unwrap();
        }

        for name in ["history.svg", "nested/history.png"] {
            let output = tmp.path().join(name);
            let outcome = render(&store, added.id, &output).await.unwrap();
            assert_eq!(
                outcome,
                ChartOutcome::Written {
                    path: output.clone()
                }
            );
            assert!(std::fs::metadata(&output).unwrap().len() > 0);
        }

        let svg = std::fs::read_to_string(tmp.path().join("history.svg")).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[tokio::test]
    async fn test_render_unknown_product() {
        let tmp = TempDir::new().unwrap();
        let store = ProductStore::open(&tmp.path().join("products.db")).await.unwrap();

        let result = render(&store, 42, &tmp.path().join("chart.svg")).await;
        assert!(matches!(result, Err(Error::ProductNotFound(42))));
    }
}
