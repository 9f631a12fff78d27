//! Product storage using SQLite
//!
//! This module handles all persisted state:
//! - Products (tracked URLs with a target price)
//! - Price history (append-only observations per product)
//!
//! Every statement acquires a pooled connection for its own duration and
//! commits on its own; nothing spans multiple products.

mod schema;

pub use schema::*;

use crate::error::Result;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::path::Path;
use tracing::{debug, info};

/// A tracked product
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub target_price: f64,
}

/// One timestamped price reading
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PriceObservation {
    pub id: i64,
    pub product_id: i64,
    pub price: f64,
    pub timestamp: String,
}

impl PriceObservation {
    /// Parse the stored ISO-8601 timestamp.
    ///
    /// Rows written by this crate are RFC 3339 in UTC; naive timestamps
    /// (no offset) are read as UTC.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// A product together with its most recent observation
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub target_price: f64,
    pub latest_price: Option<f64>,
    pub latest_at: Option<String>,
}

/// Result of adding a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upserted {
    pub id: i64,
    pub created: bool,
}

/// Format a timestamp the way it is stored in `price_history`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Product database handle
#[derive(Clone)]
pub struct ProductStore {
    pool: SqlitePool,
}

impl ProductStore {
    /// Open (creating if needed) the database at `db_path` and ensure the schema exists
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        debug!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool, waiting for outstanding connections to be released
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ===== Product Operations =====

    /// Insert a product, or update name and target price in place when the URL exists
    pub async fn upsert_product(&self, url: &str, name: &str, target_price: f64) -> Result<Upserted> {
        if let Some(existing) = self.get_product_by_url(url).await? {
            sqlx::query("UPDATE products SET name = ?, target_price = ? WHERE id = ?")
                .bind(name)
                .bind(target_price)
                .bind(existing.id)
                .execute(&self.pool)
                .await?;
            info!(product_id = existing.id, "Updated product: {}", name);
            return Ok(Upserted {
                id: existing.id,
                created: false,
            });
        }

        let result = sqlx::query("INSERT INTO products (name, url, target_price) VALUES (?, ?, ?)")
        .bind(name)
        .bind(url)
        .bind(target_price)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(product_id = id, "Added product: {}", name);
        Ok(Upserted { id, created: true })
    }

    /// Get product by ID
    pub async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, url, target_price FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    /// Get product by URL
    pub async fn get_product_by_url(&self, url: &str) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, url, target_price FROM products WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    /// List all products
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, url, target_price FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// List all products with their latest observed price
    pub async fn list_product_summaries(&self) -> Result<Vec<ProductSummary>> {
        let rows = sqlx::query_as::<_, ProductSummary>(
            r#"
            SELECT p.id, p.name, p.url, p.target_price,
                (SELECT h.price FROM price_history h WHERE h.product_id = p.id
                    ORDER BY h.timestamp DESC, h.id DESC LIMIT 1) AS latest_price,
                (SELECT h.timestamp FROM price_history h WHERE h.product_id = p.id
                    ORDER BY h.timestamp DESC, h.id DESC LIMIT 1) AS latest_at
            FROM products p
            ORDER BY p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ===== Price History Operations =====

    /// Append one observation
    pub async fn record_observation(
        &self,
        product_id: i64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO price_history (product_id, price, timestamp) VALUES (?, ?, ?)",
        )
        .bind(product_id)
        .bind(price)
        .bind(format_timestamp(timestamp))
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Full price history for a product, oldest first
    pub async fn history_for(&self, product_id: i64) -> Result<Vec<PriceObservation>> {
        let rows = sqlx::query_as::<_, PriceObservation>(
            r#"
            SELECT id, product_id, price, timestamp FROM price_history
            WHERE product_id = ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    async fn setup_test_db() -> (ProductStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = ProductStore::open(&tmp.path().join("test.db")).await.unwrap();
        (store, tmp)
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_on_url() {
        let (store, _tmp) = setup_test_db().await;
        let url = "https://www.amazon.com/dp/B000000001";

        let first = store.upsert_product(url, "Old Name", 50.0).await.unwrap();
        assert!(first.created);

        let second = store.upsert_product(url, "New Name", 42.5).await.unwrap();
        assert!(!second.created);
        assert_eq!(first.id, second.id);

        let products = store.list_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "New Name");
        assert_eq!(products[0].target_price, 42.5);
    }

    #[tokio::test]
    async fn test_upsert_returns_row_id_for_each_url() {
        let (store, _tmp) = setup_test_db().await;
        let first_url = "https://www.amazon.com/dp/FIRST";
        let second_url = "https://www.amazon.com/dp/SECOND";

        let first = store.upsert_product(first_url, "First", 10.0).await.unwrap();
        let second = store.upsert_product(second_url, "Second", 20.0).await.unwrap();
        assert!(second.created);
        assert_ne!(first.id, second.id);

        let again = store.upsert_product(first_url, "First v2", 9.0).await.unwrap();
        assert_eq!(again, Upserted { id: first.id, created: false });

        for (url, upserted) in [(first_url, again), (second_url, second)] {
            let stored = store.get_product_by_url(url).await.unwrap().unwrap();
            assert_eq!(stored.id, upserted.id);
        }
    }

    #[tokio::test]
    async fn test_get_product() {
        let (store, _tmp) = setup_test_db().await;
        let added = store
            .upsert_product("https://www.amazon.com/dp/X", "Widget", 10.0)
            .await
            .unwrap();

        let loaded = store.get_product(added.id).await.unwrap().unwrap();
        assert_eq!(loaded.url, "https://www.amazon.com/dp/X");
        assert!(store.get_product(added.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_history_is_ordered_by_timestamp() {
        let (store, _tmp) = setup_test_db().await;
        let product = store
            .upsert_product("https://www.amazon.com/dp/Y", "Gadget", 20.0)
            .await
            .unwrap();

        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        store
            .record_observation(product.id, 25.0, base + Duration::hours(2))
            .await
            .unwrap();
        store.record_observation(product.id, 27.0, base).await.unwrap();
        store
            .record_observation(product.id, 19.0, base + Duration::hours(4))
            .await
            .unwrap();

        let history = store.history_for(product.id).await.unwrap();
        let prices: Vec<f64> = history.iter().map(|h| h.price).collect();
        assert_eq!(prices, vec![27.0, 25.0, 19.0]);

        let times: Vec<_> = history.iter().map(|h| h.observed_at().unwrap()).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(times[2], base + Duration::hours(4));
    }

    #[tokio::test]
    async fn test_duplicate_timestamps_are_kept() {
        let (store, _tmp) = setup_test_db().await;
        let product = store
            .upsert_product("https://www.amazon.com/dp/Z", "Thing", 5.0)
            .await
            .unwrap();

        let now = Utc::now();
        store.record_observation(product.id, 6.0, now).await.unwrap();
        store.record_observation(product.id, 6.0, now).await.unwrap();

        assert_eq!(store.history_for(product.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_summaries_include_latest_price() {
        let (store, _tmp) = setup_test_db().await;
        let tracked = store
            .upsert_product("https://www.amazon.com/dp/A", "Tracked", 20.0)
            .await
            .unwrap();
        store
            .upsert_product("https://www.amazon.com/dp/B", "Fresh", 30.0)
            .await
            .unwrap();

        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        store.record_observation(tracked.id, 24.0, base).await.unwrap();
        store
            .record_observation(tracked.id, 21.0, base + Duration::days(1))
            .await
            .unwrap();

        let summaries = store.list_product_summaries().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].latest_price, Some(21.0));
        assert_eq!(summaries[1].latest_price, None);
        assert!(summaries[1].latest_at.is_none());
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(ts)), Some(ts));
        assert_eq!(parse_timestamp("2024-05-06T07:08:09.000000"), Some(ts));
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
