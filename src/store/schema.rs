//! SQLite schema definition

/// SQL schema for the product database
pub const SCHEMA_SQL: &str = r#"
-- Products: tracked items, one row per URL
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    target_price REAL NOT NULL
);

-- Price history: append-only observations
CREATE TABLE IF NOT EXISTS price_history (
    id INTEGER PRIMARY KEY,
    product_id INTEGER NOT NULL REFERENCES products(id),
    price REAL NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_price_history_product ON price_history(product_id, timestamp);
"#;
