//! pricewatch - track product prices and get alerted when they drop
//!
//! This crate provides:
//! - Product page fetching and price/name extraction
//! - A SQLite store of tracked products and their price history
//! - A tracking cycle that records prices and sends email alerts
//! - Scheduled repetition of the cycle and price history charts

pub mod chart;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod parse;
pub mod progress;
pub mod schedule;
pub mod store;
pub mod tracker;

pub use config::Config;
pub use context::AppContext;
pub use error::{Error, Result};
