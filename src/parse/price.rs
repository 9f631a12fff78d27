//! Price extraction with layout fallback
//!
//! Two layouts are known. The split layout renders the integer part and the
//! cents in separate elements; the offscreen layout holds the whole formatted
//! price in one element. The split layout wins whenever it is present.

use super::first_text;
use regex::Regex;
use scraper::Html;
use std::sync::OnceLock;

/// Which page layout a price was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceLayout {
    /// `a-price-whole` + `a-price-fraction`
    Split,
    /// single `a-offscreen` element
    Offscreen,
}

/// A price read from a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceReading {
    pub value: f64,
    pub layout: PriceLayout,
}

fn non_numeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d.]").expect("static pattern"))
}

/// Extract the current price from page markup
pub fn parse_price(markup: &str) -> Option<f64> {
    extract_price(&Html::parse_document(markup)).map(|reading| reading.value)
}

/// Extract the current price from a parsed document
pub fn extract_price(document: &Html) -> Option<PriceReading> {
    let whole = first_text(document, "span.a-price-whole");
    let fraction = first_text(document, "span.a-price-fraction");

    if let (Some(whole), Some(fraction)) = (whole, fraction) {
        return parse_split(&whole, &fraction).map(|value| PriceReading {
            value,
            layout: PriceLayout::Split,
        });
    }

    let offscreen = first_text(document, "span.a-offscreen")?;
    parse_formatted(&offscreen).map(|value| PriceReading {
        value,
        layout: PriceLayout::Offscreen,
    })
}

/// Join the integer and fractional parts of a split price.
///
/// The whole part may carry a currency symbol, thousands separators, and the
/// decimal point itself (`"$1,299."`); only its digits are kept.
pub fn parse_split(whole: &str, fraction: &str) -> Option<f64> {
    let whole_digits: String = whole.chars().filter(char::is_ascii_digit).collect();
    let fraction_digits: String = fraction.chars().filter(char::is_ascii_digit).collect();

    if whole_digits.is_empty() {
        return None;
    }

    let joined = if fraction_digits.is_empty() {
        whole_digits
    } else {
        format!("{}.{}", whole_digits, fraction_digits)
    };
    positive(joined.parse().ok()?)
}

/// Parse a formatted currency string such as `"$1,299.99"`
pub fn parse_formatted(text: &str) -> Option<f64> {
    let cleaned = non_numeric().replace_all(text.trim(), "");
    positive(cleaned.parse().ok()?)
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}
