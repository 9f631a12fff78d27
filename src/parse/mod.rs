//! Product page parsing
//!
//! Extracts the display name and current price from a product page. The
//! markup belongs to a third-party site and changes between page templates,
//! so every extractor degrades to a sentinel or `None` instead of failing.

mod price;

pub use price::*;

use scraper::{Html, Selector};

/// Name reported when the title element is missing
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Name and price extracted from one page
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    pub name: String,
    pub price: Option<f64>,
}

impl ParsedPage {
    pub fn parse(markup: &str) -> Self {
        let document = Html::parse_document(markup);
        Self {
            name: name_from_document(&document),
            price: extract_price(&document).map(|reading| reading.value),
        }
    }
}

/// Extract the product display name, or [`UNKNOWN_PRODUCT`]
pub fn parse_name(markup: &str) -> String {
    name_from_document(&Html::parse_document(markup))
}

fn name_from_document(document: &Html) -> String {
    first_text(document, "span#productTitle")
        .map(|title| normalize_whitespace(&title))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string())
}

/// Text content of the first element matching `css`
pub(crate) fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|elem| elem.text().collect::<String>())
}

/// Collapse runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name() {
        let html = r#"
        <html><body>
            <span id="productTitle">
                Acme   Noise-Cancelling
                Headphones
            </span>
        </body></html>
        "#;
        assert_eq!(parse_name(html), "Acme Noise-Cancelling Headphones");
    }

    #[test]
    fn test_missing_name_is_unknown() {
        assert_eq!(parse_name("<html><body><h1>Robot check</h1></body></html>"), UNKNOWN_PRODUCT);
        assert_eq!(parse_name(r#"<span id="productTitle">   </span>"#), UNKNOWN_PRODUCT);
        assert_eq!(parse_name(""), UNKNOWN_PRODUCT);
    }

    #[test]
    fn test_parsed_page() {
        let html = r#"
        <html><body>
            <span id="productTitle">Desk Lamp</span>
            <span class="a-offscreen">$34.50</span>
        </body></html>
        "#;
        let page = ParsedPage::parse(html);
        assert_eq!(page.name, "Desk Lamp");
        assert_eq!(page.price, Some(34.50));
    }
}
