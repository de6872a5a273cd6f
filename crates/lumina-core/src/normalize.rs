//! Projection from a raw [`ProductRecord`] to the client-facing
//! [`NormalizedProduct`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{fields, stringify_id, ProductRecord, NULL_ID};

/// A catalog record as served to clients. Field names on the wire are the
/// ones the storefront front-end reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProduct {
    #[serde(rename = "p_id")]
    pub id: String,
    pub name: String,
    pub brand: String,
    pub rating: Value,
    /// List price; always finite.
    #[serde(rename = "prices")]
    pub price: f64,
    /// Always finite; equals `price` when the record has no usable discount.
    pub discounted_price: f64,
    pub img_link: String,
    #[serde(rename = "p_link")]
    pub product_link: String,
}

/// Normalizes a raw record. Never fails; unusable fields fall back to defaults.
#[must_use]
pub fn normalize_product(record: &ProductRecord) -> NormalizedProduct {
    let price = parse_price(record.get(fields::ACTUAL_PRICE)).unwrap_or(0.0);
    let discounted_price = parse_price(record.get(fields::DISCOUNTED_PRICE)).unwrap_or(price);

    NormalizedProduct {
        // Output id always comes from the numeric id, even when the catalog
        // key was derived from the generic id.
        id: record
            .get(fields::NUMERIC_ID)
            .map_or_else(|| NULL_ID.to_string(), stringify_id),
        name: text_or(record, fields::NAME, "Unknown"),
        brand: text_or(record, fields::BRAND, "Generic"),
        rating: record
            .get(fields::RATING)
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::from(0)),
        price,
        discounted_price,
        img_link: text_or(record, fields::IMAGE_LINK, ""),
        product_link: text_or(record, fields::PRODUCT_LINK, "#"),
    }
}

fn text_or(record: &ProductRecord, key: &str, default: &str) -> String {
    record
        .text(key)
        .map_or_else(|| default.to_string(), std::borrow::Cow::into_owned)
}

/// Reads a price from a JSON number or numeric string. Non-finite values are rejected.
fn parse_price(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    parsed.filter(|p| p.is_finite())
}
