//! # Inventory API Seam
//!
//! The cache talks to the remote inventory service through [`InventoryApi`].
//! This module also owns the wire format of that service and turns it into
//! [`CachedProduct`] values.
//!
//! ## Response Envelope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {                                                                      │
//! │    "success": true,                                                     │
//! │    "message": "ok",                                                     │
//! │    "data": [ record, ... ]          or  { "items": [ record, ... ] }    │
//! │    "pagination": { "page": 1, "page_size": 1000,                        │
//! │                    "total": 2310, "total_pages": 3 }                    │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Nullable Columns
//! The backend leaks its SQL null wrappers into JSON. Every field of a record
//! may arrive in any of these shapes:
//!
//! ```text
//! "barcode": "5449000000996"
//! "barcode": null
//! "barcode": { "String": "5449000000996", "Valid": true }
//! "barcode": { "String": "", "Valid": false }          -> None
//! "current_stock": { "Int64": 12, "Valid": true }
//! "selling_price": { "Float64": 1.5, "Valid": true }
//! "selling_price": "1.50"
//! ```
//!
//! They are all flattened to plain optionals here, so nothing above this
//! module ever sees a wrapper.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tillpoint_core::{CachedProduct, Money, ValidationError};
use tracing::warn;

use crate::error::{InventoryError, InventoryResult};

// =============================================================================
// The Seam
// =============================================================================

/// Source of a store's full inventory listing.
///
/// `HttpInventoryApi` is the production implementation; tests plug in
/// counting or gated fakes.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Fetches every inventory record of `store_id`.
    async fn fetch_store_inventory(&self, store_id: &str) -> InventoryResult<Vec<CachedProduct>>;
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<PageData>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageData {
    List(Vec<Value>),
    Wrapped { items: Vec<Value> },
}

/// Paging metadata reported by the API.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// One inventory record as the API sends it.
///
/// Every field is a raw JSON value because any of them may be wrapped.
#[derive(Debug, Default, Deserialize)]
struct InventoryRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    inventory_id: Option<Value>,
    #[serde(default)]
    product_id: Option<Value>,
    #[serde(default)]
    sku: Option<Value>,
    #[serde(default)]
    barcode: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    product_name: Option<Value>,
    #[serde(default)]
    unit_of_measure: Option<Value>,
    #[serde(default)]
    buying_price: Option<Value>,
    #[serde(default)]
    selling_price: Option<Value>,
    #[serde(default)]
    current_stock: Option<Value>,
    #[serde(default)]
    available_stock: Option<Value>,
}

/// One decoded page.
#[derive(Debug, Default)]
pub struct InventoryPage {
    /// Records that mapped cleanly.
    pub products: Vec<CachedProduct>,

    /// Records on the page before mapping (used to detect the last page).
    pub raw_count: usize,

    /// Records dropped because they could not be mapped.
    pub skipped: usize,

    pub pagination: Option<Pagination>,
}

// =============================================================================
// Decoding
// =============================================================================

/// Decodes one response body.
///
/// A record that cannot be mapped is skipped with a warning. One bad row
/// should not hide the rest of the store.
pub fn parse_page(body: &[u8]) -> InventoryResult<InventoryPage> {
    let envelope: Envelope = serde_json::from_slice(body)?;

    if !envelope.success {
        return Err(InventoryError::Api {
            message: envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "request was not successful".to_string()),
        });
    }

    let rows = match envelope.data {
        Some(PageData::List(rows)) | Some(PageData::Wrapped { items: rows }) => rows,
        None => Vec::new(),
    };

    let mut page = InventoryPage {
        products: Vec::with_capacity(rows.len()),
        raw_count: rows.len(),
        skipped: 0,
        pagination: envelope.pagination,
    };

    for row in rows {
        let mapped = serde_json::from_value::<InventoryRecord>(row)
            .map_err(InventoryError::from)
            .and_then(InventoryRecord::into_product);

        match mapped {
            Ok(product) => page.products.push(product),
            Err(e) => {
                page.skipped += 1;
                warn!(error = %e, "Skipping unreadable inventory record");
            }
        }
    }

    Ok(page)
}

impl InventoryRecord {
    fn into_product(self) -> InventoryResult<CachedProduct> {
        let product_id = text(self.product_id.as_ref())
            .ok_or_else(|| InventoryError::Malformed("record has no product_id".into()))?;

        let inventory_record_id = text(self.id.as_ref())
            .or_else(|| text(self.inventory_id.as_ref()))
            .unwrap_or_else(|| product_id.clone());

        let current_stock = integer(self.current_stock.as_ref())?.unwrap_or(0).max(0);
        let available_stock = integer(self.available_stock.as_ref())?
            .unwrap_or(current_stock)
            .clamp(0, current_stock);

        Ok(CachedProduct {
            product_id,
            inventory_record_id,
            sku: text(self.sku.as_ref()).unwrap_or_default(),
            barcode: text(self.barcode.as_ref()),
            name: text(self.name.as_ref())
                .or_else(|| text(self.product_name.as_ref()))
                .unwrap_or_default(),
            unit_of_measure: text(self.unit_of_measure.as_ref()).unwrap_or_default(),
            buying_price: money(self.buying_price.as_ref())?,
            selling_price: money(self.selling_price.as_ref())?,
            current_stock,
            available_stock,
        })
    }
}

// =============================================================================
// Nullable Normalization
// =============================================================================

/// Strips a `{"<Type>": v, "Valid": b}` wrapper. Null and invalid become `None`.
fn unwrap_nullable(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Null => None,
        Value::Object(map) if map.contains_key("Valid") => {
            if !map.get("Valid").and_then(Value::as_bool).unwrap_or(false) {
                return None;
            }
            ["String", "Int64", "Int32", "Float64", "Bool"]
                .iter()
                .find_map(|key| map.get(*key))
                .filter(|v| !v.is_null())
        }
        other => Some(other),
    }
}

/// Text field, trimmed. Empty text is `None`.
fn text(value: Option<&Value>) -> Option<String> {
    let s = match unwrap_nullable(value)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Whole-number field. Accepts integers, integral floats and numeric strings.
fn integer(value: Option<&Value>) -> InventoryResult<Option<i64>> {
    let Some(v) = unwrap_nullable(value) else {
        return Ok(None);
    };

    let parsed = match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed
        .map(Some)
        .ok_or_else(|| InventoryError::Malformed(format!("expected a whole number, got {}", v)))
}

/// Price field. Missing prices are zero; negative prices are rejected.
fn money(value: Option<&Value>) -> InventoryResult<Money> {
    let amount = match unwrap_nullable(value) {
        None => return Ok(Money::zero()),
        Some(Value::Number(n)) => number_to_money(n)?,
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(Money::zero()),
        Some(Value::String(s)) => Money::parse_decimal(s)?,
        Some(other) => {
            return Err(InventoryError::Malformed(format!(
                "expected a price, got {}",
                other
            )))
        }
    };

    if amount.is_negative() {
        return Err(ValidationError::InvalidAmount {
            value: amount.to_string(),
            reason: "price cannot be negative".into(),
        }
        .into());
    }
    Ok(amount)
}

/// JSON numbers are binary doubles on the wire (`6.8999999999999995`), so
/// they are rounded to the nearest cent. Strings go through the exact parser.
fn number_to_money(n: &serde_json::Number) -> InventoryResult<Money> {
    if let Some(units) = n.as_i64() {
        return units
            .checked_mul(100)
            .map(Money::from_cents)
            .ok_or_else(|| InventoryError::Malformed(format!("price out of range: {}", n)));
    }

    match n.as_f64() {
        Some(f) if f.is_finite() && (f * 100.0).abs() < i64::MAX as f64 => {
            Ok(Money::from_cents((f * 100.0).round() as i64))
        }
        _ => Err(InventoryError::Malformed(format!("price out of range: {}", n))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(body: Value) -> InventoryResult<InventoryPage> {
        parse_page(body.to_string().as_bytes())
    }

    #[test]
    fn test_plain_record() {
        let parsed = page(json!({
            "success": true,
            "data": [{
                "id": "inv-1",
                "product_id": "p-1",
                "sku": "COKE-330",
                "barcode": "5449000000996",
                "name": "Coca-Cola 330ml",
                "unit_of_measure": "pcs",
                "buying_price": 0.6,
                "selling_price": "1.50",
                "current_stock": 24,
                "available_stock": 20
            }]
        }))
        .unwrap();

        assert_eq!(parsed.raw_count, 1);
        let p = &parsed.products[0];
        assert_eq!(p.inventory_record_id, "inv-1");
        assert_eq!(p.barcode.as_deref(), Some("5449000000996"));
        assert_eq!(p.buying_price, Money::from_cents(60));
        assert_eq!(p.selling_price, Money::from_cents(150));
        assert_eq!((p.current_stock, p.available_stock), (24, 20));
    }

    #[test]
    fn test_wrapped_nullable_fields() {
        let parsed = page(json!({
            "success": true,
            "data": { "items": [{
                "inventory_id": "inv-2",
                "product_id": { "String": "p-2", "Valid": true },
                "sku": "TIDE-1L",
                "barcode": { "String": "", "Valid": false },
                "product_name": { "String": "Tide 1L", "Valid": true },
                "selling_price": { "Float64": 7.25, "Valid": true },
                "current_stock": { "Int64": 3, "Valid": true },
                "available_stock": { "Int64": 0, "Valid": false }
            }]},
            "pagination": { "page": 1, "page_size": 1000, "total": 1, "total_pages": 1 }
        }))
        .unwrap();

        let p = &parsed.products[0];
        assert_eq!(p.product_id, "p-2");
        assert_eq!(p.inventory_record_id, "inv-2");
        assert_eq!(p.barcode, None);
        assert_eq!(p.name, "Tide 1L");
        assert_eq!(p.selling_price, Money::from_cents(725));
        assert_eq!(p.buying_price, Money::zero());
        // Missing available stock falls back to current stock.
        assert_eq!(p.available_stock, 3);
        assert_eq!(parsed.pagination.unwrap().total_pages, Some(1));
    }

    #[test]
    fn test_stock_is_clamped() {
        let parsed = page(json!({
            "data": [
                { "product_id": "p-1", "current_stock": -4, "available_stock": -1 },
                { "product_id": "p-2", "current_stock": 5, "available_stock": 9 }
            ]
        }))
        .unwrap();

        assert_eq!(parsed.products[0].current_stock, 0);
        assert_eq!(parsed.products[0].available_stock, 0);
        assert_eq!(parsed.products[1].available_stock, 5);
    }

    #[test]
    fn test_bad_record_is_skipped() {
        let parsed = page(json!({
            "success": true,
            "data": [
                { "sku": "NO-PRODUCT-ID" },
                { "product_id": "p-1", "selling_price": "abc" },
                { "product_id": "p-2", "selling_price": -1.0 },
                { "product_id": "p-3", "sku": "OK" }
            ]
        }))
        .unwrap();

        assert_eq!(parsed.raw_count, 4);
        assert_eq!(parsed.skipped, 3);
        assert_eq!(parsed.products.len(), 1);
        assert_eq!(parsed.products[0].sku, "OK");
    }

    #[test]
    fn test_float_prices_round_to_cents() {
        let parsed = page(json!({
            "data": [
                {
                    "product_id": "p-1",
                    "buying_price": 3,
                    "selling_price": 6.8999999999999995
                },
                {
                    "product_id": "p-2",
                    "buying_price": { "Float64": 0.1 + 0.2, "Valid": true },
                    "selling_price": 19.99
                }
            ]
        }))
        .unwrap();

        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.products[0].buying_price, Money::from_cents(300));
        assert_eq!(parsed.products[0].selling_price, Money::from_cents(690));
        assert_eq!(parsed.products[1].buying_price, Money::from_cents(30));
        assert_eq!(parsed.products[1].selling_price, Money::from_cents(1999));
    }

    #[test]
    fn test_string_prices_stay_exact() {
        let parsed = page(json!({
            "data": [{ "product_id": "p-1", "selling_price": "6.8999999999999995" }]
        }))
        .unwrap();
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_unsuccessful_envelope() {
        let err = page(json!({ "success": false, "message": "store not found" })).unwrap_err();
        assert!(matches!(err, InventoryError::Api { ref message } if message == "store not found"));

        let err = page(json!({ "success": false })).unwrap_err();
        assert!(matches!(err, InventoryError::Api { .. }));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            parse_page(b"<html>502 Bad Gateway</html>"),
            Err(InventoryError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_data_is_empty_page() {
        let parsed = page(json!({ "success": true })).unwrap();
        assert!(parsed.products.is_empty());
        assert_eq!(parsed.raw_count, 0);
    }
}
