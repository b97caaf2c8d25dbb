//! # Domain Types
//!
//! Types shared by the inventory cache, the scan filter and the frontend.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────┐   ┌──────────────────┐  │
//! │  │   CachedProduct     │   │   ScanEvent     │   │  ScanResolution  │  │
//! │  │  ─────────────────  │   │  ─────────────  │   │  ──────────────  │  │
//! │  │  product_id         │   │  code           │   │  Found           │  │
//! │  │  inventory_record_id│   │  scanned_at     │   │  OutOfStock      │  │
//! │  │  sku / barcode      │   └─────────────────┘   │  Unknown         │  │
//! │  │  prices (Money)     │                         └──────────────────┘  │
//! │  │  current/available  │                                               │
//! │  └─────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Cached Product
// =============================================================================

/// A denormalized read snapshot of one inventory line for one store.
///
/// ## Stock Semantics
/// `available_stock <= current_stock`. The difference is stock reserved by
/// open orders. A product with `available_stock <= 0` stays in the cache so
/// that a scan can report "out of stock" instead of "unknown product".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CachedProduct {
    /// Catalog product id.
    pub product_id: String,

    /// Store-level inventory line id.
    pub inventory_record_id: String,

    /// Stock Keeping Unit.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, ...). `None` when the product has no label.
    pub barcode: Option<String>,

    /// Display name shown to the cashier.
    pub name: String,

    /// Unit of measure ("pcs", "kg", ...). May be empty.
    pub unit_of_measure: String,

    /// Cost price.
    pub buying_price: Money,

    /// Shelf price.
    pub selling_price: Money,

    /// Stock on hand.
    pub current_stock: i64,

    /// Stock that can still be sold.
    pub available_stock: i64,
}

impl CachedProduct {
    /// Whether the product can be added to a sale right now.
    #[inline]
    pub fn is_purchasable(&self) -> bool {
        self.available_stock > 0
    }

    /// Gross margin per unit.
    #[inline]
    pub fn margin(&self) -> Money {
        self.selling_price - self.buying_price
    }
}

// =============================================================================
// Scan Event
// =============================================================================

/// One distinct physical scan, after camera stutter has been filtered out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScanEvent {
    /// The trimmed decoded text.
    pub code: String,

    /// When the scan was accepted.
    #[ts(as = "String")]
    pub scanned_at: DateTime<Utc>,
}

// =============================================================================
// Scan Resolution
// =============================================================================

/// Outcome of resolving a scanned code against the inventory cache.
///
/// ## Why Three Outcomes?
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Unknown     → catalog problem: label not registered for this store    │
/// │  OutOfStock  → legitimate "cannot sell": product exists, stock <= 0    │
/// │  Found       → add to cart                                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum ScanResolution {
    /// Known product with available stock.
    Found { product: CachedProduct },

    /// Known product that cannot be sold.
    OutOfStock { product: CachedProduct },

    /// No product with this code in the current snapshot.
    Unknown { code: String },
}

impl ScanResolution {
    /// Builds a resolution from a lookup result.
    pub fn from_lookup(code: &str, product: Option<&CachedProduct>) -> Self {
        match product {
            Some(p) if p.is_purchasable() => ScanResolution::Found { product: p.clone() },
            Some(p) => ScanResolution::OutOfStock { product: p.clone() },
            None => ScanResolution::Unknown {
                code: code.trim().to_string(),
            },
        }
    }

    /// Returns the product for Found / OutOfStock.
    pub fn product(&self) -> Option<&CachedProduct> {
        match self {
            ScanResolution::Found { product } | ScanResolution::OutOfStock { product } => {
                Some(product)
            }
            ScanResolution::Unknown { .. } => None,
        }
    }

    /// Converts into a sellable product or the matching [`crate::CoreError`].
    pub fn into_sellable(self) -> crate::CoreResult<CachedProduct> {
        match self {
            ScanResolution::Found { product } => Ok(product),
            ScanResolution::OutOfStock { product } => Err(crate::CoreError::OutOfStock {
                sku: product.sku,
                available: product.available_stock,
            }),
            ScanResolution::Unknown { code } => Err(crate::CoreError::ProductNotFound(code)),
        }
    }
}
