//! # Inventory Snapshot
//!
//! One store's inventory at one point in time, indexed for O(1) lookup.
//!
//! ## Index Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       InventorySnapshot                                 │
//! │                                                                         │
//! │   records: [Arc<A>, Arc<B>, Arc<C>]      (fetch order, for search)      │
//! │                │        │       │                                       │
//! │   barcode_index│        │       │        sku_index                      │
//! │   ─────────────┼────────┼───────┼──      ──────────────────────────     │
//! │   "5449..." ───┘        │       │        "COKE-330" ──► Arc<A>          │
//! │   "0360..." ────────────┘       │        "TIDE-1L"  ──► Arc<B>          │
//! │   (C has no barcode)            │        "BAG-L"    ──► Arc<C>          │
//! │                                                                         │
//! │   Both maps point at the SAME Arc: one allocation per record.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A snapshot is immutable once built. Refreshing the cache builds a new one
//! and swaps the `Arc<InventorySnapshot>` in a single step, so a reader sees
//! either the old indexes or the new ones, never a mix.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::CachedProduct;
use crate::validation::normalize_key;

/// Upper bound on search-box results.
pub const MAX_SEARCH_RESULTS: usize = 100;

/// Immutable, indexed inventory of one store.
#[derive(Debug, Clone)]
pub struct InventorySnapshot {
    store_id: String,
    refreshed_at: DateTime<Utc>,
    records: Vec<Arc<CachedProduct>>,
    barcode_index: HashMap<String, Arc<CachedProduct>>,
    sku_index: HashMap<String, Arc<CachedProduct>>,
}

impl InventorySnapshot {
    /// Builds both indexes in a single pass over the fetched records.
    ///
    /// ## Rules
    /// - Keys are trimmed; records with an empty barcode are not put in the
    ///   barcode index (same for SKU)
    /// - Duplicate keys: the later record wins
    /// - Zero and negative stock records are kept
    pub fn build(
        store_id: impl Into<String>,
        products: impl IntoIterator<Item = CachedProduct>,
        refreshed_at: DateTime<Utc>,
    ) -> Self {
        let products = products.into_iter();
        let (lower, _) = products.size_hint();

        let mut records = Vec::with_capacity(lower);
        let mut barcode_index = HashMap::with_capacity(lower);
        let mut sku_index = HashMap::with_capacity(lower);

        for product in products {
            let product = Arc::new(product);

            if let Some(barcode) = product.barcode.as_deref().and_then(normalize_key) {
                barcode_index.insert(barcode.to_string(), Arc::clone(&product));
            }
            if let Some(sku) = normalize_key(&product.sku) {
                sku_index.insert(sku.to_string(), Arc::clone(&product));
            }

            records.push(product);
        }

        InventorySnapshot {
            store_id: store_id.into(),
            refreshed_at,
            records,
            barcode_index,
            sku_index,
        }
    }

    /// Store this snapshot belongs to.
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// Wall-clock time the data was fetched.
    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    /// Looks up a product by barcode. Empty input returns `None`.
    #[inline]
    pub fn lookup_by_barcode(&self, code: &str) -> Option<&Arc<CachedProduct>> {
        normalize_key(code).and_then(|key| self.barcode_index.get(key))
    }

    /// Looks up a product by SKU. Empty input returns `None`.
    #[inline]
    pub fn lookup_by_sku(&self, sku: &str) -> Option<&Arc<CachedProduct>> {
        normalize_key(sku).and_then(|key| self.sku_index.get(key))
    }

    /// Number of records fetched (including ones without a barcode).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct barcode keys.
    pub fn barcode_count(&self) -> usize {
        self.barcode_index.len()
    }

    /// Number of distinct SKU keys.
    pub fn sku_count(&self) -> usize {
        self.sku_index.len()
    }

    /// All records in fetch order.
    pub fn products(&self) -> impl Iterator<Item = &Arc<CachedProduct>> {
        self.records.iter()
    }

    /// Case-insensitive substring search over name, SKU and barcode.
    ///
    /// Linear in the snapshot size; meant for search boxes, never for the
    /// scan path. An empty query returns the first `limit` records.
    pub fn search(&self, query: &str, limit: usize) -> Vec<Arc<CachedProduct>> {
        let limit = limit.min(MAX_SEARCH_RESULTS);
        let needle = query.trim().to_lowercase();

        self.records
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.sku.to_lowercase().contains(&needle)
                    || p
                        .barcode
                        .as_deref()
                        .is_some_and(|b| b.to_lowercase().contains(&needle))
            })
            .take(limit)
            .cloned()
            .collect()
    }
}
