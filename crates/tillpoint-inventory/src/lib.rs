//! # tillpoint-inventory: Inventory Cache Service
//!
//! Client-side, TTL-bounded inventory cache for one store, and the HTTP
//! adapter that fills it.
//!
//! ## Modules
//!
//! - [`cache`] - `InventoryCache`: O(1) lookups, serialized refresh, TTL
//! - [`api`] - `InventoryApi` seam and the API's wire format
//! - [`http`] - reqwest implementation with paging and retries
//! - [`config`] - `[api]` and `[cache]` settings
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tillpoint_inventory::{ApiSettings, CacheSettings, HttpInventoryApi, InventoryCache};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HttpInventoryApi::new(ApiSettings::default())?;
//! let cache = Arc::new(InventoryCache::new(Arc::new(api), CacheSettings::default()));
//!
//! cache.refresh("store-001", false).await;
//! if let Some(product) = cache.lookup_by_barcode("5449000000996") {
//!     println!("{} {}", product.name, product.selling_price);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use api::InventoryApi;
pub use cache::{CacheStatus, CacheStatusReport, InventoryCache, RefreshOutcome};
pub use config::{ApiSettings, CacheSettings};
pub use error::{InventoryError, InventoryResult};
pub use http::HttpInventoryApi;
