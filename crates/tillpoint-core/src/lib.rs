//! # tillpoint-core: Pure Types and Algorithms
//!
//! The product-resolution pipeline turns camera decodes into cart lines.
//! This crate holds the parts of it that need no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Product Resolution Pipeline                         │
//! │                                                                         │
//! │  camera frames ──► decoder ──► raw "5449000000996" (many per label)    │
//! │                                        │                                │
//! │  ┌─────────────────────────────────────▼───────────────────────────┐   │
//! │  │  tillpoint-scanner: ScanEventFilter                             │   │
//! │  │      uses ★ dedup::ScanSession ★                                │   │
//! │  └─────────────────────────────────────┬───────────────────────────┘   │
//! │                                        │ one ScanEvent per label        │
//! │  ┌─────────────────────────────────────▼───────────────────────────┐   │
//! │  │  tillpoint-inventory: InventoryCache                            │   │
//! │  │      holds ★ snapshot::InventorySnapshot ★                      │   │
//! │  └─────────────────────────────────────┬───────────────────────────┘   │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                       ★ types::ScanResolution ★                        │
//! │                   Found / OutOfStock / Unknown ──► cart                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - CachedProduct, ScanEvent, ScanResolution
//! - [`money`] - Integer money with exact decimal parsing
//! - [`snapshot`] - Barcode/SKU indexes built in one pass
//! - [`dedup`] - Scan de-duplication state machine
//! - [`validation`] - Key normalization, store id checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use chrono::Utc;
//! use tillpoint_core::{CachedProduct, InventorySnapshot, Money, ScanResolution, ScanSession};
//!
//! let cola = CachedProduct {
//!     product_id: "p-1".into(),
//!     inventory_record_id: "inv-1".into(),
//!     sku: "SKU1".into(),
//!     barcode: Some("123".into()),
//!     name: "Cola".into(),
//!     unit_of_measure: "pcs".into(),
//!     buying_price: Money::from_cents(60),
//!     selling_price: Money::from_cents(100),
//!     current_stock: 5,
//!     available_stock: 5,
//! };
//! let snapshot = InventorySnapshot::build("store-1", vec![cola], Utc::now());
//!
//! let t0 = Instant::now();
//! let mut session = ScanSession::default();
//! let first = session.observe("123", t0, Utc::now()).unwrap();
//! assert!(session.observe("123", t0 + Duration::from_millis(50), Utc::now()).is_none());
//!
//! let product = snapshot.lookup_by_barcode(&first.code).map(|p| &**p);
//! assert!(matches!(
//!     ScanResolution::from_lookup(&first.code, product),
//!     ScanResolution::Found { .. }
//! ));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dedup;
pub mod error;
pub mod money;
pub mod snapshot;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use dedup::{ScanSession, DEFAULT_DEDUP_WINDOW};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use snapshot::InventorySnapshot;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default cache time-to-live: 5 minutes.
///
/// ## Business Reason
/// Stock counts move during the day. Five minutes keeps the "out of stock"
/// answer honest without re-downloading the full catalog on every screen
/// visit.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
