//! # Error Types
//!
//! Domain-specific error types for tillpoint-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tillpoint-core errors (this file)                                     │
//! │  ├── CoreError        - Product resolution outcomes as errors          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tillpoint-inventory errors (separate crate)                           │
//! │  └── InventoryError   - Fetch / config failures                        │
//! │                                                                         │
//! │  tillpoint-scanner errors (separate crate)                             │
//! │  └── ScannerError     - Surface / camera acquisition failures          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An empty barcode or SKU query is NOT an error anywhere in the pipeline.
//! It is a normal "no result".

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised when a caller needs a sellable product and the cache cannot
/// provide one.
///
/// The cache itself never returns these; they exist for cart logic that
/// prefers `?` over matching on [`crate::ScanResolution`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// No product with this barcode or SKU exists in the current snapshot.
    ///
    /// ## When This Occurs
    /// - The label belongs to another store's catalog
    /// - The product was created after the last refresh
    /// - The barcode was never registered in the catalog
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The product is known but has no available stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan "5449000000996"
    ///      │
    ///      ▼
    /// lookup_by_barcode → CachedProduct { available_stock: 0 }
    ///      │
    ///      ▼
    /// OutOfStock { sku: "COKE-330" }
    ///      │
    ///      ▼
    /// UI shows: "COKE-330 is out of stock" (not "unknown product")
    /// ```
    #[error("Out of stock: {sku} (available {available})")]
    OutOfStock { sku: String, available: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., a store id containing a path separator).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A monetary amount could not be parsed exactly.
    #[error("Invalid amount '{value}': {reason}")]
    InvalidAmount { value: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
