//! # Validation Module
//!
//! Key normalization and input checks shared by the cache and its callers.
//!
//! ## The One Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Keys are normalized IDENTICALLY at write time and at read time.       │
//! │                                                                         │
//! │  snapshot build:  " 5449000000996\n"  ──normalize_key──► "5449000000996"│
//! │  lookup:          "5449000000996 "    ──normalize_key──► "5449000000996"│
//! │                                                                         │
//! │  If only one side trims, lookups silently miss.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum store id length.
pub const MAX_STORE_ID_LEN: usize = 64;

/// Normalizes a barcode or SKU lookup key.
///
/// Returns `None` for empty or whitespace-only input.
///
/// ## Example
/// ```rust
/// use tillpoint_core::validation::normalize_key;
///
/// assert_eq!(normalize_key("  SKU-1 "), Some("SKU-1"));
/// assert_eq!(normalize_key("   "), None);
/// ```
#[inline]
pub fn normalize_key(raw: &str) -> Option<&str> {
    let key = raw.trim();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Validates a store id before it is interpolated into an API path.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
/// - No whitespace, `/`, `?` or `#`
///
/// ## Returns
/// The trimmed store id.
pub fn validate_store_id(store_id: &str) -> ValidationResult<&str> {
    let id = store_id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "store_id".to_string(),
        });
    }

    if id.len() > MAX_STORE_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "store_id".to_string(),
            max: MAX_STORE_ID_LEN,
        });
    }

    if id
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "store_id".to_string(),
            reason: "must not contain whitespace, '/', '?' or '#'".to_string(),
        });
    }

    Ok(id)
}

/// Checks if a search-box query looks like a barcode (8-14 digits).
///
/// ## Barcode Formats Detected
/// - EAN-8: 8 digits
/// - UPC-A: 12 digits
/// - EAN-13: 13 digits
/// - GTIN-14: 14 digits
///
/// Keyboard-wedge scanners type into the same box as the cashier, so a
/// digit run of barcode length is tried against the barcode index first.
pub fn is_barcode_query(query: &str) -> bool {
    let query = query.trim();
    (8..=14).contains(&query.len()) && query.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("123"), Some("123"));
        assert_eq!(normalize_key("\t123\n"), Some("123"));
        assert_eq!(normalize_key(""), None);
        assert_eq!(normalize_key(" \r\n"), None);
    }

    #[test]
    fn test_validate_store_id() {
        assert_eq!(validate_store_id("store-001").unwrap(), "store-001");
        assert_eq!(validate_store_id("  42 ").unwrap(), "42");

        assert!(matches!(
            validate_store_id("   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_store_id(&"s".repeat(65)),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(validate_store_id("a/b").is_err());
        assert!(validate_store_id("a b").is_err());
        assert!(validate_store_id("a?page=2").is_err());
    }

    #[test]
    fn test_is_barcode_query() {
        assert!(is_barcode_query("96385074"));
        assert!(is_barcode_query("036000291452"));
        assert!(is_barcode_query("5449000000996"));
        assert!(is_barcode_query(" 10012345678902 "));

        assert!(!is_barcode_query("1234567"));
        assert!(!is_barcode_query("123456789012345"));
        assert!(!is_barcode_query("COKE-330"));
        assert!(!is_barcode_query("12345678a"));
    }
}
