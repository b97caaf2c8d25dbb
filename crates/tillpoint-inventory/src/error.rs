//! # Inventory Error Types
//!
//! Error types for fetching inventory and validating its settings.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Inventory Error Categories                          │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Payload             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Http           │  │  Api (success=false)    │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Malformed              │ │
//! │  │                 │  │  Status(code)   │  │  Validation             │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these ever reach a lookup caller. `InventoryCache::refresh`
//! records them as `last_error` and keeps serving the previous snapshot.

use thiserror::Error;
use tillpoint_core::ValidationError;

/// Result type alias for inventory operations.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Inventory error type covering config, transport and payload failures.
#[derive(Debug, Error)]
pub enum InventoryError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid inventory configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Request could not be sent or the body could not be read.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out.
    #[error("Inventory request timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("Inventory API returned HTTP {code}")]
    Status { code: u16 },

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// API answered with `success: false`.
    #[error("Inventory API error: {message}")]
    Api { message: String },

    /// Body was not the expected envelope.
    #[error("Malformed inventory payload: {0}")]
    Malformed(String),

    /// Input failed validation (e.g., bad store id).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A newer store request or a `clear()` overtook this fetch.
    #[error("Refresh for store {store_id} was superseded")]
    Superseded { store_id: String },
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for InventoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            InventoryError::Timeout
        } else if err.is_decode() {
            InventoryError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            InventoryError::Status {
                code: status.as_u16(),
            }
        } else {
            InventoryError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Malformed(err.to_string())
    }
}

impl From<url::ParseError> for InventoryError {
    fn from(err: url::ParseError) -> Self {
        InventoryError::InvalidUrl(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl InventoryError {
    /// Returns true if retrying the same request may succeed.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - 5xx responses, 408 and 429
    ///
    /// ## Non-Retryable Errors
    /// - 4xx (bad token, unknown store)
    /// - `success: false` and malformed payloads
    /// - Configuration and validation errors
    pub fn is_retryable(&self) -> bool {
        match self {
            InventoryError::Http(_) | InventoryError::Timeout => true,
            InventoryError::Status { code } => *code >= 500 || *code == 408 || *code == 429,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            InventoryError::InvalidConfig(_) | InventoryError::InvalidUrl(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(InventoryError::Http("connection refused".into()).is_retryable());
        assert!(InventoryError::Timeout.is_retryable());
        assert!(InventoryError::Status { code: 503 }.is_retryable());
        assert!(InventoryError::Status { code: 429 }.is_retryable());

        assert!(!InventoryError::Status { code: 401 }.is_retryable());
        assert!(!InventoryError::Status { code: 404 }.is_retryable());
        assert!(!InventoryError::Api {
            message: "store not found".into()
        }
        .is_retryable());
        assert!(!InventoryError::Malformed("eof".into()).is_retryable());
        assert!(!InventoryError::Superseded {
            store_id: "s1".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(InventoryError::InvalidUrl("ftp://x".into()).is_config_error());
        assert!(!InventoryError::Timeout.is_config_error());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            InventoryError::Status { code: 502 }.to_string(),
            "Inventory API returned HTTP 502"
        );
        let err: InventoryError = ValidationError::Required {
            field: "store_id".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Validation error: store_id is required");
    }
}
