//! # Inventory Settings
//!
//! Settings for the inventory API adapter and the cache. These are the
//! `[api]` and `[cache]` tables of the terminal's config file; loading the
//! file and applying environment overrides happens in the host.
//!
//! ```toml
//! [api]
//! base_url = "https://api.example.com/v1"
//! token = "..."
//! page_size = 1000
//! timeout_secs = 15
//! max_pages = 50
//! retry_max_elapsed_secs = 10
//!
//! [cache]
//! ttl_secs = 300
//! background_refresh_secs = 60
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{InventoryError, InventoryResult};

// =============================================================================
// API Settings
// =============================================================================

/// Connection settings for the remote inventory API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL, e.g. `https://api.example.com/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token. Sent only when set.
    #[serde(default)]
    pub token: Option<String>,

    /// Records requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Guard against an API that never reports the last page.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Upper bound on time spent retrying one page (seconds).
    #[serde(default = "default_retry_max_elapsed")]
    pub retry_max_elapsed_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}
fn default_page_size() -> u32 {
    1000
}
fn default_timeout() -> u64 {
    15
}
fn default_max_pages() -> u32 {
    50
}
fn default_retry_max_elapsed() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            token: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
            max_pages: default_max_pages(),
            retry_max_elapsed_secs: default_retry_max_elapsed(),
        }
    }
}

impl ApiSettings {
    /// Parses and checks the base URL.
    pub fn parsed_base_url(&self) -> InventoryResult<Url> {
        let url = Url::parse(self.base_url.trim())?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(InventoryError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got scheme: {}",
                other
            ))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_max_elapsed(&self) -> Duration {
        Duration::from_secs(self.retry_max_elapsed_secs)
    }

    /// Validates the settings.
    pub fn validate(&self) -> InventoryResult<()> {
        self.parsed_base_url()?;

        if self.page_size == 0 {
            return Err(InventoryError::InvalidConfig(
                "page_size must be greater than 0".into(),
            ));
        }
        if self.max_pages == 0 {
            return Err(InventoryError::InvalidConfig(
                "max_pages must be greater than 0".into(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(InventoryError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Freshness settings for the inventory cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Snapshot time-to-live (seconds).
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// How often the host asks for a non-forced refresh (seconds).
    /// Calls inside the TTL are no-ops, so this only bounds staleness.
    #[serde(default = "default_background_refresh")]
    pub background_refresh_secs: u64,
}

fn default_ttl() -> u64 {
    tillpoint_core::DEFAULT_CACHE_TTL_SECS
}
fn default_background_refresh() -> u64 {
    60
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            ttl_secs: default_ttl(),
            background_refresh_secs: default_background_refresh(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn background_refresh(&self) -> Duration {
        Duration::from_secs(self.background_refresh_secs)
    }

    /// Validates the settings.
    pub fn validate(&self) -> InventoryResult<()> {
        if self.ttl_secs == 0 {
            return Err(InventoryError::InvalidConfig(
                "ttl_secs must be greater than 0".into(),
            ));
        }
        if self.background_refresh_secs == 0 {
            return Err(InventoryError::InvalidConfig(
                "background_refresh_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
