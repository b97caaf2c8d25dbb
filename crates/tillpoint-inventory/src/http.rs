//! # HTTP Inventory Adapter
//!
//! Production [`InventoryApi`]: pages through
//! `GET {base_url}/inventory/stores/{store_id}` with reqwest.
//!
//! ## Paging and Retries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   page 1 ──► 1000 rows ──► page 2 ──► 1000 rows ──► page 3 ──► 310 rows │
//! │                                                      (short: stop)      │
//! │                                                                         │
//! │   Stop when: page == total_pages (if reported) | page == max_pages     │
//! │              | empty page | short page (only without total_pages)       │
//! │                                                                         │
//! │   Each page request:                                                    │
//! │     timeout / connect error / 5xx ──► backoff ──► retry same page       │
//! │     4xx / success=false / bad JSON ──► fail the whole fetch             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The fetch is all-or-nothing: a failure on page 3 discards pages 1 and 2,
//! so the cache never swaps in a partial store.

use std::time::Instant;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use reqwest::Client;
use tillpoint_core::validation::validate_store_id;
use tillpoint_core::CachedProduct;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{parse_page, InventoryApi, InventoryPage, Pagination};
use crate::config::ApiSettings;
use crate::error::{InventoryError, InventoryResult};

/// reqwest-backed inventory client.
#[derive(Debug, Clone)]
pub struct HttpInventoryApi {
    client: Client,
    base_url: Url,
    settings: ApiSettings,
}

impl HttpInventoryApi {
    /// Builds a client from validated settings.
    pub fn new(settings: ApiSettings) -> InventoryResult<Self> {
        settings.validate()?;
        let base_url = settings.parsed_base_url()?;

        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("tillpoint/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InventoryError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(HttpInventoryApi {
            client,
            base_url,
            settings,
        })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// URL of one page of a store's inventory.
    pub fn page_url(&self, store_id: &str, page: u32) -> InventoryResult<Url> {
        let store_id = validate_store_id(store_id)?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| InventoryError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["inventory", "stores", store_id]);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &self.settings.page_size.to_string());

        Ok(url)
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: std::time::Duration::from_millis(250),
            max_interval: std::time::Duration::from_secs(4),
            multiplier: 2.0,
            max_elapsed_time: Some(self.settings.retry_max_elapsed()),
            ..Default::default()
        }
    }

    /// One request, no retries.
    async fn fetch_page_once(&self, url: &Url) -> InventoryResult<InventoryPage> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = self.settings.token.as_deref().filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InventoryError::Status {
                code: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        parse_page(&body)
    }

    /// One page, retrying transient failures until the backoff gives up.
    async fn fetch_page(&self, store_id: &str, page: u32) -> InventoryResult<InventoryPage> {
        let url = self.page_url(store_id, page)?;
        let mut backoff = self.create_backoff();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.fetch_page_once(&url).await {
                Ok(parsed) => return Ok(parsed),
                Err(e) if e.is_retryable() => match backoff.next_backoff() {
                    Some(delay) => {
                        warn!(store_id, page, attempt, ?delay, error = %e, "Inventory page failed, retrying");
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }
}

/// Whether `page` ends the listing.
///
/// A reported `total_pages` is authoritative. Without it, a page shorter than
/// the server's page size (or the requested one, if the server is silent)
/// is the last.
fn is_last_page(
    page: u32,
    raw_count: usize,
    requested_page_size: u32,
    pagination: Option<&Pagination>,
) -> bool {
    if raw_count == 0 {
        return true;
    }
    if let Some(total_pages) = pagination.and_then(|p| p.total_pages) {
        return page >= total_pages;
    }

    let page_size = pagination
        .and_then(|p| p.page_size)
        .filter(|size| *size > 0)
        .unwrap_or(requested_page_size);
    raw_count < page_size as usize
}

#[async_trait]
impl InventoryApi for HttpInventoryApi {
    async fn fetch_store_inventory(&self, store_id: &str) -> InventoryResult<Vec<CachedProduct>> {
        let started = Instant::now();
        let mut products = Vec::new();
        let mut skipped = 0usize;
        let mut page = 1u32;

        loop {
            let parsed = self.fetch_page(store_id, page).await?;
            debug!(store_id, page, rows = parsed.raw_count, "Fetched inventory page");

            skipped += parsed.skipped;
            let last = is_last_page(
                page,
                parsed.raw_count,
                self.settings.page_size,
                parsed.pagination.as_ref(),
            );
            products.extend(parsed.products);

            if last {
                break;
            }
            if page >= self.settings.max_pages {
                warn!(
                    store_id,
                    max_pages = self.settings.max_pages,
                    "Inventory listing exceeds max_pages, keeping what was fetched"
                );
                break;
            }
            page += 1;
        }

        if skipped > 0 {
            warn!(store_id, skipped, "Some inventory records were unreadable");
        }
        info!(
            store_id,
            pages = page,
            product_count = products.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched store inventory"
        );

        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base_url: &str) -> HttpInventoryApi {
        HttpInventoryApi::new(ApiSettings {
            base_url: base_url.into(),
            page_size: 500,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_page_url() {
        let api = api("https://pos.example.com/api/v1");
        let url = api.page_url("store-7", 2).unwrap();
        assert_eq!(
            url.as_str(),
            "https://pos.example.com/api/v1/inventory/stores/store-7?page=2&page_size=500"
        );
    }

    #[test]
    fn test_page_url_trailing_slash() {
        let api = api("https://pos.example.com/api/v1/");
        let url = api.page_url("s1", 1).unwrap();
        assert_eq!(url.path(), "/api/v1/inventory/stores/s1");
    }

    #[test]
    fn test_page_url_rejects_bad_store_id() {
        let api = api("https://pos.example.com");
        assert!(matches!(
            api.page_url("../admin", 1),
            Err(InventoryError::Validation(_))
        ));
        assert!(api.page_url("   ", 1).is_err());
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let result = HttpInventoryApi::new(ApiSettings {
            base_url: "ws://pos.example.com".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(InventoryError::InvalidUrl(_))));
    }

    fn pagination(page_size: Option<u32>, total_pages: Option<u32>) -> Pagination {
        Pagination {
            page_size,
            total_pages,
            ..Default::default()
        }
    }

    #[test]
    fn test_total_pages_overrides_short_page() {
        // Server capped the page at 2 rows although 1000 were asked for.
        let capped = pagination(Some(2), Some(3));
        assert!(!is_last_page(1, 2, 1000, Some(&capped)));
        assert!(!is_last_page(2, 2, 1000, Some(&capped)));
        assert!(is_last_page(3, 2, 1000, Some(&capped)));

        let no_size = pagination(None, Some(2));
        assert!(!is_last_page(1, 7, 1000, Some(&no_size)));
    }

    #[test]
    fn test_short_page_without_total_pages() {
        assert!(is_last_page(1, 999, 1000, None));
        assert!(!is_last_page(1, 1000, 1000, None));

        let server_size = pagination(Some(2), None);
        assert!(!is_last_page(1, 2, 1000, Some(&server_size)));
        assert!(is_last_page(2, 1, 1000, Some(&server_size)));
    }

    #[test]
    fn test_empty_page_ends_listing() {
        assert!(is_last_page(1, 0, 1000, Some(&pagination(Some(2), Some(5)))));
    }

    #[test]
    fn test_backoff_is_bounded() {
        let api = api("https://pos.example.com");
        let backoff = api.create_backoff();
        assert_eq!(backoff.max_elapsed_time, Some(std::time::Duration::from_secs(10)));
    }
}
