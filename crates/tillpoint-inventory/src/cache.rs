//! # Inventory Cache
//!
//! Holds one store's inventory in memory and answers barcode/SKU lookups in
//! constant time while the cashier keeps scanning.
//!
//! ## Read and Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        InventoryCache                                   │
//! │                                                                         │
//! │  READ (sync, never awaits)          WRITE (async, serialized)          │
//! │  ─────────────────────────          ──────────────────────────         │
//! │  lookup_by_barcode("5449..")        refresh("store-1", force)          │
//! │     │                                  │                                │
//! │     ├─ state.read()                    ├─ record requested store        │
//! │     ├─ clone Arc<Snapshot>             ├─ refresh_lock.lock().await     │
//! │     ├─ drop lock                       ├─ fresh? ──► return (no I/O)    │
//! │     └─ HashMap::get                    ├─ status = Loading              │
//! │                                        ├─ api.fetch_store_inventory()   │
//! │                                        ├─ build snapshot (one pass)     │
//! │                                        └─ swap Arc if still wanted      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Freshness Rule
//! A refresh is skipped when it is not forced, the store matches the cached
//! one and the snapshot is younger than the TTL. A failed fetch leaves the
//! refresh time untouched, so the next call tries again, and keeps serving
//! the previous snapshot (stale-while-revalidate).
//!
//! ## Store Switching
//! Every refresh records the store it wants. Asking for a different store,
//! or calling [`InventoryCache::clear`], moves the cache to a new epoch. A
//! fetch that finishes in an older epoch is thrown away, so the last store
//! requested wins no matter which response arrives first.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tillpoint_core::validation::{is_barcode_query, normalize_key, validate_store_id};
use tillpoint_core::{CachedProduct, InventorySnapshot, ScanResolution};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use ts_rs::TS;

use crate::api::InventoryApi;
use crate::config::CacheSettings;
use crate::error::{InventoryError, InventoryResult};

// =============================================================================
// Status
// =============================================================================

/// Load state of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CacheStatus {
    /// Nothing loaded yet, or cleared.
    #[default]
    Empty,

    /// A fetch is in flight. Lookups still serve the previous snapshot.
    Loading,

    /// The last fetch succeeded.
    Ready,

    /// The last fetch failed. See `last_error`.
    Error,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStatus::Empty => write!(f, "empty"),
            CacheStatus::Loading => write!(f, "loading"),
            CacheStatus::Ready => write!(f, "ready"),
            CacheStatus::Error => write!(f, "error"),
        }
    }
}

/// Point-in-time view of the cache for status bars and dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CacheStatusReport {
    pub status: CacheStatus,

    /// Store of the snapshot being served.
    pub store_id: Option<String>,

    pub product_count: usize,

    /// Wall-clock time of the snapshot being served.
    #[ts(as = "Option<String>")]
    pub last_refreshed_at: Option<DateTime<Utc>>,

    pub last_error: Option<String>,
}

/// What a call to [`InventoryCache::refresh`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Snapshot was fresh; no request was made.
    Skipped,

    /// A new snapshot was installed.
    Refreshed { product_count: usize },

    /// Fetch failed; the previous snapshot is still served.
    Failed { error: String },

    /// A newer request or `clear()` made this one obsolete.
    Superseded,
}

// =============================================================================
// Cache
// =============================================================================

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Arc<InventorySnapshot>>,

    /// Monotonic time of the last successful swap. Drives the TTL.
    refreshed_at: Option<Instant>,

    status: CacheStatus,
    last_error: Option<String>,

    /// Most recently requested store.
    wanted_store: Option<String>,

    /// Bumped whenever `wanted_store` changes or the cache is cleared.
    epoch: u64,
}

impl CacheState {
    fn is_fresh_for(&self, store_id: &str, ttl: std::time::Duration) -> bool {
        let same_store = self
            .snapshot
            .as_ref()
            .is_some_and(|s| s.store_id() == store_id);

        same_store && self.refreshed_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

/// Session-lifetime inventory cache for one store at a time.
///
/// Construct once per session, share as `Arc<InventoryCache>`, call
/// [`clear`](Self::clear) on logout or store switch.
pub struct InventoryCache {
    api: Arc<dyn InventoryApi>,
    settings: CacheSettings,
    state: RwLock<CacheState>,

    /// Serializes refreshes. Held across the fetch.
    refresh_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for InventoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryCache")
            .field("settings", &self.settings)
            .field("status", &self.state.read().status)
            .finish_non_exhaustive()
    }
}

impl InventoryCache {
    /// Creates an empty cache.
    pub fn new(api: Arc<dyn InventoryApi>, settings: CacheSettings) -> Self {
        InventoryCache {
            api,
            settings,
            state: RwLock::new(CacheState::default()),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// The snapshot currently served, if any.
    pub fn snapshot(&self) -> Option<Arc<InventorySnapshot>> {
        self.state.read().snapshot.clone()
    }

    /// Finds a product by barcode. Input is trimmed; empty input is `None`.
    pub fn lookup_by_barcode(&self, code: &str) -> Option<Arc<CachedProduct>> {
        let code = normalize_key(code)?;
        let snapshot = self.snapshot()?;
        let hit = snapshot.lookup_by_barcode(code).cloned();
        trace!(code, found = hit.is_some(), "Barcode lookup");
        hit
    }

    /// Finds a product by SKU. Input is trimmed; empty input is `None`.
    pub fn lookup_by_sku(&self, sku: &str) -> Option<Arc<CachedProduct>> {
        let sku = normalize_key(sku)?;
        let snapshot = self.snapshot()?;
        let hit = snapshot.lookup_by_sku(sku).cloned();
        trace!(sku, found = hit.is_some(), "SKU lookup");
        hit
    }

    /// Search-box lookup: tries the barcode index first for digit runs of
    /// barcode length, the SKU index first for everything else.
    pub fn lookup(&self, query: &str) -> Option<Arc<CachedProduct>> {
        if is_barcode_query(query) {
            self.lookup_by_barcode(query)
                .or_else(|| self.lookup_by_sku(query))
        } else {
            self.lookup_by_sku(query)
                .or_else(|| self.lookup_by_barcode(query))
        }
    }

    /// Resolves a distinct scan. Labels printed with the SKU (Code 128)
    /// resolve through the SKU index when no barcode matches.
    pub fn resolve_scan(&self, code: &str) -> ScanResolution {
        let product = self
            .lookup_by_barcode(code)
            .or_else(|| self.lookup_by_sku(code));
        ScanResolution::from_lookup(code, product.as_deref())
    }

    /// Case-insensitive search over name, SKU and barcode.
    pub fn search(&self, query: &str, limit: usize) -> Vec<Arc<CachedProduct>> {
        self.snapshot()
            .map(|s| s.search(query, limit))
            .unwrap_or_default()
    }

    // =========================================================================
    // Observables
    // =========================================================================

    /// Store of the snapshot being served.
    pub fn store_id(&self) -> Option<String> {
        self.state
            .read()
            .snapshot
            .as_ref()
            .map(|s| s.store_id().to_string())
    }

    /// True if a snapshot is loaded and younger than the TTL.
    pub fn is_fresh(&self) -> bool {
        let state = self.state.read();
        state.snapshot.is_some()
            && state
                .refreshed_at
                .is_some_and(|at| at.elapsed() < self.settings.ttl())
    }

    pub fn status(&self) -> CacheStatusReport {
        let state = self.state.read();
        CacheStatusReport {
            status: state.status,
            store_id: state.snapshot.as_ref().map(|s| s.store_id().to_string()),
            product_count: state.snapshot.as_ref().map_or(0, |s| s.len()),
            last_refreshed_at: state.snapshot.as_ref().map(|s| s.refreshed_at()),
            last_error: state.last_error.clone(),
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Brings the cache up to date for `store_id`.
    ///
    /// Never fails: fetch errors end up in [`status`](Self::status) and the
    /// previous snapshot keeps being served. An invalid store id is treated
    /// as a failed fetch without touching the network.
    pub async fn refresh(&self, store_id: &str, force: bool) -> RefreshOutcome {
        let store_id = match validate_store_id(store_id) {
            Ok(id) => id.to_string(),
            Err(e) => {
                let error = InventoryError::from(e);
                warn!(error = %error, "Refusing to refresh inventory");
                let mut state = self.state.write();
                state.status = CacheStatus::Error;
                state.last_error = Some(error.to_string());
                return RefreshOutcome::Failed {
                    error: error.to_string(),
                };
            }
        };

        let epoch = self.request_store(&store_id);
        let _guard = self.refresh_lock.lock().await;

        // Re-evaluated under the lock: a refresh that just finished may
        // already have loaded this store.
        {
            let mut state = self.state.write();
            if state.epoch != epoch {
                debug!(store_id = %store_id, "Refresh superseded before fetch");
                return RefreshOutcome::Superseded;
            }
            if !force && state.is_fresh_for(&store_id, self.settings.ttl()) {
                debug!(store_id = %store_id, "Inventory still fresh, skipping refresh");
                return RefreshOutcome::Skipped;
            }
            state.status = CacheStatus::Loading;
        }

        let started = Instant::now();
        let fetched = self.api.fetch_store_inventory(&store_id).await;

        match self.install(epoch, &store_id, fetched) {
            Ok(product_count) => {
                info!(
                    store_id = %store_id,
                    product_count,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Inventory cache refreshed"
                );
                RefreshOutcome::Refreshed { product_count }
            }
            Err(InventoryError::Superseded { .. }) => {
                warn!(store_id = %store_id, "Discarding inventory for a store no longer requested");
                RefreshOutcome::Superseded
            }
            Err(e) => {
                warn!(store_id = %store_id, error = %e, "Inventory refresh failed, serving previous snapshot");
                RefreshOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Records `store_id` as the latest request and returns its epoch.
    fn request_store(&self, store_id: &str) -> u64 {
        let mut state = self.state.write();
        if state.wanted_store.as_deref() != Some(store_id) {
            state.wanted_store = Some(store_id.to_string());
            state.epoch += 1;
        }
        state.epoch
    }

    /// Applies a fetch result if its epoch is still current.
    fn install(
        &self,
        epoch: u64,
        store_id: &str,
        fetched: InventoryResult<Vec<CachedProduct>>,
    ) -> InventoryResult<usize> {
        // Indexes are built before taking the write lock.
        let fetched = fetched.map(|products| InventorySnapshot::build(store_id, products, Utc::now()));

        let mut state = self.state.write();
        if state.epoch != epoch {
            return Err(InventoryError::Superseded {
                store_id: store_id.to_string(),
            });
        }

        match fetched {
            Ok(snapshot) => {
                let count = snapshot.len();
                state.snapshot = Some(Arc::new(snapshot));
                state.refreshed_at = Some(Instant::now());
                state.status = CacheStatus::Ready;
                state.last_error = None;
                Ok(count)
            }
            Err(e) => {
                state.status = CacheStatus::Error;
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Drops the snapshot and invalidates any fetch in flight.
    pub fn clear(&self) {
        let mut state = self.state.write();
        let epoch = state.epoch + 1;
        *state = CacheState {
            epoch,
            ..CacheState::default()
        };
        info!("Inventory cache cleared");
    }

    /// Spawns a task asking for a non-forced refresh every
    /// `background_refresh_secs`. The TTL turns most ticks into no-ops.
    pub fn spawn_refresher(self: &Arc<Self>, store_id: String) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = self.settings.background_refresh();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; the host already refreshed.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let outcome = cache.refresh(&store_id, false).await;
                debug!(store_id = %store_id, ?outcome, "Background refresh tick");
            }
        })
    }
}
