//! # Terminal Session
//!
//! Everything between stdin and stdout: splitting input into scans and
//! commands, resolving scans against the cache and rendering the answers.
//!
//! ## Input Routing
//! ```text
//! "5449000000996"    ──► Input::Scan     ──► WedgeInput ──► filter ──► listener
//! ":sku COKE-330"    ──► Input::Command  ──► Terminal::run
//! ":bogus"           ──► Input::Invalid
//! ""                 ──► Input::Empty
//! ```

use std::sync::Arc;

use tillpoint_core::{CachedProduct, ScanEvent, ScanResolution};
use tillpoint_inventory::{CacheStatusReport, InventoryCache, RefreshOutcome};
use tillpoint_scanner::{ScanEventFilter, ScanListener, ScannerStatus};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Rows shown for `:find`.
const FIND_LIMIT: usize = 20;

// =============================================================================
// Input Parsing
// =============================================================================

/// A typed `:` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Status,
    Sku(String),
    Find(String),
    Help,
    Quit,
}

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Scan(String),
    Command(Command),
    Invalid(String),
}

/// Splits a line into a scan or a command.
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix(':') else {
        return Input::Scan(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match (name.to_lowercase().as_str(), arg) {
        ("refresh" | "r", _) => Input::Command(Command::Refresh),
        ("status" | "s", _) => Input::Command(Command::Status),
        ("help" | "h" | "?", _) => Input::Command(Command::Help),
        ("quit" | "q" | "exit", _) => Input::Command(Command::Quit),
        ("sku" | "find", "") => Input::Invalid(format!(":{} needs an argument", name)),
        ("sku", arg) => Input::Command(Command::Sku(arg.to_string())),
        ("find", arg) => Input::Command(Command::Find(arg.to_string())),
        _ => Input::Invalid(format!("Unknown command :{} (try :help)", name)),
    }
}

pub const HELP: &str = "\
Scan a barcode (or type it and press Enter) to look it up.
  :refresh      reload inventory now
  :status       cache and scanner status
  :sku <SKU>    look up by SKU
  :find <text>  search name, SKU and barcode
  :quit         exit";

// =============================================================================
// Scan Listener
// =============================================================================

/// Resolves each distinct scan against the cache and forwards the result.
///
/// Runs on the decoder's task, so it only does an O(1) lookup and a
/// non-blocking send.
pub struct ResolvingListener {
    cache: Arc<InventoryCache>,
    tx: mpsc::UnboundedSender<ScanResolution>,
}

impl ResolvingListener {
    pub fn new(cache: Arc<InventoryCache>, tx: mpsc::UnboundedSender<ScanResolution>) -> Self {
        ResolvingListener { cache, tx }
    }
}

impl ScanListener for ResolvingListener {
    fn on_scan(&self, event: &ScanEvent) {
        let resolution = self.cache.resolve_scan(&event.code);
        debug!(code = %event.code, ?resolution, "Scan resolved");
        if self.tx.send(resolution).is_err() {
            debug!("Resolution receiver closed");
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Executes `:` commands for one store.
pub struct Terminal {
    cache: Arc<InventoryCache>,
    scanner: Arc<ScanEventFilter>,
    store_id: String,
}

impl Terminal {
    pub fn new(cache: Arc<InventoryCache>, scanner: Arc<ScanEventFilter>, store_id: String) -> Self {
        Terminal {
            cache,
            scanner,
            store_id,
        }
    }

    /// Runs a command and returns the text to print. `Quit` is handled by
    /// the input loop.
    pub async fn run(&self, command: Command) -> String {
        match command {
            Command::Refresh => {
                info!(store_id = %self.store_id, "Manual inventory refresh");
                render_outcome(&self.cache.refresh(&self.store_id, true).await)
            }
            Command::Status => render_status(&self.cache.status(), &self.scanner.status()),
            Command::Sku(sku) => {
                let product = self.cache.lookup_by_sku(&sku);
                render_resolution(&ScanResolution::from_lookup(&sku, product.as_deref()))
            }
            Command::Find(text) => {
                let hits = self.cache.search(&text, FIND_LIMIT);
                if hits.is_empty() {
                    format!("No products match \"{}\"", text)
                } else {
                    hits.iter()
                        .map(|p| render_product(p))
                        .collect::<Vec<_>>()
                        .join("\n")
                }
            }
            Command::Help => HELP.to_string(),
            Command::Quit => String::new(),
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

fn render_product(product: &CachedProduct) -> String {
    let barcode = product.barcode.as_deref().unwrap_or("-");
    format!(
        "{:<14} {:<16} {:<32} {:>10}  stock {}/{}",
        product.sku,
        barcode,
        product.name,
        product.selling_price.to_string(),
        product.available_stock,
        product.current_stock
    )
}

pub fn render_resolution(resolution: &ScanResolution) -> String {
    match resolution {
        ScanResolution::Found { product } => format!("FOUND        {}", render_product(product)),
        ScanResolution::OutOfStock { product } => {
            format!("OUT OF STOCK {}", render_product(product))
        }
        ScanResolution::Unknown { code } => format!("UNKNOWN      {} is not in this store's catalog", code),
    }
}

pub fn render_outcome(outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Skipped => "Inventory is fresh, nothing to do".to_string(),
        RefreshOutcome::Refreshed { product_count } => {
            format!("Inventory refreshed: {} products", product_count)
        }
        RefreshOutcome::Failed { error } => {
            format!("Inventory refresh failed ({}); serving cached data", error)
        }
        RefreshOutcome::Superseded => "Refresh superseded by a newer request".to_string(),
    }
}

fn render_status(cache: &CacheStatusReport, scanner: &ScannerStatus) -> String {
    let refreshed = cache
        .last_refreshed_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut lines = vec![
        format!(
            "inventory: {} | store {} | {} products | refreshed {}",
            cache.status,
            cache.store_id.as_deref().unwrap_or("-"),
            cache.product_count,
            refreshed
        ),
        format!(
            "scanner:   {:?} | {} scans, {} repeats dropped",
            scanner.state, scanner.accepted, scanner.suppressed
        ),
    ];
    if let Some(err) = &cache.last_error {
        lines.push(format!("last inventory error: {}", err));
    }
    if let Some(err) = &scanner.error {
        lines.push(format!("scanner error: {}", err));
    }
    lines.join("\n")
}
