//! `HttpInventoryApi` against a local inventory server.
//!
//! Each test starts an axum router on `127.0.0.1:0` whose responses are
//! scripted per page and attempt, and which records every request it sees.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tillpoint_inventory::{ApiSettings, HttpInventoryApi, InventoryApi, InventoryError};

// =============================================================================
// Test Server
// =============================================================================

#[derive(Debug, Clone)]
struct Seen {
    store_id: String,
    page: u32,
    page_size: u32,
    auth: Option<String>,
}

/// `(page, request number) -> (status, body)`. Request numbers start at 1.
type Responder = Arc<dyn Fn(u32, usize) -> (StatusCode, Value) + Send + Sync>;

#[derive(Clone)]
struct ServerState {
    respond: Responder,
    seen: Arc<Mutex<Vec<Seen>>>,
}

async fn inventory_handler(
    State(state): State<ServerState>,
    Path(store_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let param = |name: &str| query.get(name).and_then(|v| v.parse().ok()).unwrap_or(0);
    let page = param("page");

    let request_number = {
        let mut seen = state.seen.lock();
        seen.push(Seen {
            store_id,
            page,
            page_size: param("page_size"),
            auth: headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });
        seen.len()
    };

    let (status, body) = (state.respond)(page, request_number);
    (status, body.to_string())
}

async fn start_server(
    respond: impl Fn(u32, usize) -> (StatusCode, Value) + Send + Sync + 'static,
) -> (String, Arc<Mutex<Vec<Seen>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/api/v1/inventory/stores/{store_id}", get(inventory_handler))
        .with_state(ServerState {
            respond: Arc::new(respond),
            seen: seen.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr: SocketAddr = listener.local_addr().expect("listener addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve inventory api");
    });

    (format!("http://{addr}/api/v1"), seen)
}

// =============================================================================
// Helpers
// =============================================================================

fn records(range: std::ops::Range<u32>) -> Vec<Value> {
    range
        .map(|i| {
            json!({
                "id": format!("inv-{i}"),
                "product_id": format!("p-{i}"),
                "sku": format!("SKU-{i}"),
                "barcode": format!("2000000000{i:03}"),
                "name": format!("Item {i}"),
                "selling_price": "1.00",
                "current_stock": 5
            })
        })
        .collect()
}

fn ok_page(rows: Vec<Value>, pagination: Value) -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({ "success": true, "data": rows, "pagination": pagination }),
    )
}

fn client(base_url: &str, configure: impl FnOnce(&mut ApiSettings)) -> HttpInventoryApi {
    let mut settings = ApiSettings {
        base_url: base_url.to_string(),
        ..Default::default()
    };
    configure(&mut settings);
    HttpInventoryApi::new(settings).expect("valid settings")
}

fn pages(seen: &Mutex<Vec<Seen>>) -> Vec<u32> {
    seen.lock().iter().map(|s| s.page).collect()
}

// =============================================================================
// Paging
// =============================================================================

#[tokio::test]
async fn fetches_every_page_when_server_caps_page_size() {
    // Asked for 1000 rows, the server sends 2 per page and says so.
    let (base_url, seen) = start_server(|page, _| {
        let start = (page - 1) * 2;
        ok_page(
            records(start..start + 2),
            json!({ "page": page, "page_size": 2, "total": 6, "total_pages": 3 }),
        )
    })
    .await;

    let products = client(&base_url, |_| {})
        .fetch_store_inventory("s1")
        .await
        .unwrap();

    assert_eq!(products.len(), 6);
    assert_eq!(products[5].sku, "SKU-5");
    assert_eq!(pages(&seen), vec![1, 2, 3]);

    let seen = seen.lock();
    assert!(seen.iter().all(|s| s.store_id == "s1" && s.page_size == 1000));
}

#[tokio::test]
async fn short_page_ends_listing_without_metadata() {
    let (base_url, seen) = start_server(|page, _| {
        let rows = if page == 1 { records(0..3) } else { records(3..4) };
        (StatusCode::OK, json!({ "success": true, "data": rows }))
    })
    .await;

    let products = client(&base_url, |s| s.page_size = 3)
        .fetch_store_inventory("s1")
        .await
        .unwrap();

    assert_eq!(products.len(), 4);
    assert_eq!(pages(&seen), vec![1, 2]);
}

#[tokio::test]
async fn max_pages_guard_stops_endless_listing() {
    let (base_url, seen) = start_server(|page, _| {
        let start = (page - 1) * 2;
        (
            StatusCode::OK,
            json!({ "success": true, "data": { "items": records(start..start + 2) } }),
        )
    })
    .await;

    let products = client(&base_url, |s| {
        s.page_size = 2;
        s.max_pages = 3;
    })
    .fetch_store_inventory("s1")
    .await
    .unwrap();

    assert_eq!(products.len(), 6);
    assert_eq!(pages(&seen), vec![1, 2, 3]);
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn sends_bearer_token_only_when_configured() {
    let (base_url, seen) = start_server(|_, _| {
        ok_page(records(0..1), json!({ "total_pages": 1 }))
    })
    .await;

    client(&base_url, |s| s.token = Some("secret".into()))
        .fetch_store_inventory("s1")
        .await
        .unwrap();
    client(&base_url, |_| {})
        .fetch_store_inventory("s1")
        .await
        .unwrap();

    let seen = seen.lock();
    assert_eq!(seen[0].auth.as_deref(), Some("Bearer secret"));
    assert_eq!(seen[1].auth, None);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn unsuccessful_later_page_fails_whole_fetch() {
    let (base_url, seen) = start_server(|page, _| {
        if page == 1 {
            ok_page(records(0..2), json!({ "page_size": 2, "total_pages": 2 }))
        } else {
            (
                StatusCode::OK,
                json!({ "success": false, "message": "store is being migrated" }),
            )
        }
    })
    .await;

    let err = client(&base_url, |_| {})
        .fetch_store_inventory("s1")
        .await
        .unwrap_err();

    assert!(
        matches!(err, InventoryError::Api { ref message } if message == "store is being migrated"),
        "unexpected error: {err:?}"
    );
    assert_eq!(pages(&seen), vec![1, 2]);
}

#[tokio::test]
async fn retries_server_errors_on_the_same_page() {
    let (base_url, seen) = start_server(|_, request_number| {
        if request_number == 1 {
            (StatusCode::SERVICE_UNAVAILABLE, json!({ "success": false }))
        } else {
            ok_page(records(0..2), json!({ "total_pages": 1 }))
        }
    })
    .await;

    let products = client(&base_url, |_| {})
        .fetch_store_inventory("s1")
        .await
        .unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(pages(&seen), vec![1, 1]);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let (base_url, seen) = start_server(|_, _| (StatusCode::NOT_FOUND, json!({}))).await;

    let err = client(&base_url, |_| {})
        .fetch_store_inventory("s1")
        .await
        .unwrap_err();

    assert!(matches!(err, InventoryError::Status { code: 404 }), "unexpected error: {err:?}");
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn gives_up_when_retry_budget_is_spent() {
    let (base_url, seen) =
        start_server(|_, _| (StatusCode::INTERNAL_SERVER_ERROR, json!({}))).await;

    let err = client(&base_url, |s| s.retry_max_elapsed_secs = 1)
        .fetch_store_inventory("s1")
        .await
        .unwrap_err();

    assert!(matches!(err, InventoryError::Status { code: 500 }), "unexpected error: {err:?}");
    assert!(seen.lock().len() >= 2);
}
