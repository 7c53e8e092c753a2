//! End-to-end tests for the live feed socket.
//!
//! Each test serves the full storefront router on a local port, points it at
//! a local axum store, and talks to `/feed/live` with a WebSocket client.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use collection_feed_integration_tests::{QUIET_PERIOD, UPDATE_TIMEOUT, spawn_server, test_config};
use collection_feed_storefront::routes;
use collection_feed_storefront::shopify::ProductsJsonClient;
use collection_feed_storefront::state::AppState;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const NAVIGATE_SWIM: &str = r#"{"type":"navigate","is_ready":true,"handle":"swim"}"#;
const NAVIGATE_PENDING: &str = r#"{"type":"navigate","is_ready":false}"#;
const SCROLL_NEAR_BOTTOM: &str =
    r#"{"type":"scroll","scroll_top":1650,"client_height":800,"scroll_height":2600}"#;
const RETRY: &str = r#"{"type":"retry"}"#;

fn products_json(first_id: u64, count: u64) -> String {
    let products: Vec<Value> = (first_id..first_id + count)
        .map(|id| {
            json!({
                "id": id,
                "title": format!("Product {id}"),
                "handle": format!("product-{id}"),
                "images": [{"src": format!("https://cdn.shopify.com/s/files/1/{id}.jpg")}],
                "variants": [{"id": id * 100, "title": "Default", "price": "58.00"}],
            })
        })
        .collect();
    json!({ "products": products }).to_string()
}

/// A store with three products on page 1, a page 2 that fails on its first
/// load, and nothing after that.
async fn fake_store() -> SocketAddr {
    let page_two_loads = Arc::new(AtomicUsize::new(0));

    let router = Router::new().route(
        "/collections/{handle}/products.json",
        get(
            move |Path(handle): Path<String>, Query(query): Query<HashMap<String, String>>| {
                let page_two_loads = Arc::clone(&page_two_loads);
                async move {
                    let json = [("content-type", "application/json")];
                    match (handle.as_str(), query.get("page").map(String::as_str)) {
                        ("swim", Some("1")) => (json, products_json(1, 3)).into_response(),
                        ("swim", Some("2")) => {
                            if page_two_loads.fetch_add(1, Ordering::SeqCst) == 0 {
                                (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
                            } else {
                                (json, products_json(4, 2)).into_response()
                            }
                        }
                        _ => (json, r#"{"products":[]}"#).into_response(),
                    }
                }
            },
        ),
    );

    spawn_server(router).await
}

/// Serve the storefront against a fresh fake store.
async fn storefront() -> (SocketAddr, AppState) {
    let store = fake_store().await;
    let source = ProductsJsonClient::with_base_url(
        Url::parse(&format!("http://{store}/")).unwrap(),
        Duration::from_secs(2),
    )
    .unwrap();
    let state = AppState::with_source(test_config("summersalt.com"), source);
    let addr = spawn_server(routes::app(state.clone())).await;
    (addr, state)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/feed/live")).await.unwrap();
    client
}

async fn send(client: &mut Client, text: &str) {
    client.send(Message::text(text)).await.unwrap();
}

/// Wait for the next server message, skipping control frames.
async fn recv(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(UPDATE_TIMEOUT, client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn assert_no_message(client: &mut Client) {
    if let Ok(message) = tokio::time::timeout(QUIET_PERIOD, client.next()).await {
        panic!("expected no message, got {message:?}");
    }
}

async fn wait_for_unmount(state: &AppState) {
    tokio::time::timeout(UPDATE_TIMEOUT, async {
        while state.live_feed_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

async fn wait_for_mount(state: &AppState) {
    tokio::time::timeout(UPDATE_TIMEOUT, async {
        while state.live_feed_count() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

// =============================================================================
// Loading
// =============================================================================

#[tokio::test]
async fn test_navigate_streams_first_page() {
    let (addr, _) = storefront().await;
    let mut client = connect(addr).await;

    send(&mut client, NAVIGATE_SWIM).await;

    assert_eq!(recv(&mut client).await, json!({"type": "reset", "handle": "swim"}));
    assert_eq!(recv(&mut client).await, json!({"type": "loading", "page": 1}));

    let append = recv(&mut client).await;
    assert_eq!(append["type"], "append");
    assert_eq!(append["page"], 1);
    let html = append["html"].as_str().unwrap();
    assert_eq!(html.matches(r#"class="product-item""#).count(), 3);
    assert!(html.contains(r#"href="/products/product-1""#));
    assert!(html.contains("$58.00"));
}

#[tokio::test]
async fn test_pending_route_answers_without_loading() {
    let (addr, _) = storefront().await;
    let mut client = connect(addr).await;

    send(&mut client, NAVIGATE_PENDING).await;

    assert_eq!(recv(&mut client).await, json!({"type": "pending"}));
    assert_no_message(&mut client).await;
}

#[tokio::test]
async fn test_failed_page_retries_then_exhausts() {
    let (addr, _) = storefront().await;
    let mut client = connect(addr).await;

    send(&mut client, NAVIGATE_SWIM).await;
    for _ in 0..3 {
        recv(&mut client).await;
    }

    send(&mut client, SCROLL_NEAR_BOTTOM).await;
    assert_eq!(recv(&mut client).await, json!({"type": "loading", "page": 2}));
    let error = recv(&mut client).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["page"], 2);
    assert_eq!(error["retryable"], true);
    assert!(error["html"].as_str().unwrap().contains("data-feed-retry"));

    // Retry asks for the same page again.
    send(&mut client, RETRY).await;
    assert_eq!(recv(&mut client).await, json!({"type": "loading", "page": 2}));
    let append = recv(&mut client).await;
    assert_eq!(append["type"], "append");
    assert_eq!(append["page"], 2);
    assert_eq!(
        append["html"].as_str().unwrap().matches(r#"class="product-item""#).count(),
        2
    );

    send(&mut client, SCROLL_NEAR_BOTTOM).await;
    assert_eq!(recv(&mut client).await, json!({"type": "loading", "page": 3}));
    assert_eq!(recv(&mut client).await, json!({"type": "exhausted", "page": 3}));

    send(&mut client, SCROLL_NEAR_BOTTOM).await;
    assert_no_message(&mut client).await;
}

// =============================================================================
// Connection Handling
// =============================================================================

#[tokio::test]
async fn test_malformed_messages_keep_connection_open() {
    let (addr, _) = storefront().await;
    let mut client = connect(addr).await;

    send(&mut client, "not json").await;
    send(&mut client, r#"{"type":"teleport"}"#).await;
    send(&mut client, r#"{"type":"scroll","scroll_top":"high"}"#).await;
    assert_no_message(&mut client).await;

    send(&mut client, NAVIGATE_SWIM).await;
    assert_eq!(recv(&mut client).await, json!({"type": "reset", "handle": "swim"}));
}

#[tokio::test]
async fn test_burst_of_messages_is_answered_in_full() {
    const BURST: usize = 300;

    let (addr, state) = storefront().await;
    let mut client = connect(addr).await;

    // Send everything before reading anything back.
    for _ in 0..BURST {
        send(&mut client, NAVIGATE_PENDING).await;
    }
    for _ in 0..BURST {
        assert_eq!(recv(&mut client).await, json!({"type": "pending"}));
    }

    client.close(None).await.unwrap();
    wait_for_unmount(&state).await;
}

#[tokio::test]
async fn test_burst_of_scrolls_does_not_stall_the_feed() {
    let (addr, _) = storefront().await;
    let mut client = connect(addr).await;

    send(&mut client, NAVIGATE_SWIM).await;
    for _ in 0..3 {
        recv(&mut client).await;
    }

    // Scrolls may be dropped while the feed is busy, but later messages
    // still get through.
    for _ in 0..500 {
        send(&mut client, SCROLL_NEAR_BOTTOM).await;
    }
    send(&mut client, NAVIGATE_PENDING).await;

    let mut seen = Vec::new();
    loop {
        let message = recv(&mut client).await;
        if message == json!({"type": "pending"}) {
            break;
        }
        seen.push(message);
    }
    assert!(seen.contains(&json!({"type": "loading", "page": 2})));
}

#[tokio::test]
async fn test_closing_socket_unmounts_feed() {
    let (addr, state) = storefront().await;
    let mut client = connect(addr).await;

    send(&mut client, NAVIGATE_SWIM).await;
    recv(&mut client).await;
    wait_for_mount(&state).await;
    assert_eq!(state.live_feed_count(), 1);

    client.close(None).await.unwrap();
    wait_for_unmount(&state).await;
}

#[tokio::test]
async fn test_each_connection_mounts_its_own_feed() {
    let (addr, state) = storefront().await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;

    send(&mut first, NAVIGATE_SWIM).await;
    send(&mut second, NAVIGATE_PENDING).await;

    assert_eq!(recv(&mut first).await, json!({"type": "reset", "handle": "swim"}));
    assert_eq!(recv(&mut second).await, json!({"type": "pending"}));
    assert_eq!(state.live_feed_count(), 2);

    drop(first);
    drop(second);
    wait_for_unmount(&state).await;
}
