//! Integration tests for the storefront router.
//!
//! Requests go through the full middleware stack with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::{Router, routing::get};
use collection_feed_integration_tests::{spawn_server, test_config};
use collection_feed_storefront::routes;
use collection_feed_storefront::shopify::ProductsJsonClient;
use collection_feed_storefront::state::AppState;
use tower::ServiceExt;
use url::Url;

fn app() -> Router {
    routes::app(AppState::new(test_config("summersalt.com")).unwrap())
}

fn app_against(addr: SocketAddr) -> Router {
    let source = ProductsJsonClient::with_base_url(
        Url::parse(&format!("http://{addr}/")).unwrap(),
        Duration::from_secs(2),
    )
    .unwrap();
    routes::app(AppState::with_source(test_config("summersalt.com"), source))
}

async fn get_uri(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Collection Page
// =============================================================================

#[tokio::test]
async fn test_collection_page_renders_shell() {
    let response = get_uri(app(), "/collections/swim").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );

    let html = body_text(response).await;
    assert!(html.contains(r#"<h1 class="collection-title">SUMMERSALT</h1>"#));
    assert!(html.contains("Loading..."));
    assert!(html.contains(r#"data-handle="swim""#));
    assert!(html.contains(r#"data-live-path="/feed/live""#));
    assert!(html.contains(r#"class="product-list""#));
    assert!(!html.contains("product-item"));
    assert!(!html.contains("site-footer"));
}

#[tokio::test]
async fn test_invalid_collection_handle_is_not_found() {
    let response = get_uri(app(), "/collections/bad%20handle").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Page not found.");
}

#[tokio::test]
async fn test_live_feed_requires_websocket_upgrade() {
    let response = get_uri(app(), "/feed/live").await;
    assert!(response.status().is_client_error());
}

// =============================================================================
// Health Checks
// =============================================================================

#[tokio::test]
async fn test_health() {
    let response = get_uri(app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_ready_when_store_answers() {
    let store = Router::new().route(
        "/products.json",
        get(|| async {
            (
                [(header::CONTENT_TYPE, "application/json")],
                r#"{"products":[]}"#,
            )
        }),
    );
    let addr = spawn_server(store).await;

    let response = get_uri(app_against(addr), "/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_not_ready_when_store_is_down() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let response = get_uri(app_against(addr), "/health/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Middleware and Static Files
// =============================================================================

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let response = get_uri(app(), "/collections/swim").await;
    let headers = response.headers();

    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_static_feed_script_is_served_and_cacheable() {
    let response = get_uri(app(), "/static/feed.js").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=3600"
    );
    assert!(body_text(response).await.contains("WebSocket"));
}
