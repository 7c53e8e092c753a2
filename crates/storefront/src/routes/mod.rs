//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store reachable)
//! GET  /collections/{handle}   - Collection page shell
//! GET  /feed/live              - Live feed WebSocket
//! GET  /static/*               - Feed script and stylesheet
//! ```

pub mod collections;
pub mod live;

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Request, Response, StatusCode, header::CACHE_CONTROL},
    middleware::from_fn,
    routing::get,
};
use tower::Layer;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Path of the live feed socket, rendered into the collection page.
pub const LIVE_FEED_PATH: &str = "/feed/live";

const STATIC_CACHE_CONTROL: &str = "public, max-age=3600";

/// Create the collection page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/collections/{handle}", get(collections::show))
        .route(LIVE_FEED_PATH, get(live::live))
}

/// Build the full application router with health checks, static files and
/// the request middleware stack.
pub fn app(state: AppState) -> Router {
    let static_files = SetResponseHeaderLayer::if_not_present(
        CACHE_CONTROL,
        HeaderValue::from_static(STATIC_CACHE_CONTROL),
    )
    .layer(ServeDir::new(&state.config().static_dir));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service("/static", static_files)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store's `products.json` cannot be
/// fetched.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.source().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Store is not reachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
