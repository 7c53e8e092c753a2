//! Integration tests for the collection feed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p collection-feed-integration-tests
//! ```
//!
//! No network access is needed. Feed tests run against [`FakeSource`], an
//! in-memory [`ProductSource`]; client tests run against a local axum server
//! that imitates the store's `products.json` endpoint.
//!
//! # Test Categories
//!
//! - `feed_driver` - Mounted feed behavior (paging, stale results, retry)
//! - `products_json` - HTTP client against a local fake store
//! - `live_feed` - WebSocket feed end to end against a local fake store
//! - `storefront_routes` - Page shell, health checks and middleware

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use collection_feed_core::feed::PageNumber;
use collection_feed_core::types::{
    Handle, Product, ProductId, ProductImage, ProductPage, Variant, VariantId,
};
use collection_feed_storefront::config::StorefrontConfig;
use collection_feed_storefront::feed::FeedUpdate;
use collection_feed_storefront::shopify::{ProductSource, ShopifyError};
use rust_decimal::Decimal;
use tokio::sync::{Notify, mpsc};

/// How long tests wait for an update before failing.
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long tests wait to conclude that no update is coming.
pub const QUIET_PERIOD: Duration = Duration::from_millis(100);

type PageKey = (String, u32);

/// In-memory product source with scriptable failures and gates.
///
/// Pages that were never added load as empty.
#[derive(Clone, Default)]
pub struct FakeSource {
    inner: Arc<Mutex<FakeSourceInner>>,
}

#[derive(Default)]
struct FakeSourceInner {
    pages: HashMap<PageKey, Vec<Product>>,
    fail_once: HashSet<PageKey>,
    gates: HashMap<PageKey, Arc<Notify>>,
    calls: Vec<PageKey>,
}

impl FakeSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeSourceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve `products` for `handle`'s page `page`.
    #[must_use]
    pub fn with_page(self, handle: &str, page: u32, products: Vec<Product>) -> Self {
        self.lock()
            .pages
            .insert((handle.to_string(), page), products);
        self
    }

    /// Make the next load of this page fail with a server error.
    #[must_use]
    pub fn failing_once(self, handle: &str, page: u32) -> Self {
        self.lock().fail_once.insert((handle.to_string(), page));
        self
    }

    /// Hold loads of this page until [`FakeSource::release`] is called.
    #[must_use]
    pub fn gated(self, handle: &str, page: u32) -> Self {
        self.lock()
            .gates
            .insert((handle.to_string(), page), Arc::new(Notify::new()));
        self
    }

    /// Let one held load of this page finish.
    pub fn release(&self, handle: &str, page: u32) {
        if let Some(gate) = self.lock().gates.get(&(handle.to_string(), page)) {
            gate.notify_one();
        }
    }

    /// Every load started so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.lock().calls.clone()
    }
}

impl ProductSource for FakeSource {
    async fn load_page(&self, handle: &Handle, page: PageNumber) -> Result<ProductPage, ShopifyError> {
        let key = (handle.to_string(), page.get());

        let gate = {
            let mut inner = self.lock();
            inner.calls.push(key.clone());
            inner.gates.get(&key).cloned()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut inner = self.lock();
        if inner.fail_once.remove(&key) {
            return Err(ShopifyError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        Ok(ProductPage {
            products: inner.pages.get(&key).cloned().unwrap_or_default(),
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A product with one image and one variant per price.
#[must_use]
pub fn product(id: u64, handle: &str, prices: &[&str]) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        handle: handle.to_string(),
        images: vec![ProductImage {
            id: None,
            src: format!("https://cdn.shopify.com/s/files/1/{id}.jpg"),
            alt: None,
        }],
        variants: prices
            .iter()
            .zip(1_u64..)
            .map(|(price, n)| Variant {
                id: VariantId::new(id * 100 + n),
                title: format!("Size {n}"),
                price: price.parse::<Decimal>().unwrap_or_default().into(),
            })
            .collect(),
    }
}

/// `count` products with consecutive ids starting at `first_id`.
#[must_use]
pub fn products(first_id: u64, count: u64) -> Vec<Product> {
    (first_id..first_id + count)
        .map(|id| product(id, &format!("product-{id}"), &["58.00"]))
        .collect()
}

/// Configuration for router tests. Points at a store that is never contacted
/// unless a test asks for readiness.
///
/// # Panics
///
/// Panics if the fixed test configuration is rejected.
#[must_use]
pub fn test_config(store_domain: &str) -> StorefrontConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("SHOPIFY_STORE_DOMAIN", store_domain.to_string()),
        ("STOREFRONT_COLLECTION_TITLE", "SUMMERSALT".to_string()),
        ("SHOPIFY_REQUEST_TIMEOUT_SECS", "2".to_string()),
        (
            "STOREFRONT_STATIC_DIR",
            concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static").to_string(),
        ),
    ]);
    StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config is valid")
}

// =============================================================================
// Helpers
// =============================================================================

/// Wait for the next feed update.
///
/// # Panics
///
/// Panics if no update arrives in time or the feed has closed.
pub async fn next_update(updates: &mut mpsc::Receiver<FeedUpdate>) -> FeedUpdate {
    tokio::time::timeout(UPDATE_TIMEOUT, updates.recv())
        .await
        .expect("timed out waiting for a feed update")
        .expect("feed closed")
}

/// Assert that the feed stays quiet for a short while.
///
/// # Panics
///
/// Panics if an update arrives.
pub async fn assert_quiet(updates: &mut mpsc::Receiver<FeedUpdate>) {
    if let Ok(update) = tokio::time::timeout(QUIET_PERIOD, updates.recv()).await {
        panic!("expected no update, got {update:?}");
    }
}

/// Serve `router` on an ephemeral local port.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn spawn_server(router: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}
