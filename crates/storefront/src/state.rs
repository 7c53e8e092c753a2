//! Application state shared across handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::StorefrontConfig;
use crate::shopify::{ProductsJsonClient, ShopifyError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration and the storefront API client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    source: ProductsJsonClient,
    live_feeds: AtomicUsize,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the storefront client cannot be built from the
    /// configured store domain.
    pub fn new(config: StorefrontConfig) -> Result<Self, ShopifyError> {
        let source = ProductsJsonClient::new(&config.shop)?;
        Ok(Self::with_source(config, source))
    }

    /// Create application state around an existing client.
    #[must_use]
    pub fn with_source(config: StorefrontConfig, source: ProductsJsonClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                source,
                live_feeds: AtomicUsize::new(0),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the `products.json` client.
    #[must_use]
    pub fn source(&self) -> &ProductsJsonClient {
        &self.inner.source
    }

    /// Number of live feed connections currently mounted.
    #[must_use]
    pub fn live_feed_count(&self) -> usize {
        self.inner.live_feeds.load(Ordering::Acquire)
    }

    /// Count a live feed as mounted until the returned guard is dropped.
    #[must_use]
    pub fn track_live_feed(&self) -> LiveFeedGuard {
        self.inner.live_feeds.fetch_add(1, Ordering::AcqRel);
        LiveFeedGuard {
            state: self.clone(),
        }
    }
}

/// Keeps a live feed counted in [`AppState::live_feed_count`].
pub struct LiveFeedGuard {
    state: AppState,
}

impl LiveFeedGuard {
    /// Live feeds mounted right now, this one included.
    #[must_use]
    pub fn active(&self) -> usize {
        self.state.live_feed_count()
    }
}

impl Drop for LiveFeedGuard {
    fn drop(&mut self) {
        self.state.inner.live_feeds.fetch_sub(1, Ordering::AcqRel);
    }
}
