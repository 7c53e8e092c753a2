//! Storefront `products.json` API access.
//!
//! # Architecture
//!
//! - [`ProductSource`] is the seam between the feed and the network; the
//!   feed driver is generic over it so tests can substitute an in-memory
//!   source.
//! - [`ProductsJsonClient`] is the production source. It calls the public
//!   `/collections/{handle}/products.json` endpoint with `reqwest`; no
//!   access token is needed.
//! - Shopify is the source of truth. Pages are not cached; the only state
//!   is the accumulated list held by each mounted feed.
//!
//! # Example
//!
//! ```rust,ignore
//! use collection_feed_core::{Handle, feed::PageNumber};
//! use collection_feed_storefront::shopify::{ProductSource, ProductsJsonClient};
//!
//! let client = ProductsJsonClient::new(&config.shop)?;
//! let page = client.load_page(&Handle::parse("swim")?, PageNumber::FIRST).await?;
//! ```

mod products_json;

use std::future::Future;

use collection_feed_core::Handle;
use collection_feed_core::feed::PageNumber;
use collection_feed_core::types::ProductPage;
use thiserror::Error;

pub use products_json::ProductsJsonClient;

/// Errors that can occur when fetching from the storefront.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The storefront answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// First characters of the response body.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The collection does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Loads pages of a collection's products.
pub trait ProductSource: Clone + Send + Sync + 'static {
    /// Fetch one page of `handle`'s products.
    fn load_page(
        &self,
        handle: &Handle,
        page: PageNumber,
    ) -> impl Future<Output = Result<ProductPage, ShopifyError>> + Send;
}
