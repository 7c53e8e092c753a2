//! Client for the storefront `products.json` endpoints.

use std::sync::Arc;
use std::time::Duration;

use collection_feed_core::Handle;
use collection_feed_core::feed::{PAGE_SIZE, PageNumber};
use collection_feed_core::types::ProductPage;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{ProductSource, ShopifyError};
use crate::config::ShopConfig;

/// Maximum number of body characters kept in errors and logs.
const BODY_PREVIEW_CHARS: usize = 200;

/// Client for a store's public `products.json` API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ProductsJsonClient {
    inner: Arc<ProductsJsonClientInner>,
}

struct ProductsJsonClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl ProductsJsonClient {
    /// Create a client for `https://{store_domain}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain does not form a valid URL or the HTTP
    /// client cannot be built.
    pub fn new(config: &ShopConfig) -> Result<Self, ShopifyError> {
        let base_url = Url::parse(&format!("https://{}/", config.store_domain))?;
        Self::with_base_url(base_url, config.request_timeout)
    }

    /// Create a client against an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_base_url(base_url: Url, timeout: Duration) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ProductsJsonClientInner { client, base_url }),
        })
    }

    /// `{base}/collections/{handle}/products.json?page={page}&limit=10`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be joined onto the base URL.
    pub fn products_url(&self, handle: &Handle, page: PageNumber) -> Result<Url, ShopifyError> {
        let mut url = self
            .inner
            .base_url
            .join(&format!("collections/{handle}/products.json"))?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &PAGE_SIZE.to_string());
        Ok(url)
    }

    /// Check that the store answers `products.json` requests.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the store is unreachable or answers
    /// with an unexpected payload.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), ShopifyError> {
        let mut url = self.inner.base_url.join("products.json")?;
        url.query_pairs_mut().append_pair("limit", "1");
        self.get_json::<ProductPage>(url, "products.json").await?;
        Ok(())
    }

    /// GET `url` and decode a JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url, resource: &str) -> Result<T, ShopifyError> {
        let response = self
            .inner
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ShopifyError::NotFound(resource.to_string()));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %preview(&response_text),
                "Storefront returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: preview(&response_text),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %preview(&response_text),
                "Failed to parse storefront response"
            );
            ShopifyError::Parse(e)
        })
    }
}

impl ProductSource for ProductsJsonClient {
    #[instrument(skip_all, fields(handle = %handle, page = %page))]
    async fn load_page(&self, handle: &Handle, page: PageNumber) -> Result<ProductPage, ShopifyError> {
        let url = self.products_url(handle, page)?;
        let loaded: ProductPage = self.get_json(url, handle.as_str()).await?;
        debug!(count = loaded.len(), "Loaded collection page");
        Ok(loaded)
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
