//! Collection page handler and product card views.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use collection_feed_core::types::{Handle, Product};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

use super::LIVE_FEED_PATH;

/// Price text for products without variants.
pub const PRICE_UNAVAILABLE: &str = "Price unavailable";

/// Product card display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCardView {
    pub id: String,
    pub href: String,
    pub title: String,
    pub price: String,
    /// Thumbnail URL, already safe to place inside an unquoted CSS `url()`.
    pub image_url: Option<String>,
    pub image_alt: String,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        let price = product.price_range().map_or_else(
            |err| {
                tracing::warn!(product_id = %product.id, error = %err, "Product has no price");
                PRICE_UNAVAILABLE.to_string()
            },
            |range| range.to_string(),
        );

        let thumbnail = product.thumbnail();

        Self {
            id: product.id.to_string(),
            href: product.path(),
            title: product.title.clone(),
            price,
            image_url: thumbnail.and_then(|image| css_url(&image.src)),
            image_alt: thumbnail
                .and_then(|image| image.alt.clone())
                .unwrap_or_else(|| product.title.clone()),
        }
    }
}

/// Normalize an image URL for use inside an unquoted `url()`.
///
/// Only absolute http(s) URLs are accepted. Quotes, parentheses and
/// backslashes are percent-encoded.
fn css_url(src: &str) -> Option<String> {
    let url = url::Url::parse(src).ok()?;
    if !matches!(url.scheme(), "https" | "http") {
        return None;
    }

    let mut out = String::with_capacity(url.as_str().len());
    for c in url.as_str().chars() {
        match c {
            '\'' => out.push_str("%27"),
            '"' => out.push_str("%22"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '\\' => out.push_str("%5C"),
            c => out.push(c),
        }
    }
    Some(out)
}

/// Collection page shell. Products arrive over the live feed.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub title: String,
    pub handle: String,
    pub live_path: &'static str,
}

/// Product cards appended to the list.
#[derive(Template)]
#[template(path = "partials/product_cards.html")]
pub struct ProductCardsTemplate {
    pub products: Vec<ProductCardView>,
}

impl ProductCardsTemplate {
    #[must_use]
    pub fn new(products: &[Product]) -> Self {
        Self {
            products: products.iter().map(ProductCardView::from).collect(),
        }
    }
}

/// Visible error state of the feed.
#[derive(Template)]
#[template(path = "partials/feed_error.html")]
pub struct FeedErrorTemplate {
    pub message: String,
    pub retryable: bool,
}

/// Display the collection page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<CollectionShowTemplate> {
    let handle = Handle::parse(&handle)
        .map_err(|_| AppError::NotFound(format!("/collections/{handle}")))?;

    Ok(CollectionShowTemplate {
        title: state.config().collection_title.clone(),
        handle: handle.into_inner(),
        live_path: LIVE_FEED_PATH,
    })
}
