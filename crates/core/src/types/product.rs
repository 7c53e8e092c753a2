//! Product records as served by the storefront `products.json` API.
//!
//! Only the fields the collection feed renders are modelled; everything
//! else in the payload is ignored during deserialization.

use serde::{Deserialize, Serialize};

use super::id::{ImageId, ProductId, VariantId};
use super::price::{Price, PriceRange, PriceRangeError};

/// A product in a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// URL slug of the product detail page.
    pub handle: String,
    /// Ordered images; the first one is the thumbnail.
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Ordered purchasable variants.
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    /// The image shown on product cards, if the product has any.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&ProductImage> {
        self.images.first()
    }

    /// Lowest and highest variant price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceRangeError::NoVariants`] for a product without variants.
    pub fn price_range(&self) -> Result<PriceRange, PriceRangeError> {
        PriceRange::from_prices(self.variants.iter().map(|v| v.price))
    }

    /// Path of the product detail page.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/products/{}", self.handle)
    }
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(default)]
    pub id: Option<ImageId>,
    /// Absolute image URL.
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A purchasable configuration of a product (size, color, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    #[serde(default)]
    pub title: String,
    pub price: Price,
}

/// One page of a collection's products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
}

impl ProductPage {
    /// Number of products on the page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the page is empty, which marks the end of a collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
