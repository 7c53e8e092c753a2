//! Core types for the collection feed.
//!
//! This module provides type-safe wrappers for storefront domain concepts.

pub mod handle;
pub mod id;
pub mod price;
pub mod product;

pub use handle::{Handle, HandleError};
pub use id::*;
pub use price::{Price, PriceRange, PriceRangeError};
pub use product::{Product, ProductImage, ProductPage, Variant};
