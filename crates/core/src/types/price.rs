//! Price and price-range display using decimal arithmetic.
//!
//! Prices keep the scale they arrive with (`"58.00"` prints as `$58.00`,
//! `10` prints as `$10`). There is no currency localization: every amount
//! is shown with a `$` prefix.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A variant price in the store's currency.
///
/// Deserializes from either a JSON string (`"58.00"`, as the storefront
/// `products.json` API sends it) or a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Errors that can occur when computing a [`PriceRange`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceRangeError {
    /// There were no prices to compute a range over.
    #[error("product has no variants")]
    NoVariants,
}

/// Lowest and highest price across a product's variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    min: Price,
    max: Price,
}

impl PriceRange {
    /// Compute the range in a single pass. The first price seeds both bounds.
    ///
    /// # Errors
    ///
    /// Returns [`PriceRangeError::NoVariants`] if `prices` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use collection_feed_core::{Price, PriceRange};
    /// use rust_decimal::Decimal;
    ///
    /// let prices = [10, 25, 18].map(|p| Price::new(Decimal::from(p)));
    /// let range = PriceRange::from_prices(prices).unwrap();
    /// assert_eq!(range.to_string(), "$10 - $25");
    /// ```
    pub fn from_prices<I>(prices: I) -> Result<Self, PriceRangeError>
    where
        I: IntoIterator<Item = Price>,
    {
        let mut prices = prices.into_iter();
        let first = prices.next().ok_or(PriceRangeError::NoVariants)?;

        let (min, max) = prices.fold((first, first), |(min, max), price| {
            (
                if price < min { price } else { min },
                if price > max { price } else { max },
            )
        });

        Ok(Self { min, max })
    }

    /// Lowest price.
    #[must_use]
    pub const fn min(&self) -> Price {
        self.min
    }

    /// Highest price.
    #[must_use]
    pub const fn max(&self) -> Price {
        self.max
    }

    /// Whether every variant has the same price.
    #[must_use]
    pub fn is_single(&self) -> bool {
        self.min == self.max
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{} - {}", self.min, self.max)
        }
    }
}
