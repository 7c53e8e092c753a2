//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Route handlers return `Result<T, AppError>`, and
//! the live feed uses [`AppError::public_message`] for the text it shows when
//! a page fails to load.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use collection_feed_core::feed::RouteError;
use thiserror::Error;

use crate::shopify::ShopifyError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storefront API request failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// The route did not resolve to a usable collection handle.
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether the error points at a server-side or upstream fault.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Shopify(err) if !matches!(err, ShopifyError::NotFound(_)))
    }

    /// Log the error and report it to Sentry if it is a server fault.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Client error");
        }
    }

    /// HTTP status for the error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Shopify(ShopifyError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Shopify(ShopifyError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Shopify(_) => StatusCode::BAD_GATEWAY,
            Self::Route(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show to shoppers. Never includes upstream detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Shopify(ShopifyError::NotFound(_)) => {
                "This collection could not be found.".to_string()
            }
            Self::Shopify(ShopifyError::RateLimited(seconds)) => {
                format!("The store is busy right now. Please try again in {seconds} seconds.")
            }
            Self::Shopify(_) => "We couldn't load more products. Please try again.".to_string(),
            Self::Route(RouteError::MissingHandle) => "No collection was selected.".to_string(),
            Self::Route(RouteError::InvalidHandle(_)) => {
                "That collection link is not valid.".to_string()
            }
            Self::NotFound(_) => "Page not found.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        // Don't expose internal error details to clients
        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for feed activity.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("feed", "Loaded page", Some(&[("handle", "swim"), ("page", "2")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
