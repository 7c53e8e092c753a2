//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE_DOMAIN` - Storefront host serving `products.json` (e.g., summersalt.com)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STATIC_DIR` - Directory served under `/static`
//!   (default: crates/storefront/static)
//! - `STOREFRONT_COLLECTION_TITLE` - Heading above the product list
//!   (default: first label of the store domain, upper-cased)
//! - `SHOPIFY_REQUEST_TIMEOUT_SECS` - Timeout for one page fetch (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory with the browser script and stylesheet
    pub static_dir: PathBuf,
    /// Heading rendered above the product list
    pub collection_title: String,
    /// Storefront `products.json` API configuration
    pub shop: ShopConfig,
    /// Sentry error tracking configuration
    pub sentry: SentryConfig,
}

/// Storefront `products.json` API configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Store domain, without scheme or path (e.g., summersalt.com)
    pub store_domain: String,
    /// Timeout for a single page request
    pub request_timeout: Duration,
}

/// Sentry configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let host = env.parse_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parse_or("STOREFRONT_PORT", "3000")?;
        let static_dir = env
            .optional("STOREFRONT_STATIC_DIR")
            .map_or_else(|| PathBuf::from("crates/storefront/static"), PathBuf::from);

        let shop = ShopConfig {
            store_domain: validate_store_domain(&env.required("SHOPIFY_STORE_DOMAIN")?)?,
            request_timeout: Duration::from_secs(env.parse_or("SHOPIFY_REQUEST_TIMEOUT_SECS", "10")?),
        };

        let collection_title = env
            .optional("STOREFRONT_COLLECTION_TITLE")
            .unwrap_or_else(|| default_title(&shop.store_domain));

        let sentry = SentryConfig {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.optional("SENTRY_ENVIRONMENT"),
            sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        };

        Ok(Self {
            host,
            port,
            static_dir,
            collection_title,
            shop,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .as_deref()
            .unwrap_or(default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// The store domain is interpolated into `https://{domain}/...`, so it must be
/// a bare host.
fn validate_store_domain(domain: &str) -> Result<String, ConfigError> {
    let domain = domain.trim().trim_end_matches('/');
    if domain.contains("://") || domain.contains('/') || domain.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPIFY_STORE_DOMAIN".to_string(),
            "must be a bare host name such as summersalt.com".to_string(),
        ));
    }
    Ok(domain.to_string())
}

/// `www.summersalt.com` -> `SUMMERSALT`
fn default_title(store_domain: &str) -> String {
    let host = store_domain.strip_prefix("www.").unwrap_or(store_domain);
    host.split('.').next().unwrap_or(host).to_uppercase()
}
