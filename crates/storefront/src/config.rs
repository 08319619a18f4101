//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults suit a local catalog API on port 6060.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `STOREFRONT_CURRENCY` - ISO code prices are shown in (default: INR)
//! - `JEWELBOX_API_URL` - Catalog REST API base URL (default: <http://localhost:6060>)
//! - `API_TIMEOUT_SECS` - Per-request timeout for API calls (default: 10)
//! - `API_CACHE_TTL_SECS` - Product cache lifetime (default: 300)
//! - `WISHLIST_DIR` - Directory for persisted wishlists (default: data/wishlists)
//! - `FEATURED_CATEGORY` - Category shown on the home page (default: trending)
//! - `STATIC_DIR` - Directory served under `/static` (default: crates/storefront/static)
//! - `LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use jewelbox_core::CurrencyCode;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
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
    /// Public base URL for the storefront
    pub base_url: String,
    /// Currency prices are displayed in
    pub currency: CurrencyCode,
    /// Catalog API configuration
    pub api: ApiConfig,
    /// Directory holding one JSON document per visitor wishlist
    pub wishlist_dir: PathBuf,
    /// Category fetched for the home page grid
    pub featured_category: String,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Emit JSON log lines instead of human-readable text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Catalog REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL; endpoint paths like `/api/products/...` are joined onto it
    pub base_url: Url,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// Lifetime of cached product responses
    pub cache_ttl: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is a valid URL"),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

const DEFAULT_API_URL: &str = "http://localhost:6060";

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let currency = parse_env("STOREFRONT_CURRENCY", "INR")?;
        let api = ApiConfig::from_env()?;
        let wishlist_dir = PathBuf::from(get_env_or_default("WISHLIST_DIR", "data/wishlists"));
        let featured_category = get_env_or_default("FEATURED_CATEGORY", "trending");
        let static_dir = PathBuf::from(get_env_or_default(
            "STATIC_DIR",
            "crates/storefront/static",
        ));
        let log_json = parse_log_format(&get_env_or_default("LOG_FORMAT", "text"))?;

        if featured_category.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "FEATURED_CATEGORY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            base_url,
            currency,
            api,
            wishlist_dir,
            featured_category,
            static_dir,
            log_json,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_env_or_default("JEWELBOX_API_URL", DEFAULT_API_URL);
        let base_url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("JEWELBOX_API_URL".to_string(), e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "JEWELBOX_API_URL".to_string(),
                "must be an http(s) base URL".to_string(),
            ));
        }

        let timeout_secs: u64 = parse_env("API_TIMEOUT_SECS", "10")?;
        let cache_ttl_secs: u64 = parse_env("API_CACHE_TTL_SECS", "300")?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

/// `json` selects JSON logs; `text` (or `pretty`) selects the default formatter.
fn parse_log_format(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(true),
        "text" | "pretty" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            "LOG_FORMAT".to_string(),
            format!("expected text or json, got {other}"),
        )),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
