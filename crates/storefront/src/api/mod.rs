//! Client for the Jewelbox catalog REST API.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`; the API is the source of truth for
//!   products, carts, customers, orders and reports
//! - Product reads are cached in memory via `moka` (TTL from config)
//! - Cart and admin reads are never cached
//! - Authenticated calls send the visitor's login token as a bearer token
//!
//! # Endpoints
//!
//! ```text
//! GET  /api/products/category/:name
//! GET  /api/products/price/:min/:max
//! GET  /api/products/:id
//! POST /api/cart/add
//! GET  /api/cart/me
//! POST /api/auth/login
//! GET  /api/admin/customers
//! GET  /api/admin/orders
//! GET  /api/admin/reports
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use jewelbox_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let rings = client.products_by_category("rings").await?;
//! let product = client.product(&rings[0].id).await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an unexpected status.
    #[error("API returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing, expired or insufficient bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built from the configured base.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether the failure is the caller's credentials rather than the API.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Pull a human-readable message out of an error response body.
///
/// The API answers errors with `{"message": "..."}` or `{"error": "..."}`;
/// anything else is truncated raw text.
pub(crate) fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("product abc".to_string());
        assert_eq!(err.to_string(), "Not found: product abc");

        let err = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API returned 500: boom");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_error_message_json_message() {
        assert_eq!(error_message(r#"{"message":"Invalid credentials"}"#), "Invalid credentials");
        assert_eq!(error_message(r#"{"error":"No token"}"#), "No token");
    }

    #[test]
    fn test_error_message_raw_text_truncated() {
        let body = "x".repeat(500);
        assert_eq!(error_message(&body).len(), 200);
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(ApiError::Unauthorized("expired".to_string()).is_unauthorized());
        assert!(!ApiError::NotFound("x".to_string()).is_unauthorized());
    }
}
