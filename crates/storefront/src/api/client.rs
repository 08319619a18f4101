//! Catalog API client implementation.
//!
//! Uses `reqwest` for HTTP and caches product reads using `moka`.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use jewelbox_core::{Email, ProductId};

use super::cache::{CacheKey, CacheValue};
use super::types::{
    AddToCartRequest, Cart, CartEnvelope, Customer, Listing, LoginRequest, LoginResponse, Order,
    Product, Report,
};
use super::{ApiError, error_message};
use crate::config::ApiConfig;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the catalog REST API.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("jewelbox-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and decode a JSON body, mapping error statuses.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        match status {
            StatusCode::NOT_FOUND => return Err(ApiError::NotFound(error_message(&body))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ApiError::Unauthorized(error_message(&body)));
            }
            s if !s.is_success() => {
                tracing::error!(
                    status = %s,
                    body = %body.chars().take(500).collect::<String>(),
                    "Catalog API returned non-success status"
                );
                return Err(ApiError::Status {
                    status: s.as_u16(),
                    message: error_message(&body),
                });
            }
            _ => {}
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog API response"
            );
            ApiError::Parse(e)
        })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        self.send(self.inner.client.get(url)).await
    }

    async fn get_authed<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        token: &SecretString,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let request = self
            .inner
            .client
            .get(url)
            .bearer_auth(token.expose_secret());
        self.send(request).await
    }

    /// Fetch a product list through the cache.
    async fn cached_products(
        &self,
        key: CacheKey,
        segments: &[&str],
    ) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(products);
        }

        let products = self.get::<Listing<Product>>(segments).await?.into_items();

        self.inner
            .cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get all products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the body cannot be parsed.
    #[instrument(skip(self))]
    pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        self.cached_products(
            CacheKey::Category(category.to_string()),
            &["api", "products", "category", category],
        )
        .await
    }

    /// Get all products priced within `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the body cannot be parsed.
    #[instrument(skip(self))]
    pub async fn products_by_price(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, ApiError> {
        let (min_s, max_s) = (min.normalize().to_string(), max.normalize().to_string());
        self.cached_products(
            CacheKey::PriceBand { min, max },
            &["api", "products", "price", min_s.as_str(), max_s.as_str()],
        )
        .await
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self.get(&["api", "products", id.as_str()]).await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Add a product to the token holder's cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["api", "cart", "add"])?;
        let request = self
            .inner
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(&AddToCartRequest {
                product_id,
                quantity,
            });

        let envelope: CartEnvelope = self.send(request).await?;
        Ok(envelope.into_cart())
    }

    /// Get the token holder's cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn my_cart(&self, token: &SecretString) -> Result<Cart, ApiError> {
        let envelope: CartEnvelope = self.get_authed(&["api", "cart", "me"], token).await?;
        Ok(envelope.into_cart())
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` (or a 400 `Status`) for bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint(&["api", "auth", "login"])?;
        let request = self.inner.client.post(url).json(&LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        });
        self.send(request).await
    }

    // =========================================================================
    // Admin Methods
    // =========================================================================

    /// List customers (admin token required).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is not an admin's.
    #[instrument(skip(self, token))]
    pub async fn admin_customers(&self, token: &SecretString) -> Result<Vec<Customer>, ApiError> {
        let listing: Listing<Customer> = self
            .get_authed(&["api", "admin", "customers"], token)
            .await?;
        Ok(listing.into_items())
    }

    /// List orders (admin token required).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is not an admin's.
    #[instrument(skip(self, token))]
    pub async fn admin_orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        let listing: Listing<Order> = self.get_authed(&["api", "admin", "orders"], token).await?;
        Ok(listing.into_items())
    }

    /// Store-wide sales report (admin token required).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` if the token is not an admin's.
    #[instrument(skip(self, token))]
    pub async fn admin_reports(&self, token: &SecretString) -> Result<Report, ApiError> {
        self.get_authed(&["api", "admin", "reports"], token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client_for(base: &str) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: Url::parse(base).unwrap(),
            timeout: Duration::from_secs(1),
            cache_ttl: Duration::from_secs(60),
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = client_for("http://localhost:6060");
        let url = client.endpoint(&["api", "products", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:6060/api/products/abc");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client_for("https://shop.example.com/backend/");
        let url = client.endpoint(&["api", "cart", "me"]).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/backend/api/cart/me");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client_for("http://localhost:6060");
        let url = client
            .endpoint(&["api", "products", "category", "rose gold/rings"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:6060/api/products/category/rose%20gold%2Frings"
        );
    }
}
