//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::services::{FileBackend, WishlistBackend, WishlistStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog API client, the wishlist store, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    wishlists: WishlistStore,
}

impl AppState {
    /// Create application state with wishlists persisted under
    /// `config.wishlist_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let backend = Arc::new(FileBackend::new(config.wishlist_dir.clone()));
        Self::with_backend(config, backend)
    }

    /// Create application state with an explicit wishlist backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be built.
    pub fn with_backend(
        config: StorefrontConfig,
        backend: Arc<dyn WishlistBackend>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let wishlists = WishlistStore::new(backend);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                wishlists,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the wishlist store.
    #[must_use]
    pub fn wishlists(&self) -> &WishlistStore {
        &self.inner.wishlists
    }
}
