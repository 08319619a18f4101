//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (wishlist storage writable)
//!
//! # Products
//! GET  /products/{id}          - Product detail
//! GET  /category/{name}        - Category listing
//! GET  /price/{min}/{max}      - Price band listing
//! GET  /gifts/{band}           - Gift band listing
//!
//! # Cart (HTMX fragments, login required)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Wishlist (HTMX fragments)
//! GET  /wishlist               - Wishlist page
//! POST /wishlist/toggle        - Toggle a product (returns heart, triggers wishlist-updated)
//! GET  /wishlist/count         - Wishlist count badge (fragment)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action (rate limited)
//! POST /auth/logout            - Logout action
//!
//! # Admin (admin role required)
//! GET  /admin/customers        - Customer list
//! GET  /admin/orders           - Order list
//! GET  /admin/reports          - Sales report
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod home;
pub mod listings;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index))
        .route("/toggle", post(wishlist::toggle))
        .route("/count", get(wishlist::count))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(admin::customers))
        .route("/orders", get(admin::orders))
        .route("/reports", get(admin::reports))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Catalog
        .route("/products/{id}", get(products::show))
        .route("/category/{name}", get(listings::category))
        .route("/price/{min}/{max}", get(listings::price))
        .route("/gifts/{band}", get(listings::gifts))
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
}
