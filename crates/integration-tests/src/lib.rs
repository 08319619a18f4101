//! Integration test harness for the Jewelbox storefront.
//!
//! Each test spawns a real storefront router on an ephemeral port, wired to
//! an in-process stub of the catalog REST API. Wishlists live in memory, so
//! tests never touch the filesystem or a shared server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p jewelbox-integration-tests
//! ```
//!
//! # Stub Catalog
//!
//! | Id | Name             | Category  | Price  |
//! |----|------------------|-----------|--------|
//! | r1 | Solitaire Ring   | rings     | 45000  |
//! | r2 | Stacking Band    | rings     | 3200   |
//! | n1 | Temple Necklace  | necklaces | 82000  |
//! | e1 | Pearl Drops      | earrings  | 9800   |
//!
//! Accounts: `priya@example.com` (customer), `admin@example.com` (admin) and
//! `lapsed@example.com` (logs in, but the cart rejects its token), all with
//! password `sparkle`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use jewelbox_core::CurrencyCode;
use jewelbox_storefront::config::{ApiConfig, StorefrontConfig};
use jewelbox_storefront::services::MemoryBackend;
use jewelbox_storefront::state::AppState;

/// Password accepted for both stub accounts.
pub const PASSWORD: &str = "sparkle";
/// Stub customer account.
pub const CUSTOMER_EMAIL: &str = "priya@example.com";
/// Stub admin account.
pub const ADMIN_EMAIL: &str = "admin@example.com";
/// Stub account whose token the cart endpoints treat as expired.
pub const EXPIRED_EMAIL: &str = "lapsed@example.com";

const CUSTOMER_TOKEN: &str = "customer-token";
const ADMIN_TOKEN: &str = "admin-token";
const EXPIRED_TOKEN: &str = "expired-token";

// =============================================================================
// Stub Catalog API
// =============================================================================

fn catalog() -> Vec<Value> {
    vec![
        json!({"_id": "r1", "name": "Solitaire Ring", "category": "rings", "price": 45000,
               "image": "https://cdn.example.com/r1.jpg", "countInStock": 2, "rating": 4.8}),
        json!({"_id": "r2", "name": "Stacking Band", "category": "rings", "price": 3200,
               "countInStock": 12}),
        json!({"_id": "n1", "name": "Temple Necklace", "category": "necklaces", "price": 82000,
               "originalPrice": 90000, "countInStock": 0}),
        json!({"_id": "e1", "name": "Pearl Drops", "category": "earrings", "price": 9800,
               "countInStock": 5}),
    ]
}

fn price_of(product: &Value) -> f64 {
    product["price"].as_f64().unwrap_or_default()
}

#[derive(Default)]
struct StubState {
    /// Units added to the (single, shared) stub cart.
    cart_units: AtomicU32,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn has_live_token(headers: &HeaderMap) -> bool {
    matches!(bearer(headers), Some(CUSTOMER_TOKEN | ADMIN_TOKEN))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Not authorized, token failed"})),
    )
        .into_response()
}

fn require_admin(headers: &HeaderMap) -> Option<Response> {
    match bearer(headers) {
        Some(ADMIN_TOKEN) => None,
        Some(CUSTOMER_TOKEN) => Some(
            (
                StatusCode::FORBIDDEN,
                Json(json!({"message": "Not authorized as an admin"})),
            )
                .into_response(),
        ),
        _ => Some(unauthorized()),
    }
}

// Rings come back as a bare array; every other category uses the wrapped form.
async fn by_category(Path(name): Path<String>) -> Json<Value> {
    let products: Vec<Value> = catalog()
        .into_iter()
        .filter(|p| p["category"] == name.as_str())
        .collect();
    if name == "rings" {
        Json(Value::Array(products))
    } else {
        Json(json!({"products": products}))
    }
}

async fn by_price(Path((min, max)): Path<(f64, f64)>) -> Json<Value> {
    let products: Vec<Value> = catalog()
        .into_iter()
        .filter(|p| (min..=max).contains(&price_of(p)))
        .collect();
    Json(Value::Array(products))
}

async fn product(Path(id): Path<String>) -> Response {
    catalog()
        .into_iter()
        .find(|p| p["_id"] == id.as_str())
        .map_or_else(
            || {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"message": "Product not found"})),
                )
                    .into_response()
            },
            |p| Json(p).into_response(),
        )
}

fn cart_body(units: u32) -> Value {
    if units == 0 {
        return json!({"cart": {"items": []}});
    }
    json!({"cart": {"items": [
        {"product": catalog().into_iter().next(), "quantity": units}
    ]}})
}

async fn add_to_cart(
    State(stub): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_live_token(&headers) {
        return unauthorized();
    }
    let quantity = body["quantity"]
        .as_u64()
        .and_then(|q| u32::try_from(q).ok())
        .unwrap_or(1);
    let units = stub.cart_units.fetch_add(quantity, Ordering::SeqCst) + quantity;
    Json(cart_body(units)).into_response()
}

async fn my_cart(State(stub): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    if !has_live_token(&headers) {
        return unauthorized();
    }
    Json(cart_body(stub.cart_units.load(Ordering::SeqCst))).into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    match (email, password) {
        (CUSTOMER_EMAIL, PASSWORD) => Json(json!({
            "token": CUSTOMER_TOKEN,
            "user": {"_id": "u1", "name": "Priya", "email": CUSTOMER_EMAIL, "role": "user"}
        }))
        .into_response(),
        (ADMIN_EMAIL, PASSWORD) => Json(json!({
            "token": ADMIN_TOKEN,
            "_id": "u0", "name": "Meera", "email": ADMIN_EMAIL, "role": "admin"
        }))
        .into_response(),
        (EXPIRED_EMAIL, PASSWORD) => Json(json!({
            "token": EXPIRED_TOKEN,
            "user": {"_id": "u2", "name": "Lata", "email": EXPIRED_EMAIL, "role": "user"}
        }))
        .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid email or password"})),
        )
            .into_response(),
    }
}

async fn admin_customers(headers: HeaderMap) -> Response {
    if let Some(rejection) = require_admin(&headers) {
        return rejection;
    }
    Json(json!([
        {"_id": "u1", "name": "Priya", "email": CUSTOMER_EMAIL, "phone": "+91 98765 43210",
         "createdAt": "2024-03-02T10:00:00Z", "orderCount": 3}
    ]))
    .into_response()
}

async fn admin_orders(headers: HeaderMap) -> Response {
    if let Some(rejection) = require_admin(&headers) {
        return rejection;
    }
    Json(json!({"orders": [
        {"_id": "o1", "user": {"name": "Priya"}, "orderItems": [{}], "totalPrice": 45000,
         "status": "delivered", "createdAt": "2024-04-01T09:00:00Z"},
        {"_id": "o2", "user": "u1", "orderItems": [{}, {}], "totalPrice": 13000,
         "status": "pending", "createdAt": "2024-05-11T09:00:00Z"}
    ]}))
    .into_response()
}

async fn admin_reports(headers: HeaderMap) -> Response {
    if let Some(rejection) = require_admin(&headers) {
        return rejection;
    }
    Json(json!({
        "totalRevenue": 58000,
        "totalOrders": 2,
        "totalUsers": 1,
        "totalProducts": 4,
        "topProducts": [{"name": "Solitaire Ring", "totalSold": 1}],
        "monthlySales": [{"_id": "2024-04", "total": 45000}, {"_id": "2024-05", "total": 13000}]
    }))
    .into_response()
}

fn stub_router() -> Router {
    Router::new()
        .route("/api/products/category/{name}", get(by_category))
        .route("/api/products/price/{min}/{max}", get(by_price))
        .route("/api/products/{id}", get(product))
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/me", get(my_cart))
        .route("/api/auth/login", post(login))
        .route("/api/admin/customers", get(admin_customers))
        .route("/api/admin/orders", get(admin_orders))
        .route("/api/admin/reports", get(admin_reports))
        .with_state(Arc::new(StubState::default()))
}

/// Serve the stub catalog API on an ephemeral port and return its base URL.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn spawn_stub_api() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub API listener");
    let addr = listener.local_addr().expect("stub API address");

    tokio::spawn(async move {
        axum::serve(listener, stub_router()).await.ok();
    });

    Url::parse(&format!("http://{addr}")).expect("stub API URL")
}

/// A base URL nothing listens on, for simulating an unreachable API.
///
/// # Panics
///
/// Panics if a probe listener cannot be bound.
pub async fn unreachable_api() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    Url::parse(&format!("http://{addr}")).expect("probe URL")
}

// =============================================================================
// Storefront
// =============================================================================

/// A running storefront plus a cookie-keeping client bound to it.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    /// Wishlist storage behind the running app.
    pub wishlists: Arc<MemoryBackend>,
}

impl TestApp {
    /// Storefront backed by a healthy stub catalog.
    pub async fn spawn() -> Self {
        Self::spawn_with_api(spawn_stub_api().await).await
    }

    /// Storefront pointed at the given catalog API base URL.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn spawn_with_api(api_url: Url) -> Self {
        let config = StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            currency: CurrencyCode::INR,
            api: ApiConfig {
                base_url: api_url,
                timeout: Duration::from_secs(5),
                cache_ttl: Duration::from_secs(60),
            },
            wishlist_dir: std::env::temp_dir().join("jewelbox-unused"),
            featured_category: "rings".to_string(),
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static").into(),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let wishlists = Arc::new(MemoryBackend::new());
        let state =
            AppState::with_backend(config, wishlists.clone()).expect("build app state");
        let app = jewelbox_storefront::app(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind storefront listener");
        let addr = listener.local_addr().expect("storefront address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: new_client(),
            wishlists,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A fresh client with its own cookie jar (a second browser).
    #[must_use]
    pub fn other_browser(&self) -> reqwest::Client {
        new_client()
    }

    /// Submit the login form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .form(&[("email", email), ("password", password), ("next", "/")])
            .send()
            .await
            .expect("submit login form")
    }

    /// GET a path and return status plus body.
    ///
    /// # Panics
    ///
    /// Panics if the request or body read fails.
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("send request");
        let status = StatusCode::from_u16(response.status().as_u16()).expect("valid status");
        (status, response.text().await.expect("read body"))
    }

    /// GET a path as HTMX would and return the body.
    ///
    /// # Panics
    ///
    /// Panics if the request or body read fails.
    pub async fn htmx_get(&self, path: &str) -> String {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .expect("send request")
            .text()
            .await
            .expect("read body")
    }
}

/// Client that keeps cookies and does not follow redirects.
fn new_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("build HTTP client")
}
