//! Wire types for the catalog REST API.
//!
//! The API is loosely shaped: documents carry `_id` or `id`, field names are
//! camelCase, and list endpoints return either a bare array or an object
//! wrapping the array. These types absorb those variations so route handlers
//! deal with one shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use jewelbox_core::{CustomerId, OrderId, OrderStatus, ProductId, ProductSummary, Role};

// =============================================================================
// Listings
// =============================================================================

/// A list response: bare `[...]` or `{"products": [...]}`-style wrapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Bare(Vec<T>),
    Wrapped(Wrapped<T>),
}

/// Object form of a [`Listing`].
#[derive(Debug, Clone, Deserialize)]
pub struct Wrapped<T> {
    #[serde(
        alias = "products",
        alias = "customers",
        alias = "orders",
        alias = "data"
    )]
    pub items: Vec<T>,
}

impl<T> Listing<T> {
    /// The contained items, whichever form the API used.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Wrapped(wrapped) => wrapped.items,
        }
    }
}

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Decimal,
    /// Pre-discount price, when the piece is on offer.
    #[serde(default, alias = "originalPrice", alias = "mrp")]
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, alias = "countInStock")]
    pub stock: Option<i64>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl Product {
    /// Main image: `image`, else the first of `images`.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image
            .as_deref()
            .or_else(|| self.images.first().map(String::as_str))
    }

    /// All distinct images, primary first.
    #[must_use]
    pub fn gallery(&self) -> Vec<String> {
        let mut gallery: Vec<String> = Vec::with_capacity(self.images.len() + 1);
        for url in self.image.iter().chain(self.images.iter()) {
            if !gallery.contains(url) {
                gallery.push(url.clone());
            }
        }
        gallery
    }

    /// Whether the API reports zero stock. Unknown stock counts as available.
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.stock.is_some_and(|n| n <= 0)
    }

    /// The card-sized summary stored in wishlists.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary::new(
            self.id.clone(),
            self.name.clone(),
            self.primary_image().map(String::from),
            self.price,
        )
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The visitor's cart as returned by `GET /api/cart/me` and `POST /api/cart/add`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default, alias = "cartItems")]
    pub items: Vec<CartItem>,
    #[serde(default, alias = "totalPrice")]
    pub total: Option<Decimal>,
}

impl Cart {
    /// Total number of pieces across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// API-reported total, or the sum of known line prices.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.total.unwrap_or_else(|| {
            self.items
                .iter()
                .filter_map(CartItem::line_total)
                .sum()
        })
    }
}

/// Response of `POST /api/cart/add`: the cart itself or `{"cart": {...}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CartEnvelope {
    Wrapped { cart: Cart },
    Bare(Cart),
}

impl CartEnvelope {
    #[must_use]
    pub fn into_cart(self) -> Cart {
        match self {
            Self::Wrapped { cart } | Self::Bare(cart) => cart,
        }
    }
}

/// One cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    #[serde(alias = "productId")]
    pub product: CartProduct,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// Price times quantity, when the product was populated.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        match &self.product {
            CartProduct::Populated(product) => Some(product.price * Decimal::from(self.quantity)),
            CartProduct::Reference(_) => None,
        }
    }
}

/// A cart line's product: populated document or bare id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CartProduct {
    Populated(Box<Product>),
    Reference(ProductId),
}

/// Body of `POST /api/cart/add`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

// =============================================================================
// Auth
// =============================================================================

/// Body of `POST /api/auth/login`.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /api/auth/login`.
///
/// Account fields arrive either nested under `user` or flat beside `token`.
#[derive(Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<Account>,
    #[serde(flatten)]
    pub flat: Account,
}

impl LoginResponse {
    /// The account details, preferring the nested form.
    #[must_use]
    pub fn account(&self) -> &Account {
        self.user.as_ref().unwrap_or(&self.flat)
    }
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .field("flat", &self.flat)
            .finish()
    }
}

/// Account details attached to a login.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default, alias = "_id")]
    pub id: Option<CustomerId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_admin: bool,
}

impl Account {
    /// Whether the account may open the admin panels.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin || self.role == Some(Role::Admin)
    }
}

// =============================================================================
// Admin
// =============================================================================

/// A customer row in the admin panel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(alias = "_id")]
    pub id: CustomerId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_count: Option<u32>,
}

/// An order row in the admin panel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    #[serde(default, alias = "user")]
    pub customer: Option<OrderCustomer>,
    #[serde(default, alias = "orderItems")]
    pub items: Vec<serde_json::Value>,
    #[serde(default, alias = "totalPrice", alias = "totalAmount")]
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// An order's customer: populated document or bare id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrderCustomer {
    Populated {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
    Reference(CustomerId),
}

impl OrderCustomer {
    /// Best available label: name, email, then id.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Populated { name, email } => name
                .clone()
                .or_else(|| email.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            Self::Reference(id) => id.to_string(),
        }
    }
}

/// Store-wide summary from `GET /api/admin/reports`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    #[serde(alias = "totalRevenue")]
    pub total_sales: Decimal,
    pub total_orders: u64,
    #[serde(alias = "totalUsers")]
    pub total_customers: u64,
    pub total_products: u64,
    pub top_products: Vec<TopProduct>,
    #[serde(alias = "monthlySales")]
    pub monthly: Vec<MonthlySales>,
}

/// A best-seller line in a [`Report`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopProduct {
    pub name: String,
    #[serde(alias = "quantity", alias = "totalSold")]
    pub sold: u64,
}

/// Revenue for one month in a [`Report`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthlySales {
    #[serde(alias = "_id")]
    pub month: String,
    #[serde(alias = "total", alias = "sales")]
    pub revenue: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_accepts_mongo_style_id() {
        let json = r#"{
            "_id": "64a1",
            "name": "Kundan Choker",
            "price": 45999,
            "originalPrice": 52000,
            "images": ["a.jpg", "b.jpg"],
            "countInStock": 0
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.id.as_str(), "64a1");
        assert_eq!(product.price, Decimal::from(45_999));
        assert_eq!(product.compare_at_price, Some(Decimal::from(52_000)));
        assert_eq!(product.primary_image(), Some("a.jpg"));
        assert!(product.is_sold_out());
    }

    #[test]
    fn test_product_gallery_dedups_primary() {
        let json = r#"{"id": "p1", "name": "Jhumka", "image": "a.jpg", "images": ["a.jpg", "b.jpg"]}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.gallery(), vec!["a.jpg".to_string(), "b.jpg".to_string()]);
        assert!(!product.is_sold_out());
    }

    #[test]
    fn test_product_summary() {
        let json = r#"{"id": "p1", "name": "Solitaire", "image": "s.jpg", "price": "75000.50"}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        let summary = product.summary();
        assert_eq!(summary.id.as_str(), "p1");
        assert_eq!(summary.image.as_deref(), Some("s.jpg"));
        assert_eq!(summary.price, Decimal::new(7_500_050, 2));
    }

    #[test]
    fn test_listing_bare_and_wrapped() {
        let bare: Listing<Product> =
            serde_json::from_str(r#"[{"id": "a", "name": "A"}]"#).unwrap();
        assert_eq!(bare.into_items().len(), 1);

        let wrapped: Listing<Product> =
            serde_json::from_str(r#"{"products": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}]}"#)
                .unwrap();
        assert_eq!(wrapped.into_items().len(), 2);
    }

    #[test]
    fn test_cart_counts_and_totals() {
        let json = r#"{
            "cartItems": [
                {"product": {"_id": "a", "name": "Ring", "price": 1000}, "quantity": 2},
                {"productId": "b", "quantity": 3}
            ]
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.subtotal(), Decimal::from(2000));
    }

    #[test]
    fn test_cart_envelope_forms() {
        let wrapped: CartEnvelope =
            serde_json::from_str(r#"{"message": "added", "cart": {"items": [{"product": "a"}]}}"#)
                .unwrap();
        assert_eq!(wrapped.into_cart().item_count(), 1);

        let bare: CartEnvelope =
            serde_json::from_str(r#"{"items": [{"product": "a", "quantity": 4}], "totalPrice": 10}"#)
                .unwrap();
        let cart = bare.into_cart();
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.subtotal(), Decimal::from(10));
    }

    #[test]
    fn test_login_response_nested_user() {
        let json = r#"{"token": "t0k", "user": {"_id": "u1", "name": "Asha", "role": "admin"}}"#;
        let login: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(login.token, "t0k");
        assert!(login.account().is_admin());
        assert_eq!(login.account().name.as_deref(), Some("Asha"));
    }

    #[test]
    fn test_login_response_flat_fields() {
        let json = r#"{"token": "t0k", "_id": "u2", "email": "ravi@example.com", "isAdmin": false}"#;
        let login: LoginResponse = serde_json::from_str(json).unwrap();
        assert!(!login.account().is_admin());
        assert_eq!(login.account().email.as_deref(), Some("ravi@example.com"));
        assert!(!format!("{login:?}").contains("t0k"));
    }

    #[test]
    fn test_order_customer_label() {
        let json = r#"{"_id": "o1", "user": {"name": "Meera"}, "totalPrice": 999, "status": "shipped"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.customer.unwrap().label(), "Meera");
        assert_eq!(order.status, OrderStatus::Shipped);

        let json = r#"{"_id": "o2", "user": "u9"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.customer.unwrap().label(), "u9");
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_report_defaults_missing_fields() {
        let json = r#"{"totalRevenue": "125000.00", "totalOrders": 42, "topProducts": [{"name": "Bangle", "totalSold": 7}]}"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.total_sales, Decimal::new(12_500_000, 2));
        assert_eq!(report.total_orders, 42);
        assert_eq!(report.total_customers, 0);
        assert_eq!(report.top_products.first().unwrap().sold, 7);
    }
}
