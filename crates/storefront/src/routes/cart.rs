//! Cart route handlers.
//!
//! The cart lives in the catalog API and needs the customer's bearer token.
//! The session keeps the last known item count so the header badge can be
//! rendered without an API round trip.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use jewelbox_core::{CurrencyCode, ProductId};

use crate::api::{ApiError, Cart, CartItem, CartProduct};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_customer};
use crate::models::{CurrentCustomer, session_keys};
use crate::routes::products::format_price;
use crate::state::AppState;

/// Largest quantity accepted from the add-to-cart form.
const MAX_QUANTITY: u32 = 10;

/// Cart line display data for templates.
#[derive(Clone, Debug)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: Option<String>,
    pub line_total: Option<String>,
}

/// Cart display data for templates.
#[derive(Clone, Debug)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    fn new(cart: &Cart, currency: CurrencyCode) -> Self {
        Self {
            items: cart
                .items
                .iter()
                .map(|item| CartItemView::new(item, currency))
                .collect(),
            subtotal: format_price(cart.subtotal(), currency),
            item_count: cart.item_count(),
        }
    }
}

impl CartItemView {
    fn new(item: &CartItem, currency: CurrencyCode) -> Self {
        match &item.product {
            CartProduct::Populated(product) => Self {
                product_id: product.id.to_string(),
                name: product.name.clone(),
                image: product.primary_image().map(String::from),
                quantity: item.quantity,
                price: Some(format_price(product.price, currency)),
                line_total: item.line_total().map(|total| format_price(total, currency)),
            },
            CartProduct::Reference(id) => Self {
                product_id: id.to_string(),
                name: format!("Item {id}"),
                image: None,
                quantity: item.quantity,
                price: None,
                line_total: None,
            },
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the remembered cart count from the session.
async fn get_cart_count(session: &Session) -> u32 {
    session
        .get::<u32>(session_keys::CART_COUNT)
        .await
        .ok()
        .flatten()
        .unwrap_or(0)
}

/// Remember the cart count in the session.
async fn set_cart_count(session: &Session, count: u32) {
    if let Err(e) = session.insert(session_keys::CART_COUNT, count).await {
        tracing::error!("Failed to save cart count to session: {e}");
    }
}

/// Forget a customer whose token the API no longer accepts.
async fn expire_login(session: &Session) {
    tracing::info!("Catalog API rejected the session token, logging out");
    if let Err(e) = clear_current_customer(session).await {
        tracing::error!("Failed to clear expired customer from session: {e}");
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub customer: Option<CurrentCustomer>,
    pub cart: CartView,
    /// Set when the API could not be reached.
    pub unavailable: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline add-to-cart failure message (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_error.html")]
pub struct CartErrorTemplate {
    pub message: &'static str,
    pub login_link: bool,
}

/// Respond with an inline error, retargeted at the feedback slot.
fn cart_error(status: StatusCode, message: &'static str, login_link: bool) -> Response {
    (
        status,
        AppendHeaders([("HX-Retarget", "#cart-feedback"), ("HX-Reswap", "innerHTML")]),
        CartErrorTemplate {
            message,
            login_link,
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
///
/// An expired token logs the customer out and sends them to the login page.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> Response {
    let currency = state.config().currency;

    let (cart, unavailable) = match state.api().my_cart(&customer.token()).await {
        Ok(cart) => {
            set_cart_count(&session, cart.item_count()).await;
            (CartView::new(&cart, currency), false)
        }
        Err(ApiError::Unauthorized(_)) => {
            expire_login(&session).await;
            return Redirect::to("/auth/login").into_response();
        }
        Err(e) => {
            tracing::warn!("Failed to fetch cart: {e}");
            (CartView::new(&Cart::default(), currency), true)
        }
    };

    CartShowTemplate {
        customer: Some(customer),
        cart,
        unavailable,
    }
    .into_response()
}

/// Add item to cart (HTMX).
///
/// Returns the refreshed count badge and triggers `cart-updated`. Failures
/// are rendered inline next to the button.
#[instrument(skip(state, session, customer))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let Some(customer) = customer else {
        return cart_error(
            StatusCode::UNAUTHORIZED,
            "Please log in to add pieces to your cart.",
            true,
        );
    };

    let product_id = form.product_id.trim();
    if product_id.is_empty() {
        return cart_error(StatusCode::BAD_REQUEST, "Choose a piece first.", false);
    }
    let quantity = form.quantity.unwrap_or(1).clamp(1, MAX_QUANTITY);
    let product_id = ProductId::from(product_id);

    match state
        .api()
        .add_to_cart(&customer.token(), &product_id, quantity)
        .await
    {
        Ok(cart) => {
            let count = cart.item_count();
            set_cart_count(&session, count).await;
            add_breadcrumb("cart", "Added to cart", &[("product_id", product_id.as_str())]);

            (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartCountTemplate { count },
            )
                .into_response()
        }
        Err(ApiError::Unauthorized(_)) => {
            expire_login(&session).await;
            cart_error(
                StatusCode::UNAUTHORIZED,
                "Your session has expired. Please log in again.",
                true,
            )
        }
        Err(e) => {
            tracing::error!("Failed to add item to cart: {e}");
            cart_error(
                StatusCode::BAD_GATEWAY,
                "Couldn't add this piece to your cart. Please try again.",
                false,
            )
        }
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> CartCountTemplate {
    CartCountTemplate {
        count: get_cart_count(&session).await,
    }
}
