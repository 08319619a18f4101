//! Product route handlers.
//!
//! Also home to [`ProductCardView`], the grid card shared by every listing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use tracing::instrument;

use jewelbox_core::{CurrencyCode, Price, ProductId, ProductSummary};

use crate::api::{ApiError, Product};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, Visitor};
use crate::models::CurrentCustomer;
use crate::state::AppState;

/// Product card display data for grids.
#[derive(Clone, Debug)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    /// Formatted price, e.g. `₹12,499.00`.
    pub price: String,
    /// Raw decimal price, posted back by the wishlist form.
    pub price_value: String,
    pub compare_at_price: Option<String>,
    pub sold_out: bool,
    pub liked: bool,
}

impl ProductCardView {
    /// Card for a product fetched from the API.
    #[must_use]
    pub fn from_product(product: &Product, currency: CurrencyCode, liked: bool) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            image: product.primary_image().map(String::from),
            price: format_price(product.price, currency),
            price_value: product.price.normalize().to_string(),
            compare_at_price: product
                .compare_at_price
                .filter(|compare| *compare > product.price)
                .map(|compare| format_price(compare, currency)),
            sold_out: product.is_sold_out(),
            liked,
        }
    }

    /// Card for a wishlist entry.
    #[must_use]
    pub fn from_summary(summary: &ProductSummary, currency: CurrencyCode, liked: bool) -> Self {
        Self {
            id: summary.id.to_string(),
            name: summary.name.clone(),
            image: summary.image.clone(),
            price: format_price(summary.price, currency),
            price_value: summary.price.normalize().to_string(),
            compare_at_price: None,
            sold_out: false,
            liked,
        }
    }
}

/// Format an amount in the storefront currency.
pub fn format_price(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

/// Build cards for a listing, marking the visitor's liked pieces.
pub async fn cards_for(
    state: &AppState,
    visitor: &Visitor,
    products: &[Product],
) -> Vec<ProductCardView> {
    let currency = state.config().currency;
    let wishlist = state.wishlists().get(&visitor.0).await;
    products
        .iter()
        .map(|product| {
            ProductCardView::from_product(product, currency, wishlist.contains(&product.id))
        })
        .collect()
}

/// Stock level at or below which the detail page warns.
const LOW_STOCK: i64 = 3;

/// Product detail display data beyond the card fields.
#[derive(Clone, Debug)]
pub struct ProductDetailView {
    pub description: Option<String>,
    pub category: Option<String>,
    pub gallery: Vec<String>,
    /// Remaining stock, only when it is running low.
    pub low_stock: Option<i64>,
    pub rating: Option<String>,
}

impl ProductDetailView {
    fn new(product: &Product) -> Self {
        Self {
            description: product.description.clone().filter(|d| !d.trim().is_empty()),
            category: product.category.clone(),
            gallery: product.gallery(),
            low_stock: product.stock.filter(|n| (1..=LOW_STOCK).contains(n)),
            rating: product.rating.map(|r| format!("{r:.1}")),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub customer: Option<CurrentCustomer>,
    pub product: ProductCardView,
    pub detail: ProductDetailView,
}

/// Shown when the API has no such product.
#[derive(Template, WebTemplate)]
#[template(path = "error/not_found.html")]
pub struct NotFoundTemplate {
    pub customer: Option<CurrentCustomer>,
    pub message: String,
}

/// Display product detail page.
#[instrument(skip(state, customer, visitor))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    visitor: Visitor,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = ProductId::new(id);

    let product = match state.api().product(&id).await {
        Ok(product) => product,
        Err(ApiError::NotFound(_)) => {
            return Ok((
                StatusCode::NOT_FOUND,
                NotFoundTemplate {
                    customer,
                    message: "We couldn't find that piece.".to_string(),
                },
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let liked = state
        .wishlists()
        .is_wishlisted(&visitor.0, &product.id)
        .await;

    Ok(ProductShowTemplate {
        customer,
        product: ProductCardView::from_product(&product, state.config().currency, liked),
        detail: ProductDetailView::new(&product),
    }
    .into_response())
}
