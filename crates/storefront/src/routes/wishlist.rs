//! Wishlist route handlers.
//!
//! Hearts on product cards post to `/wishlist/toggle`, which swaps the
//! button and triggers `wishlist-updated` so the header badge refreshes.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use jewelbox_core::ProductSummary;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, Visitor};
use crate::models::CurrentCustomer;
use crate::routes::products::ProductCardView;
use crate::state::AppState;

/// Toggle form data; carries the card's own fields so nothing is refetched.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
}

impl ToggleForm {
    fn into_summary(self) -> Result<ProductSummary, AppError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(AppError::BadRequest("missing product id".to_string()));
        }

        let price = match self.price.as_deref().map(str::trim) {
            None | Some("") => Decimal::ZERO,
            Some(raw) => Decimal::from_str(raw)
                .map_err(|_| AppError::BadRequest(format!("invalid price {raw}")))?,
        };
        let image = self.image.filter(|url| !url.trim().is_empty());

        Ok(ProductSummary::new(id, self.name.trim(), image, price))
    }
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/index.html")]
pub struct WishlistTemplate {
    pub customer: Option<CurrentCustomer>,
    pub products: Vec<ProductCardView>,
}

/// Heart button fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product: ProductCardView,
}

/// Wishlist count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_count.html")]
pub struct WishlistCountTemplate {
    pub count: usize,
}

/// Display the visitor's wishlist.
#[instrument(skip(state, customer, visitor))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    visitor: Visitor,
) -> WishlistTemplate {
    let currency = state.config().currency;
    let products = state
        .wishlists()
        .get(&visitor.0)
        .await
        .iter()
        .map(|summary| ProductCardView::from_summary(summary, currency, true))
        .collect();

    WishlistTemplate { customer, products }
}

/// Toggle a product in the visitor's wishlist (HTMX).
///
/// Returns the heart button in its new state.
#[instrument(skip(state, visitor, form), fields(product_id = %form.id))]
pub async fn toggle(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<ToggleForm>,
) -> Result<Response, AppError> {
    let summary = form.into_summary()?;
    let outcome = state.wishlists().toggle(&visitor.0, summary.clone()).await;

    tracing::debug!(liked = outcome.toggled.is_liked(), count = outcome.count, "Wishlist toggled");

    let product =
        ProductCardView::from_summary(&summary, state.config().currency, outcome.toggled.is_liked());

    Ok((
        AppendHeaders([("HX-Trigger", "wishlist-updated")]),
        WishlistButtonTemplate { product },
    )
        .into_response())
}

/// Wishlist count badge (HTMX).
#[instrument(skip(state, visitor))]
pub async fn count(State(state): State<AppState>, visitor: Visitor) -> WishlistCountTemplate {
    WishlistCountTemplate {
        count: state.wishlists().count(&visitor.0).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(id: &str, price: Option<&str>, image: Option<&str>) -> ToggleForm {
        ToggleForm {
            id: id.to_string(),
            name: " Pearl Drops ".to_string(),
            image: image.map(String::from),
            price: price.map(String::from),
        }
    }

    #[test]
    fn test_toggle_form_into_summary() {
        let summary = form("p1", Some("3499.00"), Some("/img/pearl.jpg"))
            .into_summary()
            .unwrap();
        assert_eq!(summary.id.as_str(), "p1");
        assert_eq!(summary.name, "Pearl Drops");
        assert_eq!(summary.price, Decimal::from(3499));
        assert_eq!(summary.image.as_deref(), Some("/img/pearl.jpg"));
    }

    #[test]
    fn test_toggle_form_defaults() {
        let summary = form("p1", Some(""), Some("  ")).into_summary().unwrap();
        assert_eq!(summary.price, Decimal::ZERO);
        assert!(summary.image.is_none());
    }

    #[test]
    fn test_toggle_form_rejects_bad_input() {
        assert!(matches!(
            form("  ", None, None).into_summary(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            form("p1", Some("lots"), None).into_summary(),
            Err(AppError::BadRequest(_))
        ));
    }
}
