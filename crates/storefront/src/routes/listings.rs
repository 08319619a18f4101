//! Listing route handlers: category grids, price bands and gift bands.
//!
//! Every listing is a single API query rendered as a grid. When the API
//! fails the page still renders, showing the empty-state message.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::api::{ApiError, Product};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, Visitor};
use crate::models::CurrentCustomer;
use crate::routes::products::{ProductCardView, cards_for, format_price};
use crate::state::AppState;

// =============================================================================
// Gift Bands
// =============================================================================

/// Named price bands for the gift finder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftBand {
    Under5000,
    From5000To15000,
    From15000To50000,
    Luxury,
}

/// Upper bound used for the open-ended luxury band.
const LUXURY_CEILING: i64 = 10_000_000;

impl GiftBand {
    /// All bands, cheapest first.
    pub const ALL: [Self; 4] = [
        Self::Under5000,
        Self::From5000To15000,
        Self::From15000To50000,
        Self::Luxury,
    ];

    /// URL slug, as in `/gifts/{slug}`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Under5000 => "under-5000",
            Self::From5000To15000 => "5000-15000",
            Self::From15000To50000 => "15000-50000",
            Self::Luxury => "luxury",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Under5000 => "Gifts under 5,000",
            Self::From5000To15000 => "Gifts from 5,000 to 15,000",
            Self::From15000To50000 => "Gifts from 15,000 to 50,000",
            Self::Luxury => "Luxury gifts",
        }
    }

    /// Inclusive `(min, max)` price bounds.
    #[must_use]
    pub fn bounds(self) -> (Decimal, Decimal) {
        let (min, max) = match self {
            Self::Under5000 => (0, 5_000),
            Self::From5000To15000 => (5_000, 15_000),
            Self::From15000To50000 => (15_000, 50_000),
            Self::Luxury => (50_000, LUXURY_CEILING),
        };
        (Decimal::from(min), Decimal::from(max))
    }
}

impl FromStr for GiftBand {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|band| band.slug() == s)
            .ok_or_else(|| AppError::NotFound(format!("gift band {s}")))
    }
}

/// Gift band link data for templates.
#[derive(Clone, Debug)]
pub struct GiftBandView {
    pub slug: &'static str,
    pub label: &'static str,
}

impl From<GiftBand> for GiftBandView {
    fn from(band: GiftBand) -> Self {
        Self {
            slug: band.slug(),
            label: band.label(),
        }
    }
}

/// Links for every gift band.
#[must_use]
pub fn gift_band_links() -> Vec<GiftBandView> {
    GiftBand::ALL.into_iter().map(GiftBandView::from).collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "listings/index.html")]
pub struct ListingTemplate {
    pub customer: Option<CurrentCustomer>,
    pub title: String,
    pub subtitle: Option<String>,
    pub products: Vec<ProductCardView>,
    pub gift_bands: Vec<GiftBandView>,
}

/// Unwrap a listing fetch, logging failures and degrading to no products.
pub fn products_or_empty(result: Result<Vec<Product>, ApiError>, listing: &str) -> Vec<Product> {
    result.unwrap_or_else(|e| {
        tracing::warn!(listing, error = %e, "Listing fetch failed, rendering empty state");
        Vec::new()
    })
}

/// Title-case a category slug: `nose-pins` becomes `Nose Pins`.
fn category_title(name: &str) -> String {
    name.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_bound(raw: &str) -> Result<Decimal, AppError> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("invalid price {raw}")))?;
    if value.is_sign_negative() {
        return Err(AppError::BadRequest(format!("negative price {raw}")));
    }
    Ok(value)
}

/// Parse `/price/{min}/{max}` bounds; `min` must not exceed `max`.
fn parse_band(min: &str, max: &str) -> Result<(Decimal, Decimal), AppError> {
    let (min, max) = (parse_bound(min)?, parse_bound(max)?);
    if min > max {
        return Err(AppError::BadRequest(format!(
            "minimum {min} is above maximum {max}"
        )));
    }
    Ok((min, max))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display a category listing.
#[instrument(skip(state, customer, visitor))]
pub async fn category(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    visitor: Visitor,
    Path(name): Path<String>,
) -> ListingTemplate {
    let products = products_or_empty(state.api().products_by_category(&name).await, &name);

    ListingTemplate {
        customer,
        title: category_title(&name),
        subtitle: None,
        products: cards_for(&state, &visitor, &products).await,
        gift_bands: gift_band_links(),
    }
}

/// Display a price-band listing.
#[instrument(skip(state, customer, visitor))]
pub async fn price(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    visitor: Visitor,
    Path((min, max)): Path<(String, String)>,
) -> Result<ListingTemplate, AppError> {
    let (min, max) = parse_band(&min, &max)?;
    let products = products_or_empty(
        state.api().products_by_price(min, max).await,
        "price band",
    );

    let currency = state.config().currency;
    Ok(ListingTemplate {
        customer,
        title: format!(
            "{} to {}",
            format_price(min, currency),
            format_price(max, currency)
        ),
        subtitle: None,
        products: cards_for(&state, &visitor, &products).await,
        gift_bands: gift_band_links(),
    })
}

/// Display a named gift band.
#[instrument(skip(state, customer, visitor))]
pub async fn gifts(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    visitor: Visitor,
    Path(band): Path<String>,
) -> Result<ListingTemplate, AppError> {
    let band: GiftBand = band.parse()?;
    let (min, max) = band.bounds();
    let products = products_or_empty(
        state.api().products_by_price(min, max).await,
        band.slug(),
    );

    Ok(ListingTemplate {
        customer,
        title: band.label().to_string(),
        subtitle: Some("Thoughtful pieces, wrapped and ready.".to_string()),
        products: cards_for(&state, &visitor, &products).await,
        gift_bands: gift_band_links(),
    })
}
