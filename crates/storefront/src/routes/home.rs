//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::filters;
use crate::middleware::{OptionalAuth, Visitor};
use crate::models::CurrentCustomer;
use crate::routes::listings::{GiftBandView, gift_band_links, products_or_empty};
use crate::routes::products::{ProductCardView, cards_for};
use crate::state::AppState;

/// Number of featured pieces shown under the hero.
const FEATURED_LIMIT: usize = 8;

/// Category tiles linked from the home page.
const SHOP_BY_CATEGORY: [(&str, &str); 6] = [
    ("rings", "Rings"),
    ("necklaces", "Necklaces"),
    ("earrings", "Earrings"),
    ("bracelets", "Bracelets"),
    ("bangles", "Bangles"),
    ("pendants", "Pendants"),
];

/// Category tile data for templates.
#[derive(Clone, Debug)]
pub struct CategoryTileView {
    pub slug: &'static str,
    pub label: &'static str,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub customer: Option<CurrentCustomer>,
    /// Slug of the featured category, linked as "view all".
    pub featured_category: String,
    /// Featured pieces.
    pub products: Vec<ProductCardView>,
    pub categories: Vec<CategoryTileView>,
    pub gift_bands: Vec<GiftBandView>,
}

/// Display the home page.
#[instrument(skip(state, customer, visitor))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    visitor: Visitor,
) -> HomeTemplate {
    let category = state.config().featured_category.clone();
    let mut products = products_or_empty(
        state.api().products_by_category(&category).await,
        &category,
    );
    products.truncate(FEATURED_LIMIT);

    HomeTemplate {
        customer,
        products: cards_for(&state, &visitor, &products).await,
        featured_category: category,
        categories: SHOP_BY_CATEGORY
            .into_iter()
            .map(|(slug, label)| CategoryTileView { slug, label })
            .collect(),
        gift_bands: gift_band_links(),
    }
}
