//! Product summary carried by listing cards and wishlist entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// The slice of a product needed to draw a card: id, name, image, price.
///
/// Wishlist entries are stored as these summaries exactly as the page saw
/// them; nothing is re-fetched or validated against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Decimal,
}

impl ProductSummary {
    /// Create a summary.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        image: Option<String>,
        price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image,
            price,
        }
    }
}
