//! The wishlist: a set of liked products keyed by product id.
//!
//! A [`Wishlist`] holds at most one entry per [`ProductId`]. The only
//! mutation pages need is [`Wishlist::toggle`]; membership checks are O(1)
//! through a hash index kept alongside the ordered entries.
//!
//! The serialized form is a JSON array of [`ProductSummary`] values in the
//! order they were liked. Loading a document that repeats an id keeps a
//! single entry, at the first position, holding the last occurrence's data.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{ProductId, ProductSummary};

/// Outcome of a [`Wishlist::toggle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggled {
    /// The product was not liked and now is.
    Added,
    /// The product was liked and no longer is.
    Removed,
}

impl Toggled {
    /// Whether the product is liked after the toggle.
    #[must_use]
    pub const fn is_liked(self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Products a visitor has marked as liked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ProductSummary>", into = "Vec<ProductSummary>")]
pub struct Wishlist {
    entries: Vec<ProductSummary>,
    index: HashSet<ProductId>,
}

impl Wishlist {
    /// Create an empty wishlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `product` if it is liked, otherwise add it.
    pub fn toggle(&mut self, product: ProductSummary) -> Toggled {
        if self.remove(&product.id) {
            Toggled::Removed
        } else {
            self.index.insert(product.id.clone());
            self.entries.push(product);
            Toggled::Added
        }
    }

    /// Add `product` unless its id is already present.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn insert(&mut self, product: ProductSummary) -> bool {
        if self.index.contains(&product.id) {
            return false;
        }
        self.index.insert(product.id.clone());
        self.entries.push(product);
        true
    }

    /// Remove the entry for `id`. Returns `true` if one was present.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        if !self.index.remove(id) {
            return false;
        }
        self.entries.retain(|entry| &entry.id != id);
        true
    }

    /// Whether `id` is liked.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.index.contains(id)
    }

    /// The stored entry for `id`, if liked.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&ProductSummary> {
        if !self.index.contains(id) {
            return None;
        }
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// Number of liked products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is liked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order they were liked.
    pub fn iter(&self) -> impl Iterator<Item = &ProductSummary> {
        self.entries.iter()
    }

    /// Liked product ids.
    #[must_use]
    pub const fn ids(&self) -> &HashSet<ProductId> {
        &self.index
    }

    /// Serialize to the persisted JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Load from a persisted JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a JSON array of summaries.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Vec<ProductSummary>> for Wishlist {
    fn from(items: Vec<ProductSummary>) -> Self {
        let mut wishlist = Self::new();
        for item in items {
            if wishlist.contains(&item.id) {
                if let Some(existing) = wishlist.entries.iter_mut().find(|e| e.id == item.id) {
                    *existing = item;
                }
            } else {
                wishlist.insert(item);
            }
        }
        wishlist
    }
}

impl From<Wishlist> for Vec<ProductSummary> {
    fn from(wishlist: Wishlist) -> Self {
        wishlist.entries
    }
}

/// Set equality: the same products with the same stored data, in any order.
impl PartialEq for Wishlist {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self
                .entries
                .iter()
                .all(|entry| other.get(&entry.id) == Some(entry))
    }
}

impl Eq for Wishlist {}

impl<'a> IntoIterator for &'a Wishlist {
    type Item = &'a ProductSummary;
    type IntoIter = std::slice::Iter<'a, ProductSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
