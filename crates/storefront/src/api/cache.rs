//! Cache types for catalog API responses.

use rust_decimal::Decimal;

use jewelbox_core::ProductId;

use super::types::Product;

/// Cache key for product reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Category(String),
    PriceBand { min: Decimal, max: Decimal },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}
