//! Business logic services for storefront.
//!
//! # Services
//!
//! - `wishlist` - Per-visitor liked products, mirrored in memory and persisted per change

pub mod wishlist;

pub use wishlist::{FileBackend, MemoryBackend, StorageError, WishlistBackend, WishlistStore};
