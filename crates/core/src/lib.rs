//! Jewelbox Core - Shared domain types.
//!
//! This crate provides the types shared by the Jewelbox components:
//! - `storefront` - Server-rendered jewelry storefront
//! - `integration-tests` - End-to-end tests against a stub catalog API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! Persistence of a [`Wishlist`] is the storefront's concern; this crate only
//! defines the set semantics and its serialized form.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, statuses and product summaries
//! - [`wishlist`] - The liked-products set keyed by product id

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod wishlist;

pub use types::*;
pub use wishlist::{Toggled, Wishlist};
