//! Domain models for storefront.
//!
//! The storefront keeps no database of its own; these are the types stored
//! in a visitor's session.

pub mod session;

pub use session::{CurrentCustomer, VisitorId, keys as session_keys};
