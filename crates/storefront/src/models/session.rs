//! Session-related types.
//!
//! Types stored in the session for visitor identity and authentication state.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use jewelbox_core::CustomerId;

use crate::api::LoginResponse;

/// Anonymous identifier for a browser, created on first visit.
///
/// Wishlists are keyed by this rather than by account so that a visitor can
/// like pieces before logging in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorId(Uuid);

impl VisitorId {
    /// Generate a fresh random visitor id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

/// Session-stored customer identity.
///
/// Holds the API bearer token; `Debug` redacts it.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Customer id, when the API returned one.
    pub id: Option<CustomerId>,
    /// Display name (falls back to the email's local part).
    pub name: String,
    /// Email the customer logged in with.
    pub email: String,
    /// Whether the admin panels are available.
    pub is_admin: bool,
    token: String,
}

impl CurrentCustomer {
    /// Build the session identity from a login response.
    #[must_use]
    pub fn from_login(login: &LoginResponse, login_email: &str) -> Self {
        let account = login.account();
        let email = account
            .email
            .clone()
            .unwrap_or_else(|| login_email.to_string());
        let name = account
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Self {
            id: account.id.clone(),
            name,
            email,
            is_admin: account.is_admin(),
            token: login.token.clone(),
        }
    }

    /// The API bearer token.
    #[must_use]
    pub fn token(&self) -> SecretString {
        SecretString::from(self.token.clone())
    }
}

impl fmt::Debug for CurrentCustomer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentCustomer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("is_admin", &self.is_admin)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys.
pub mod keys {
    /// Key for the anonymous visitor id.
    pub const VISITOR_ID: &str = "visitor_id";

    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the optimistic cart item count.
    pub const CART_COUNT: &str = "cart_count";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_from_login_nested_account() {
        let login: LoginResponse = serde_json::from_str(
            r#"{"token": "abc", "user": {"_id": "u1", "name": "Priya", "email": "priya@example.com", "role": "admin"}}"#,
        )
        .unwrap();
        let customer = CurrentCustomer::from_login(&login, "typed@example.com");

        assert_eq!(customer.name, "Priya");
        assert_eq!(customer.email, "priya@example.com");
        assert!(customer.is_admin);
        assert_eq!(customer.token().expose_secret(), "abc");
    }

    #[test]
    fn test_from_login_falls_back_to_typed_email() {
        let login: LoginResponse = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        let customer = CurrentCustomer::from_login(&login, "kavya@example.com");

        assert_eq!(customer.email, "kavya@example.com");
        assert_eq!(customer.name, "kavya");
        assert!(!customer.is_admin);
    }

    #[test]
    fn test_debug_redacts_token() {
        let login: LoginResponse = serde_json::from_str(r#"{"token": "very-secret"}"#).unwrap();
        let customer = CurrentCustomer::from_login(&login, "a@example.com");
        assert!(!format!("{customer:?}").contains("very-secret"));
    }

    #[test]
    fn test_visitor_id_display_is_uuid() {
        let id = VisitorId::generate();
        assert_eq!(id.to_string().len(), 36);
    }
}
