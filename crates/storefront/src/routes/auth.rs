//! Authentication route handlers.
//!
//! Credentials are checked by the catalog API; on success its token and the
//! account details are stored in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use jewelbox_core::Email;

use crate::api::ApiError;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    /// Local path to return to after login.
    #[serde(default)]
    pub next: Option<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("next", &self.next)
            .finish()
    }
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub customer: Option<CurrentCustomer>,
    pub error: Option<&'static str>,
    pub next: String,
}

/// Human message for a login error code.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "That email and password don't match our records.",
        "email" => "Please enter a valid email address.",
        "password" => "Please enter your password.",
        "session" => "We couldn't start your session. Please try again.",
        "unavailable" => "Login is unavailable right now. Please try again shortly.",
        _ => "Something went wrong. Please try again.",
    }
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

fn login_redirect(code: &str, next: &str) -> Response {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("error", code)
        .append_pair("next", next)
        .finish();
    Redirect::to(&format!("/auth/login?{query}")).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> LoginTemplate {
    LoginTemplate {
        customer,
        error: query.error.as_deref().map(error_message),
        next: safe_next(query.next.as_deref()),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref());

    let Ok(email) = Email::parse(&form.email) else {
        return login_redirect("email", &next);
    };
    if form.password.is_empty() {
        return login_redirect("password", &next);
    }
    let password = SecretString::from(form.password);

    let login = match state.api().login(&email, &password).await {
        Ok(login) => login,
        Err(ApiError::Unauthorized(_) | ApiError::NotFound(_)) => {
            tracing::info!("Login rejected");
            return login_redirect("credentials", &next);
        }
        Err(ApiError::Status { status, .. }) if (400..500).contains(&status) => {
            tracing::info!(status, "Login rejected");
            return login_redirect("credentials", &next);
        }
        Err(e) => {
            tracing::error!("Login failed: {e}");
            return login_redirect("unavailable", &next);
        }
    };

    let customer = CurrentCustomer::from_login(&login, email.as_str());

    if let Err(e) = set_current_customer(&session, &customer).await {
        tracing::error!("Failed to set session: {e}");
        return login_redirect("session", &next);
    }

    set_sentry_user(customer.id.as_ref().map(|id| id.as_str()), &customer.email);
    tracing::info!(admin = customer.is_admin, "Customer logged in");

    let destination = if customer.is_admin && next == "/" {
        "/admin/reports".to_string()
    } else {
        next
    };
    Redirect::to(&destination).into_response()
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_customer(&session).await {
        tracing::error!("Failed to clear session: {e}");
    }
    clear_sentry_user();
    Redirect::to("/").into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/cart")), "/cart");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_login_redirect_encodes_next() {
        let response = login_redirect("credentials", "/price/0/5000");
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert_eq!(
            location,
            "/auth/login?error=credentials&next=%2Fprice%2F0%2F5000"
        );
    }

    #[test]
    fn test_error_messages() {
        assert!(error_message("credentials").contains("don't match"));
        assert!(error_message("anything-else").contains("went wrong"));
    }
}
