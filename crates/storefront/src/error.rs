//! Request errors and Sentry helpers.
//!
//! Handlers that cannot fall back to an empty state return
//! `Result<T, AppError>`. Server-side failures are reported to Sentry before
//! the response is written; clients only ever see a short, fixed message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ApiError;

/// Errors a storefront handler can answer with.
#[derive(Debug, Error)]
pub enum AppError {
    /// The catalog API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// No such page or listing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed path or form input.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status this error responds with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Api(ApiError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Api(ApiError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            Self::Api(ApiError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show the visitor. Upstream details never leak.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Api(ApiError::NotFound(_)) => "Not found".to_string(),
            Self::Api(ApiError::Unauthorized(_)) => "Please log in again".to_string(),
            Self::Api(ApiError::RateLimited(_)) => {
                "Too many requests, try again shortly".to_string()
            }
            Self::Api(_) => "The catalog is unavailable right now".to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        (status, self.public_message()).into_response()
    }
}

/// Attach the logged-in customer to subsequent Sentry reports.
pub fn set_sentry_user(customer_id: Option<&str>, email: &str) {
    let user = sentry::User {
        id: customer_id.map(String::from),
        email: Some(email.to_string()),
        ..Default::default()
    };
    sentry::configure_scope(|scope| scope.set_user(Some(user)));
}

/// Detach the customer from Sentry reports (logout).
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a visitor action as a Sentry breadcrumb.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let data = data
        .iter()
        .map(|(key, value)| ((*key).to_string(), serde_json::Value::from(*value)))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_errors_keep_their_message() {
        let err = AppError::BadRequest("minimum 9 is above maximum 1".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Bad request: minimum 9 is above maximum 1");

        let err = AppError::NotFound("gift band cheap".to_string());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_api_errors_map_to_gateway_statuses() {
        let cases = [
            (ApiError::NotFound("gone".to_string()), StatusCode::NOT_FOUND),
            (ApiError::Unauthorized("expired".to_string()), StatusCode::UNAUTHORIZED),
            (ApiError::RateLimited(2), StatusCode::TOO_MANY_REQUESTS),
            (
                ApiError::Status {
                    status: 500,
                    message: "boom".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (api, status) in cases {
            assert_eq!(AppError::from(api).status(), status);
        }
    }

    #[test]
    fn test_upstream_details_are_hidden() {
        let err = AppError::from(ApiError::Status {
            status: 500,
            message: "mongo connection refused at 10.0.0.3".to_string(),
        });
        assert!(!err.public_message().contains("mongo"));
    }
}
