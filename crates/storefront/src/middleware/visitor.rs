//! Anonymous visitor identity.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use tower_sessions::Session;

use crate::models::{VisitorId, session_keys};

/// The browser's visitor id, created and stored in the session on first use.
pub struct Visitor(pub VisitorId);

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        if let Ok(Some(id)) = session.get::<VisitorId>(session_keys::VISITOR_ID).await {
            return Ok(Self(id));
        }

        let id = VisitorId::generate();
        if let Err(e) = session.insert(session_keys::VISITOR_ID, &id).await {
            tracing::error!("Failed to store visitor id in session: {e}");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Session unavailable"));
        }
        tracing::debug!(visitor = %id, "New visitor");

        Ok(Self(id))
    }
}
