//! Session identity extractors.
//!
//! Handlers take a [`SessionContext`] argument to learn who the shopper is.
//! The context is loaded from the tower-sessions record on every request, so
//! a restart or a second browser tab sees the same identity.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::session::SessionContext;

/// Rejection when the session layer is missing from the router.
#[derive(Debug)]
pub struct MissingSessionLayer;

impl IntoResponse for MissingSessionLayer {
    fn into_response(self) -> Response {
        tracing::error!("Session extension missing; is SessionManagerLayer installed?");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = MissingSessionLayer;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(MissingSessionLayer)?;

        let context = Self::load(session).await;

        if let Some(profile) = context.identity().profile() {
            tracing::Span::current().record("user_id", profile.id.as_str());
        }

        Ok(context)
    }
}
