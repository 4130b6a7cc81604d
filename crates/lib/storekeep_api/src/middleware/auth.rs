//! Authentication middleware: Bearer token extraction and verification.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use storekeep_core::models::auth::AccessClaims;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Verified identity of the caller, stored in request extensions by
/// [`require_auth`].
///
/// Also an extractor: protected handlers take it as an argument, so a handler
/// mounted without the guard answers 401 instead of running anonymously.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AccessClaims);

impl AuthenticatedUser {
    pub fn user_id(&self) -> i64 {
        self.0.sub
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("missing_token", "Authentication required"))
    }
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the
/// token, and injects [`AuthenticatedUser`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            debug!("auth: no Authorization header");
            AppError::unauthorized("missing_token", "Missing authorization header")
        })?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            debug!("auth: missing Bearer prefix");
            AppError::unauthorized("invalid_token", "Invalid authorization scheme")
        })?;

    let claims = state.sessions.authenticate(token).map_err(|e| {
        debug!("auth: token rejected: {e}");
        AppError::from(e)
    })?;

    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}
