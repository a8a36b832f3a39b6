//! Axum middleware wrapping the authenticator.
//!
//! Provides two middleware functions:
//! - `authenticate` - Runs `authenticate_request` on every request
//! - `require_caller` - Rejects non-public requests that carry no caller id
//!
//! `authenticate` must run before `require_caller` and before any handler
//! that reads trust headers.

use crate::authenticator::Authenticator;
use crate::errors::{AuthError, Unauthorized};
use crate::headers::{caller_id, is_public};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Authenticator with the token service client.
    pub authenticator: Authenticator,
}

/// Authentication middleware.
///
/// # Response
///
/// - Returns the rendered `AuthError` if the token lookup hard-fails
/// - Otherwise continues to the next handler, with trust headers set if a
///   known token was presented
#[instrument(skip_all, name = "oauth_gate.middleware.authenticate")]
pub async fn authenticate(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AuthError> {
    state.authenticator.authenticate_request(Some(&mut req)).await?;

    Ok(next.run(req).await)
}

/// Caller requirement for protected routes.
///
/// # Response
///
/// - Returns 401 Unauthorized if the request is not public and no caller was
///   resolved
/// - Otherwise continues to the next handler
#[instrument(skip_all, name = "oauth_gate.middleware.require_caller")]
pub async fn require_caller(req: Request, next: Next) -> Result<impl IntoResponse, Unauthorized> {
    if !is_public(Some(&req)) && caller_id(Some(&req)) == 0 {
        tracing::debug!(target: "oauth_gate.middleware", "No caller on protected route");
        return Err(Unauthorized);
    }

    Ok(next.run(req).await)
}
