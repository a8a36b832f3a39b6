//! Authentication error types.
//!
//! Internal kinds (transport failures, unreadable or undecodable payloads)
//! always surface to the caller of `authenticate_request`. Remote lookup
//! failures carry the status reported by the token service; the
//! orchestrator absorbs the not-found case.
//!
//! When rendered as an HTTP response, messages are generic for internal
//! kinds. The underlying detail is logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors produced while resolving an access token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The remote call never produced a response (connect failure, timeout).
    #[error("Remote call failed: {0}")]
    RemoteCallFailed(String),

    /// A response arrived but its body was missing or unreadable.
    #[error("Empty or invalid response from token service")]
    InvalidResponse,

    /// The token service reported an error but the payload did not decode.
    #[error("Malformed error payload: {0}")]
    MalformedErrorPayload(String),

    /// The token service reported success but the identity did not decode.
    #[error("Malformed identity payload: {0}")]
    MalformedIdentity(String),

    /// The token service rejected the lookup with its own status.
    #[error("Remote lookup failed with status {status}: {message}")]
    RemoteLookupFailed { status: u16, message: String },

    /// The token id cannot be sent as a single path segment.
    #[error("Invalid token id")]
    InvalidTokenId,

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    ClientBuild(String),
}

impl AuthError {
    /// Returns true for the internal kinds (everything not reported by the
    /// token service itself and not a local rejection).
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::RemoteCallFailed(_)
                | AuthError::InvalidResponse
                | AuthError::MalformedErrorPayload(_)
                | AuthError::MalformedIdentity(_)
                | AuthError::ClientBuild(_)
        )
    }

    /// Returns true when the token service reported the token as not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AuthError::RemoteLookupFailed { status, .. } if *status == 404)
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::RemoteCallFailed(_) => 503,
            AuthError::InvalidResponse
            | AuthError::MalformedErrorPayload(_)
            | AuthError::MalformedIdentity(_)
            | AuthError::ClientBuild(_) => 500,
            AuthError::RemoteLookupFailed { status, .. } => *status,
            AuthError::InvalidTokenId => 400,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            AuthError::RemoteCallFailed(reason) => {
                tracing::warn!(target: "oauth_gate.availability", reason = %reason, "Token service unavailable");
                (
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            AuthError::InvalidResponse
            | AuthError::MalformedErrorPayload(_)
            | AuthError::MalformedIdentity(_)
            | AuthError::ClientBuild(_) => {
                tracing::error!(target: "oauth_gate.errors", error = %self, "Token lookup failed");
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
            AuthError::RemoteLookupFailed { message, .. } => {
                ("TOKEN_LOOKUP_FAILED", message.clone())
            }
            AuthError::InvalidTokenId => ("INVALID_TOKEN", "Invalid access token".to_string()),
        };

        // Remote statuses outside 100..=999 cannot go on the wire
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Error returned by `require_caller` when a protected route sees no caller.
#[derive(Debug, Error)]
#[error("Unauthorized")]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: "UNAUTHORIZED".to_string(),
                message: "A valid access token is required".to_string(),
            },
        };

        let mut response = (StatusCode::UNAUTHORIZED, Json(error_response)).into_response();

        if let Ok(header_value) = "Bearer realm=\"oauth-gate\", error=\"invalid_token\"".parse() {
            response
                .headers_mut()
                .insert("WWW-Authenticate", header_value);
        }

        response
    }
}
