//! Current caller handler.
//!
//! Reports the identity the authentication middleware injected.

use crate::headers::{caller_id, client_id, is_admin};
use axum::extract::Request;
use axum::Json;
use serde::Serialize;
use tracing::instrument;

/// Response for `/api/v1/me` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// User id behind the access token.
    pub user_id: i64,

    /// Client id that presented the access token.
    pub client_id: i64,

    /// Elevated-privilege flag.
    pub admin: bool,
}

/// Handler for GET /api/v1/me
///
/// Requires the `authenticate` and `require_caller` middleware.
///
/// ## Response
///
/// ```json
/// { "user_id": 42, "client_id": 7, "admin": false }
/// ```
#[instrument(skip_all, name = "oauth_gate.handlers.me")]
pub async fn get_me(req: Request) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: caller_id(Some(&req)),
        client_id: client_id(Some(&req)),
        admin: is_admin(Some(&req)),
    })
}
