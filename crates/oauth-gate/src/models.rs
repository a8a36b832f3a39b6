//! Wire types of the token service.

use serde::{Deserialize, Deserializer, Serialize};

/// Caller attributes resolved from an access token id.
///
/// Only produced by a successful lookup against the token service. Trust
/// headers are the output of resolution and are never read back into this
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    /// The access token id the lookup was made for. Empty when the service
    /// omits it.
    #[serde(rename = "id", default)]
    pub token_id: String,

    /// Account behind the token.
    pub user_id: i64,

    /// Application presenting the token.
    pub client_id: i64,

    /// Elevated-privilege flag. Absent or null reads as `false`.
    #[serde(rename = "permissions", default, deserialize_with = "null_as_false")]
    pub is_admin: bool,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Error body returned by the token service on 4xx/5xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteErrorPayload {
    /// Status reported by the service. This, not the HTTP status line, is
    /// what classifies the failure.
    pub status: u16,

    /// Human-readable description.
    #[serde(default)]
    pub message: String,

    /// Short error code, e.g. `not_found`.
    #[serde(default)]
    pub error: String,

    /// Underlying causes, passed through untyped.
    #[serde(default)]
    pub causes: Vec<serde_json::Value>,
}
