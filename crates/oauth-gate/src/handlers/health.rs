//! Liveness probe.

use tracing::instrument;

/// Handler for GET /health
///
/// Returns "OK" while the process is serving. Does not call the token
/// service: a slow token service degrades authentication, not liveness.
#[instrument(skip_all, name = "oauth_gate.health.check")]
pub async fn health_check() -> &'static str {
    "OK"
}
