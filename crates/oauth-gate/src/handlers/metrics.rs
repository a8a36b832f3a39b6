//! Prometheus metrics endpoint handler.
//!
//! This endpoint is unauthenticated to allow Prometheus to scrape metrics.
//! No token ids or caller ids are exposed; labels are bounded.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text format:
/// ```text
/// # TYPE oauth_gate_token_lookups_total counter
/// oauth_gate_token_lookups_total{outcome="success"} 42
/// ```
#[tracing::instrument(skip_all, name = "oauth_gate.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
