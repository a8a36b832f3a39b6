//! Metrics definitions for oauth-gate.
//!
//! All metrics follow Prometheus naming conventions:
//! - `oauth_gate_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded by code:
//! - `outcome` (lookups): success, not_found, remote_error, timeout, error, invalid_token_id
//! - `result` (authentications): authenticated, anonymous, failed

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Token lookups are bounded by a timeout of the order of 100ms, so the
/// buckets are sub-second.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("oauth_gate_token_lookup".to_string()),
            &[
                0.002, 0.005, 0.010, 0.025, 0.050, 0.075, 0.100, 0.150, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set token lookup buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record one remote token lookup.
///
/// Metric: `oauth_gate_token_lookups_total`, `oauth_gate_token_lookup_duration_seconds`
/// Labels: `outcome`
pub fn record_token_lookup(outcome: &'static str, duration: Duration) {
    histogram!("oauth_gate_token_lookup_duration_seconds",
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());

    counter!("oauth_gate_token_lookups_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Record the result of one `authenticate_request` call that carried a token.
///
/// Metric: `oauth_gate_authentications_total`
/// Labels: `result`
pub fn record_authentication(result: &'static str) {
    counter!("oauth_gate_authentications_total",
        "result" => result
    )
    .increment(1);
}
