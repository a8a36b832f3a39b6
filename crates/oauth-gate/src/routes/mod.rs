//! HTTP routes for the demo host.
//!
//! Defines the Axum router.

use crate::authenticator::Authenticator;
use crate::handlers;
use crate::middleware::{authenticate, require_caller, AuthState};
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe - public
/// - `/metrics` - Prometheus metrics endpoint - public
/// - `/api/v1/me` - Current caller - requires a resolved caller
/// - `authenticate` on every route, so trust headers can never be spoofed
/// - TraceLayer for request logging
/// - 30 second request timeout
pub fn build_routes(authenticator: Authenticator, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState { authenticator });

    let public_routes = Router::new().route("/health", get(handlers::health_check));

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/api/v1/me", get(handlers::get_me))
        .route_layer(middleware::from_fn(require_caller));

    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(auth_state, authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
