//! oauth-gate
//!
//! Request authentication against a remote OAuth token service. Given an
//! inbound request, the gate:
//!
//! - strips trust headers (`X-User-Id`, `X-Client-Id`, `X-Admin`) supplied by
//!   the caller
//! - reads the `access_token` query parameter
//! - resolves it via `GET <base>/oauth/access_token/{id}`, bounded by a short
//!   timeout
//! - writes the resolved caller attributes back as trust headers
//!
//! Unknown tokens are not an error: the request continues anonymously.
//! Transport and payload failures are.
//!
//! # Modules
//!
//! - `authenticator` - Per-request orchestration
//! - `config` - Token service client and host configuration
//! - `errors` - Error taxonomy with HTTP status mapping
//! - `headers` - Trust header readers, sanitizer and injector
//! - `middleware` - Axum middleware
//! - `models` - Token service wire types
//! - `resolver` - Token lookup trait, HTTP client and mock
//! - `observability` - Metrics
//! - `handlers`, `routes` - Demo host

pub mod authenticator;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod headers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod resolver;
pub mod routes;

pub use authenticator::Authenticator;
pub use errors::AuthError;
pub use headers::{caller_id, client_id, is_admin, is_public};
pub use models::ResolvedIdentity;
pub use resolver::{HttpTokenResolver, TokenResolver};
