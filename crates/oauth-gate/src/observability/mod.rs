//! Observability for oauth-gate.
//!
//! - `metrics` - Prometheus metrics for token lookups and authentication outcomes

pub mod metrics;
