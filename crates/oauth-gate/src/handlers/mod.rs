//! HTTP request handlers for the demo host.

pub mod health;
pub mod me;
pub mod metrics;

pub use health::health_check;
pub use me::get_me;
pub use metrics::metrics_handler;
