//! # oauth-gate Test Utilities
//!
//! Shared test utilities for oauth-gate.
//!
//! This crate provides:
//! - `MockOauthServer` - wiremock-backed token service
//! - Request builders for authentication tests
//! - `TestOauthGate` - demo host bound to a random port
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oauth_gate_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let server = MockOauthServer::start().await;
//!     server.with_token("t1", 42, 7).await;
//!
//!     let authenticator = server.authenticator();
//!     let mut req = request_with_token("t1");
//!     authenticator.authenticate_request(Some(&mut req)).await.unwrap();
//! }
//! ```

pub mod mock_oauth;
pub mod requests;
pub mod server_harness;

// Re-export commonly used items
pub use mock_oauth::*;
pub use requests::*;
pub use server_harness::*;
