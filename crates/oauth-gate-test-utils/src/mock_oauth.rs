//! Mock token service.
//!
//! Wraps a wiremock `MockServer` that answers
//! `GET /oauth/access_token/{id}` the way the real service does:
//! 200 with `{id, user_id, client_id, permissions}` for known tokens and a
//! JSON error payload otherwise.
//!
//! # Example
//!
//! ```rust,ignore
//! let server = MockOauthServer::start().await;
//! server.with_token("t1", 42, 7).await;
//! server.with_not_found("bad").await;
//!
//! let resolver = server.resolver();
//! ```

use oauth_gate::authenticator::Authenticator;
use oauth_gate::config::OauthClientConfig;
use oauth_gate::resolver::HttpTokenResolver;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wiremock-backed token service.
pub struct MockOauthServer {
    server: MockServer,
}

impl MockOauthServer {
    /// Start a server on a random local port with no tokens registered.
    ///
    /// Unregistered paths get wiremock's default 404 with an empty body.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the server.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Client configuration pointing at this server, default timeouts.
    pub fn config(&self) -> OauthClientConfig {
        OauthClientConfig::new(&self.uri()).expect("mock server URI should be a valid base URL")
    }

    /// HTTP resolver pointing at this server.
    pub fn resolver(&self) -> HttpTokenResolver {
        HttpTokenResolver::new(&self.config()).expect("HTTP client should build")
    }

    /// Authenticator pointing at this server with the given request timeout.
    pub fn authenticator_with_timeout(&self, timeout: Duration) -> Authenticator {
        Authenticator::from_config(&self.config().with_request_timeout(timeout))
            .expect("HTTP client should build")
    }

    /// Authenticator pointing at this server, default timeouts.
    pub fn authenticator(&self) -> Authenticator {
        Authenticator::from_config(&self.config()).expect("HTTP client should build")
    }

    /// Register a regular token.
    pub async fn with_token(&self, token_id: &str, user_id: i64, client_id: i64) {
        self.mount_identity(token_id, user_id, client_id, false, None)
            .await;
    }

    /// Register an admin token.
    pub async fn with_admin_token(&self, token_id: &str, user_id: i64, client_id: i64) {
        self.mount_identity(token_id, user_id, client_id, true, None)
            .await;
    }

    /// Register a token whose lookup answers only after `delay`.
    pub async fn with_slow_token(&self, token_id: &str, delay: Duration) {
        self.mount_identity(token_id, 1, 1, false, Some(delay)).await;
    }

    /// Answer lookups of `token_id` with the service's not-found payload.
    pub async fn with_not_found(&self, token_id: &str) {
        self.with_error(token_id, 404, "no access token found with given id")
            .await;
    }

    /// Answer lookups of `token_id` with an error payload carrying `status`.
    pub async fn with_error(&self, token_id: &str, status: u16, message: &str) {
        let error = match status {
            400 => "bad_request",
            401 => "unauthorized",
            404 => "not_found",
            _ => "internal_server_error",
        };

        self.with_raw_response(
            token_id,
            ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "message": message,
                "status": status,
                "error": error,
                "causes": []
            })),
        )
        .await;
    }

    /// Answer lookups of `token_id` with an arbitrary response.
    pub async fn with_raw_response(&self, token_id: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/oauth/access_token/{token_id}")))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Requests received so far.
    pub async fn received_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    async fn mount_identity(
        &self,
        token_id: &str,
        user_id: i64,
        client_id: i64,
        is_admin: bool,
        delay: Option<Duration>,
    ) {
        let mut response = ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": token_id,
            "user_id": user_id,
            "client_id": client_id,
            "permissions": is_admin
        }));
        if let Some(delay) = delay {
            response = response.set_delay(delay);
        }

        self.with_raw_response(token_id, response).await;
    }
}
