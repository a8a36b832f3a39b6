//! Access token resolution against the remote token service.
//!
//! `TokenResolver` is the seam the authenticator depends on;
//! `HttpTokenResolver` is the production implementation and
//! `mock::MockTokenResolver` a network-free double.
//!
//! # Security
//!
//! - Token ids are never logged
//! - The token id is sent as one percent-encoded path segment
//! - Every lookup is bounded by the configured timeout; there are no retries

use crate::config::OauthClientConfig;
use crate::errors::AuthError;
use crate::models::{RemoteErrorPayload, ResolvedIdentity};
use crate::observability::metrics::record_token_lookup;
use reqwest::{Client, Url};
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

/// Path prefix of the token lookup endpoint, one entry per segment.
const ACCESS_TOKEN_PATH: [&str; 2] = ["oauth", "access_token"];

/// `RemoteCallFailed` reason when the lookup ran out of time.
pub const TIMED_OUT: &str = "request timed out";

/// Resolves an access token id into caller attributes.
#[async_trait::async_trait]
pub trait TokenResolver: Send + Sync {
    /// Look up `token_id`.
    ///
    /// # Errors
    ///
    /// - `AuthError::RemoteLookupFailed` if the service rejected the lookup
    /// - `AuthError::InvalidTokenId` if the id cannot be sent as a path segment
    /// - Internal kinds for transport and payload failures
    async fn resolve(&self, token_id: &str) -> Result<ResolvedIdentity, AuthError>;
}

/// HTTP client for the token service lookup endpoint.
#[derive(Clone)]
pub struct HttpTokenResolver {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Base URL of the token service.
    base_url: Url,
}

impl HttpTokenResolver {
    /// Create a resolver from the token service configuration.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ClientBuild` if the HTTP client cannot be built.
    pub fn new(config: &OauthClientConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| {
                error!(target: "oauth_gate.resolver", error = %e, "Failed to build HTTP client");
                AuthError::ClientBuild(e.to_string())
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Build `<base>/oauth/access_token/{token_id}`.
    fn lookup_url(&self, token_id: &str) -> Result<Url, AuthError> {
        if token_id.is_empty() || is_dot_segment(token_id) {
            return Err(AuthError::InvalidTokenId);
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AuthError::ClientBuild("token service URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(ACCESS_TOKEN_PATH)
            .push(token_id);
        url.set_query(None);
        url.set_fragment(None);

        Ok(url)
    }

    /// Map the token service response to an identity or a classified error.
    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<ResolvedIdentity, AuthError> {
        let status = response.status();

        let body = response.bytes().await.map_err(|e| {
            warn!(target: "oauth_gate.resolver", status = %status, error = %e, "Failed to read token service response");
            // The request timeout also bounds the body
            if e.is_timeout() {
                AuthError::RemoteCallFailed(TIMED_OUT.to_string())
            } else {
                AuthError::InvalidResponse
            }
        })?;

        if body.is_empty() {
            warn!(target: "oauth_gate.resolver", status = %status, "Token service returned an empty body");
            return Err(AuthError::InvalidResponse);
        }

        if status.is_client_error() || status.is_server_error() {
            let payload: RemoteErrorPayload = serde_json::from_slice(&body).map_err(|e| {
                error!(target: "oauth_gate.resolver", status = %status, error = %e, "Failed to parse token service error payload");
                AuthError::MalformedErrorPayload(e.to_string())
            })?;

            debug!(
                target: "oauth_gate.resolver",
                status = %status,
                remote_status = payload.status,
                remote_error = %payload.error,
                "Token service rejected lookup"
            );

            return Err(AuthError::RemoteLookupFailed {
                status: payload.status,
                message: payload.message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            error!(target: "oauth_gate.resolver", error = %e, "Failed to parse access token response");
            AuthError::MalformedIdentity(e.to_string())
        })
    }
}

#[async_trait::async_trait]
impl TokenResolver for HttpTokenResolver {
    #[instrument(skip_all, name = "oauth_gate.resolver.resolve")]
    async fn resolve(&self, token_id: &str) -> Result<ResolvedIdentity, AuthError> {
        let start = Instant::now();

        let url = match self.lookup_url(token_id) {
            Ok(url) => url,
            Err(e) => {
                debug!(target: "oauth_gate.resolver", "Rejected token id that is not a single path segment");
                record_token_lookup(lookup_outcome(&Err(e.clone())), start.elapsed());
                return Err(e);
            }
        };

        let result = match self.client.get(url).send().await {
            Ok(response) => self.handle_response(response).await,
            Err(e) => {
                warn!(
                    target: "oauth_gate.resolver",
                    error = %e,
                    timeout = e.is_timeout(),
                    "Token service request failed"
                );
                let reason = if e.is_timeout() {
                    TIMED_OUT.to_string()
                } else {
                    e.to_string()
                };
                Err(AuthError::RemoteCallFailed(reason))
            }
        };

        record_token_lookup(lookup_outcome(&result), start.elapsed());
        result
    }
}

/// The URL layer drops dot segments instead of encoding them. `%` is always
/// encoded, so percent-encoded dots arrive as literal text.
fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

/// Bounded `outcome` label for lookup metrics.
fn lookup_outcome(result: &Result<ResolvedIdentity, AuthError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) if e.is_not_found() => "not_found",
        Err(AuthError::RemoteLookupFailed { .. }) => "remote_error",
        Err(AuthError::RemoteCallFailed(reason)) if reason == TIMED_OUT => "timeout",
        Err(AuthError::InvalidTokenId) => "invalid_token_id",
        Err(_) => "error",
    }
}

/// Mock implementations of the resolver for use in tests.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock resolver backed by a fixed table of tokens.
    ///
    /// Unknown ids resolve to a 404 `RemoteLookupFailed`, like the real
    /// service.
    #[derive(Default)]
    pub struct MockTokenResolver {
        /// Known tokens, keyed by id.
        tokens: HashMap<String, ResolvedIdentity>,
        /// Error to return for every lookup, if set.
        failure: Option<AuthError>,
        /// Number of calls made.
        call_count: AtomicUsize,
    }

    impl MockTokenResolver {
        /// Create a mock that knows no tokens.
        pub fn empty() -> Self {
            Self::default()
        }

        /// Create a mock that fails every lookup with `error`.
        pub fn failing(error: AuthError) -> Self {
            Self {
                failure: Some(error),
                ..Self::default()
            }
        }

        /// Register a token.
        #[must_use]
        pub fn with_token(mut self, token_id: &str, user_id: i64, client_id: i64) -> Self {
            self.tokens.insert(
                token_id.to_string(),
                ResolvedIdentity {
                    token_id: token_id.to_string(),
                    user_id,
                    client_id,
                    is_admin: false,
                },
            );
            self
        }

        /// Register an admin token.
        #[must_use]
        pub fn with_admin_token(mut self, token_id: &str, user_id: i64, client_id: i64) -> Self {
            self.tokens.insert(
                token_id.to_string(),
                ResolvedIdentity {
                    token_id: token_id.to_string(),
                    user_id,
                    client_id,
                    is_admin: true,
                },
            );
            self
        }

        /// Get the number of calls made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl TokenResolver for MockTokenResolver {
        async fn resolve(&self, token_id: &str) -> Result<ResolvedIdentity, AuthError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if let Some(error) = &self.failure {
                return Err(error.clone());
            }

            self.tokens
                .get(token_id)
                .cloned()
                .ok_or_else(|| AuthError::RemoteLookupFailed {
                    status: 404,
                    message: "no access token found with given id".to_string(),
                })
        }
    }

}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(base_url: &str) -> HttpTokenResolver {
        let config = OauthClientConfig::new(base_url).unwrap();
        HttpTokenResolver::new(&config).unwrap()
    }

    // =========================================================================
    // URL Construction
    // =========================================================================

    #[test]
    fn test_lookup_url_plain_id() {
        let resolver = resolver_for("http://oauth.local:8080");

        let url = resolver.lookup_url("abc123").unwrap();

        assert_eq!(url.as_str(), "http://oauth.local:8080/oauth/access_token/abc123");
    }

    #[test]
    fn test_lookup_url_keeps_base_path_prefix() {
        let resolver = resolver_for("http://oauth.local/internal/");

        let url = resolver.lookup_url("abc").unwrap();

        assert_eq!(url.as_str(), "http://oauth.local/internal/oauth/access_token/abc");
    }

    #[test]
    fn test_lookup_url_escapes_path_breaking_characters() {
        let resolver = resolver_for("http://oauth.local");

        let url = resolver.lookup_url("../../admin?x=1#frag").unwrap();

        assert_eq!(url.path_segments().unwrap().count(), 3);
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
        assert!(url.path().starts_with("/oauth/access_token/"));
        assert!(url.path().contains("%2F"));
    }

    #[test]
    fn test_lookup_url_rejects_dot_segments() {
        let resolver = resolver_for("http://oauth.local");

        assert_eq!(resolver.lookup_url(".").unwrap_err(), AuthError::InvalidTokenId);
        assert_eq!(resolver.lookup_url("..").unwrap_err(), AuthError::InvalidTokenId);
        assert_eq!(resolver.lookup_url("").unwrap_err(), AuthError::InvalidTokenId);

        let url = resolver.lookup_url("%2e%2e").unwrap();
        assert_eq!(url.path(), "/oauth/access_token/%252e%252e");
    }

    // =========================================================================
    // Response Classification
    // =========================================================================

    #[tokio::test]
    async fn test_resolve_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/oauth/access_token/t1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "t1",
                "user_id": 42,
                "client_id": 7
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let identity = resolver_for(&mock_server.uri()).resolve("t1").await.unwrap();

        assert_eq!(identity.token_id, "t1");
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.client_id, 7);
        assert!(!identity.is_admin);
    }

    #[tokio::test]
    async fn test_resolve_admin_permissions() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/oauth/access_token/admin-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "admin-token",
                "user_id": 1,
                "client_id": 2,
                "permissions": true
            })))
            .mount(&mock_server)
            .await;

        let identity = resolver_for(&mock_server.uri())
            .resolve("admin-token")
            .await
            .unwrap();

        assert!(identity.is_admin);
    }

    #[tokio::test]
    async fn test_resolve_tolerates_missing_id_and_null_permissions() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/oauth/access_token/no-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user_id": 42,
                "client_id": 7
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/oauth/access_token/null-perms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "null-perms",
                "user_id": 43,
                "client_id": 8,
                "permissions": null
            })))
            .mount(&mock_server)
            .await;

        let resolver = resolver_for(&mock_server.uri());

        let no_id = resolver.resolve("no-id").await.unwrap();
        assert_eq!(no_id.user_id, 42);
        assert_eq!(no_id.client_id, 7);
        assert!(!no_id.is_admin);

        let null_perms = resolver.resolve("null-perms").await.unwrap();
        assert_eq!(null_perms.user_id, 43);
        assert!(!null_perms.is_admin);
    }

    #[tokio::test]
    async fn test_resolve_not_found_propagates_remote_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/oauth/access_token/bad"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "no access token found with given id",
                "status": 404,
                "error": "not_found",
                "causes": []
            })))
            .mount(&mock_server)
            .await;

        let err = resolver_for(&mock_server.uri())
            .resolve("bad")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(
            err,
            AuthError::RemoteLookupFailed {
                status: 404,
                message: "no access token found with given id".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_uses_payload_status_over_http_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "message": "database error",
                "status": 503,
                "error": "internal_server_error"
            })))
            .mount(&mock_server)
            .await;

        let err = resolver_for(&mock_server.uri())
            .resolve("t1")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::RemoteLookupFailed { status: 503, .. }));
        assert!(!err.is_internal());
    }

    #[tokio::test]
    async fn test_resolve_malformed_error_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&mock_server)
            .await;

        let err = resolver_for(&mock_server.uri())
            .resolve("t1")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MalformedErrorPayload(_)));
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_resolve_malformed_identity() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "t1",
                "user_id": "not-a-number",
                "client_id": 7
            })))
            .mount(&mock_server)
            .await;

        let err = resolver_for(&mock_server.uri())
            .resolve("t1")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MalformedIdentity(_)));
    }

    #[tokio::test]
    async fn test_resolve_empty_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let err = resolver_for(&mock_server.uri())
            .resolve("t1")
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::InvalidResponse);
    }

    #[tokio::test]
    async fn test_resolve_timeout_is_remote_call_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "id": "slow",
                        "user_id": 1,
                        "client_id": 1
                    }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let config = OauthClientConfig::new(&mock_server.uri())
            .unwrap()
            .with_request_timeout(Duration::from_millis(50));
        let resolver = HttpTokenResolver::new(&config).unwrap();

        let err = resolver.resolve("slow").await.unwrap_err();

        assert_eq!(err, AuthError::RemoteCallFailed(TIMED_OUT.to_string()));
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_resolve_timeout_while_reading_body() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Headers arrive at once, the promised body never does
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"id\"",
                )
                .await
                .unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let config = OauthClientConfig::new(&format!("http://{addr}"))
            .unwrap()
            .with_request_timeout(Duration::from_millis(100));
        let resolver = HttpTokenResolver::new(&config).unwrap();

        let result = resolver.resolve("t1").await;

        assert_eq!(
            result.clone().unwrap_err(),
            AuthError::RemoteCallFailed(TIMED_OUT.to_string())
        );
        assert_eq!(lookup_outcome(&result), "timeout");
        server.abort();
    }

    #[tokio::test]
    async fn test_resolve_connection_refused() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = resolver_for(&format!("http://{addr}"))
            .resolve("t1")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::RemoteCallFailed(_)));
    }

    #[tokio::test]
    async fn test_resolve_dot_segment_never_hits_network() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = resolver_for(&mock_server.uri())
            .resolve("..")
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::InvalidTokenId);
    }

    #[test]
    fn test_lookup_outcome_labels() {
        let not_found = Err(AuthError::RemoteLookupFailed {
            status: 404,
            message: String::new(),
        });
        let forbidden = Err(AuthError::RemoteLookupFailed {
            status: 403,
            message: String::new(),
        });

        assert_eq!(lookup_outcome(&not_found), "not_found");
        assert_eq!(lookup_outcome(&forbidden), "remote_error");
        assert_eq!(
            lookup_outcome(&Err(AuthError::RemoteCallFailed(TIMED_OUT.into()))),
            "timeout"
        );
        assert_eq!(lookup_outcome(&Err(AuthError::InvalidTokenId)), "invalid_token_id");
        assert_eq!(lookup_outcome(&Err(AuthError::InvalidResponse)), "error");
    }
}
