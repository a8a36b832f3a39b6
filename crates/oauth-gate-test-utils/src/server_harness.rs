//! Test server harness for E2E testing
//!
//! Provides `TestOauthGate` for spawning the demo host in tests.

use crate::mock_oauth::MockOauthServer;
use metrics_exporter_prometheus::PrometheusBuilder;
use oauth_gate::authenticator::Authenticator;
use oauth_gate::config::Config;
use oauth_gate::routes;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::task::JoinHandle;

/// Test harness for spawning the demo host against a mock token service.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_me_e2e() -> Result<(), anyhow::Error> {
///     let oauth = MockOauthServer::start().await;
///     oauth.with_token("t1", 42, 7).await;
///     let server = TestOauthGate::spawn(&oauth).await?;
///
///     let response = reqwest::get(format!("{}/api/v1/me?access_token=t1", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestOauthGate {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestOauthGate {
    /// Spawn a host that resolves tokens against `oauth`.
    ///
    /// The server binds to a random available port and uses a local
    /// Prometheus recorder, so several instances can run in one process.
    pub async fn spawn(oauth: &MockOauthServer) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("OAUTH_BASE_URL".to_string(), oauth.uri()),
            // Generous timeout so slow CI hosts do not flake
            ("OAUTH_TIMEOUT_MS".to_string(), "2000".to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let authenticator = Authenticator::from_config(&config.oauth)
            .map_err(|e| anyhow::anyhow!("Failed to create authenticator: {}", e))?;

        // Not installed globally; only the /metrics handler reads it
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let app = routes::build_routes(authenticator, metrics_handle);

        let listener = tokio::net::TcpListener::bind(&config.bind_address)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestOauthGate {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
