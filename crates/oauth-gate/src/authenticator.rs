//! Per-request authentication.
//!
//! `Authenticator::authenticate_request` is the single entry point a host
//! calls per request:
//!
//! ```text
//! strip trust headers -> read access_token -> (none: done)
//!                     -> resolve -> inject headers | absorb not-found | fail
//! ```
//!
//! Trust headers are always derived fresh from the token on the current
//! request. Headers set by an earlier pass (or by the client) never survive.

use crate::config::OauthClientConfig;
use crate::errors::AuthError;
use crate::headers::{inject_identity, strip_trust_headers};
use crate::observability::metrics::record_authentication;
use crate::resolver::{HttpTokenResolver, TokenResolver};
use axum::extract::Query;
use axum::http::{Request, Uri};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Query parameter carrying the access token id.
pub const PARAM_ACCESS_TOKEN: &str = "access_token";

/// Resolves access tokens and writes trust headers.
///
/// Cheap to clone and safe to share across concurrent requests; the only
/// state is the resolver, which is read-only after construction.
#[derive(Clone)]
pub struct Authenticator {
    resolver: Arc<dyn TokenResolver>,
}

impl Authenticator {
    /// Create an authenticator over any resolver.
    pub fn new(resolver: Arc<dyn TokenResolver>) -> Self {
        Self { resolver }
    }

    /// Create an authenticator backed by the HTTP token service client.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ClientBuild` if the HTTP client cannot be built.
    pub fn from_config(config: &OauthClientConfig) -> Result<Self, AuthError> {
        Ok(Self::new(Arc::new(HttpTokenResolver::new(config)?)))
    }

    /// Authenticate `request` in place.
    ///
    /// Returns `Ok(())` when there is nothing to do (no request, no token),
    /// when the token is unknown to the service, and after injecting the
    /// resolved identity. Any other lookup failure is returned unchanged and
    /// leaves no trust headers on the request.
    #[instrument(skip_all, name = "oauth_gate.authenticator.authenticate")]
    pub async fn authenticate_request<B>(
        &self,
        request: Option<&mut Request<B>>,
    ) -> Result<(), AuthError> {
        let Some(request) = request else {
            return Ok(());
        };

        strip_trust_headers(Some(&mut *request));

        let Some(token_id) = access_token(request.uri()) else {
            return Ok(());
        };

        match self.resolver.resolve(&token_id).await {
            Ok(identity) => {
                inject_identity(request, &identity);
                debug!(
                    target: "oauth_gate.authenticator",
                    user_id = identity.user_id,
                    client_id = identity.client_id,
                    "Request authenticated"
                );
                record_authentication("authenticated");
                Ok(())
            }
            Err(e) if e.is_not_found() || e == AuthError::InvalidTokenId => {
                debug!(target: "oauth_gate.authenticator", "Unknown access token, continuing anonymously");
                record_authentication("anonymous");
                Ok(())
            }
            Err(e) => {
                warn!(target: "oauth_gate.authenticator", error = %e, "Authentication failed");
                record_authentication("failed");
                Err(e)
            }
        }
    }
}

/// First `access_token` query value, trimmed. `None` when absent or blank.
fn access_token(uri: &Uri) -> Option<String> {
    let Query(params) = match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(params) => params,
        Err(e) => {
            debug!(target: "oauth_gate.authenticator", error = %e, "Unparsable query string, ignoring");
            return None;
        }
    };

    params
        .into_iter()
        .find(|(name, _)| name == PARAM_ACCESS_TOKEN)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
