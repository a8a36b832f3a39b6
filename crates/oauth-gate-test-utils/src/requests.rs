//! Request builders for authentication tests.

use axum::body::Body;
use axum::http::Request;

/// Build a GET request for `uri` with the given headers.
pub fn request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).expect("test request should build")
}

/// Build a GET request carrying `?access_token=<token_id>`.
///
/// The token id is inserted verbatim; callers encode it if needed.
pub fn request_with_token(token_id: &str) -> Request<Body> {
    request(&format!("/resource?access_token={token_id}"), &[])
}

/// Build a request that claims an identity through trust headers only.
pub fn spoofed_request(user_id: i64, client_id: i64) -> Request<Body> {
    request(
        "/resource",
        &[
            ("X-User-Id", &user_id.to_string()),
            ("X-Client-Id", &client_id.to_string()),
            ("X-Admin", "true"),
        ],
    )
}

/// Assert that none of the trust headers are present.
pub fn assert_no_trust_headers<B>(request: &Request<B>) {
    for name in &oauth_gate::headers::TRUST_HEADERS {
        assert!(
            request.headers().get(name).is_none(),
            "trust header {name} should not be set"
        );
    }
}
