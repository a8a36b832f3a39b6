//! Trust header handling.
//!
//! Readers classify an inbound request (public or not, which caller), the
//! sanitizer drops trust headers supplied from outside, and the injector
//! writes the attributes of a resolved identity.
//!
//! A missing request (`None`) reads as public with an unknown caller. This
//! is a default for missing context, not for missing credentials.

use crate::models::ResolvedIdentity;
use axum::http::{HeaderName, HeaderValue, Request};

/// Marks a request as not requiring a resolved identity.
pub const HEADER_PUBLIC: HeaderName = HeaderName::from_static("x-public");

/// Client (application) id of the resolved token.
pub const HEADER_CLIENT_ID: HeaderName = HeaderName::from_static("x-client-id");

/// User id of the resolved token.
pub const HEADER_CALLER_ID: HeaderName = HeaderName::from_static("x-user-id");

/// Admin flag of the resolved token.
pub const HEADER_ADMIN: HeaderName = HeaderName::from_static("x-admin");

/// Headers that only this crate may set.
pub const TRUST_HEADERS: [HeaderName; 3] = [HEADER_CLIENT_ID, HEADER_CALLER_ID, HEADER_ADMIN];

/// Returns true if there is no request or it carries `X-Public: true`.
pub fn is_public<B>(request: Option<&Request<B>>) -> bool {
    match request {
        None => true,
        Some(req) => header_str(req, &HEADER_PUBLIC) == Some("true"),
    }
}

/// User id from `X-User-Id`, or `0` when unknown.
pub fn caller_id<B>(request: Option<&Request<B>>) -> i64 {
    request.map_or(0, |req| header_i64(req, &HEADER_CALLER_ID))
}

/// Client id from `X-Client-Id`, or `0` when unknown.
pub fn client_id<B>(request: Option<&Request<B>>) -> i64 {
    request.map_or(0, |req| header_i64(req, &HEADER_CLIENT_ID))
}

/// Returns true only if `X-Admin` is exactly `true`.
pub fn is_admin<B>(request: Option<&Request<B>>) -> bool {
    request.is_some_and(|req| header_str(req, &HEADER_ADMIN) == Some("true"))
}

/// Remove every trust header from the request.
pub fn strip_trust_headers<B>(request: Option<&mut Request<B>>) {
    let Some(req) = request else {
        return;
    };

    let headers = req.headers_mut();
    for name in &TRUST_HEADERS {
        // Drops every value stored under the name, not just the first.
        headers.remove(name);
    }
}

/// Write the identity's attributes into the trust headers.
pub fn inject_identity<B>(request: &mut Request<B>, identity: &ResolvedIdentity) {
    let headers = request.headers_mut();
    headers.insert(HEADER_CLIENT_ID, HeaderValue::from(identity.client_id));
    headers.insert(HEADER_CALLER_ID, HeaderValue::from(identity.user_id));
    headers.insert(
        HEADER_ADMIN,
        HeaderValue::from_static(if identity.is_admin { "true" } else { "false" }),
    );
}

fn header_str<'a, B>(request: &'a Request<B>, name: &HeaderName) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}

fn header_i64<B>(request: &Request<B>, name: &HeaderName) -> i64 {
    header_str(request, name)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0)
}
