//! Request ID middleware for request tracing and correlation.
//!
//! Each request gets an ID that is recorded on the tracing span, tagged on
//! the Sentry scope, and echoed in the `x-request-id` response header.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Upstream IDs longer than this are replaced.
const MAX_UPSTREAM_ID_LENGTH: usize = 128;

/// Reuse a well-formed upstream ID, otherwise generate a UUID v4.
fn resolve_request_id(upstream: Option<&HeaderValue>) -> String {
    upstream
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_UPSTREAM_ID_LENGTH
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(request.headers().get(REQUEST_ID_HEADER));

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_upstream_id() {
        let header = HeaderValue::from_static("cf-ray-8a1b2c3d");
        assert_eq!(resolve_request_id(Some(&header)), "cf-ray-8a1b2c3d");
    }

    #[test]
    fn test_generates_uuid_when_missing_or_malformed() {
        let generated = resolve_request_id(None);
        assert!(Uuid::parse_str(&generated).is_ok());

        let spaced = HeaderValue::from_static("has spaces inside");
        assert!(Uuid::parse_str(&resolve_request_id(Some(&spaced))).is_ok());

        let long = HeaderValue::from_str(&"a".repeat(MAX_UPSTREAM_ID_LENGTH + 1))
            .unwrap_or_else(|_| HeaderValue::from_static("x"));
        assert!(Uuid::parse_str(&resolve_request_id(Some(&long))).is_ok());
    }
}
