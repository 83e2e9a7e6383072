//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Provides rate limiters for different endpoint categories:
//! - `auth_rate_limiter`: Strict limits for sign-in and registration (~10/min)
//! - `api_rate_limiter`: Relaxed limits for catalog and cart endpoints (~100/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request},
    http::{self, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor for the per-IP limiters.
///
/// Keys on the socket peer address. With `trust_proxy_headers` set (the
/// server sits behind a reverse proxy that overwrites these headers) the
/// proxy-supplied client IP takes precedence.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self {
            trust_proxy_headers,
        }
    }
}

/// Headers checked in order; each holds a single IP except
/// `x-forwarded-for`, where the first entry is the client.
const CLIENT_IP_HEADERS: [&str; 4] = [
    "cf-connecting-ip",
    "x-forwarded-for",
    "x-real-ip",
    "fly-client-ip",
];

fn client_ip_from_headers(headers: &http::HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &http::Request<T>) -> Result<Self::Key, GovernorError> {
        let from_headers = if self.trust_proxy_headers {
            client_ip_from_headers(req.headers())
        } else {
            None
        };

        from_headers
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for auth endpoints: ~10 requests per minute per IP.
///
/// Configuration: 1 request every 6 seconds (replenish), burst of 5.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn auth_rate_limiter(key_extractor: ClientIpKeyExtractor) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(key_extractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for general API: ~100 requests per minute per IP.
///
/// Configuration: 1 request per second (replenish), burst of 50.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(1)` and `burst_size(50)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter(key_extractor: ClientIpKeyExtractor) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(key_extractor)
        .per_second(1)
        .burst_size(50)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(50) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Rewrite the limiter's plain-text 429 into the JSON error shape.
pub async fn json_rate_limit_middleware(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if response.status() == StatusCode::TOO_MANY_REQUESTS && !is_json {
        return AppError::RateLimited.into_response();
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> http::Request<()> {
        let mut builder = http::Request::builder().uri("/api/cart");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    fn with_peer(mut req: http::Request<()>) -> http::Request<()> {
        req.extensions_mut()
            .insert(ConnectInfo("192.0.2.9:5123".parse::<SocketAddr>().unwrap()));
        req
    }

    const BEHIND_PROXY: ClientIpKeyExtractor = ClientIpKeyExtractor::new(true);
    const DIRECT: ClientIpKeyExtractor = ClientIpKeyExtractor::new(false);

    #[test]
    fn test_ignores_client_ip_headers_by_default() {
        let first = with_peer(request(&[("x-forwarded-for", "198.51.100.1")]));
        let second = with_peer(request(&[
            ("x-forwarded-for", "198.51.100.2"),
            ("x-real-ip", "198.51.100.3"),
            ("cf-connecting-ip", "198.51.100.4"),
        ]));

        let first = DIRECT.extract(&first).unwrap();
        let second = DIRECT.extract(&second).unwrap();
        assert_eq!(first.to_string(), "192.0.2.9");
        assert_eq!(first, second);
    }

    #[test]
    fn test_prefers_cloudflare_header_behind_proxy() {
        let req = with_peer(request(&[
            ("x-forwarded-for", "10.0.0.1"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]));
        let ip = BEHIND_PROXY.extract(&req).unwrap();
        assert_eq!(ip.to_string(), "203.0.113.7");
    }

    #[test]
    fn test_uses_first_forwarded_for_entry_behind_proxy() {
        let req = request(&[("x-forwarded-for", "198.51.100.2, 10.0.0.1")]);
        let ip = BEHIND_PROXY.extract(&req).unwrap();
        assert_eq!(ip.to_string(), "198.51.100.2");
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let req = with_peer(request(&[("x-real-ip", "not-an-ip")]));
        let ip = BEHIND_PROXY.extract(&req).unwrap();
        assert_eq!(ip.to_string(), "192.0.2.9");
    }

    #[test]
    fn test_no_key_without_peer() {
        assert!(DIRECT.extract(&request(&[("x-real-ip", "198.51.100.5")])).is_err());
        assert!(BEHIND_PROXY.extract(&request(&[])).is_err());
    }
}
