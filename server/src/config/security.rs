use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Headers sent on every API response, as `(name, value)` pairs.
const API_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("content-security-policy", "default-src 'none'; frame-ancestors 'none'"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "geolocation=(), microphone=(), camera=()"),
];

/// Attach the security headers to `router`. HSTS is only sent when
/// `include_hsts` is set, which should be limited to HTTPS deployments.
pub fn with_security_headers<S>(router: Router<S>, include_hsts: bool) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let mut router = API_HEADERS.iter().fold(router, |router, &(name, value)| {
        router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    });

    if include_hsts {
        tracing::info!("Security: HSTS header enabled");
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static(HSTS_VALUE),
        ));
    } else {
        tracing::info!("Security: HSTS header disabled");
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_constants_are_valid() {
        for (name, value) in API_HEADERS {
            assert!(name.parse::<HeaderName>().is_ok(), "bad header name {}", name);
            assert!(value.parse::<HeaderValue>().is_ok(), "bad header value {}", value);
        }
        assert!(HSTS_VALUE.parse::<HeaderValue>().is_ok());
    }
}
