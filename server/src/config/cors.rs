use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

/// CORS for the backoffice dashboard. `origins` is a comma separated list;
/// an empty or entirely invalid list allows any origin.
pub fn create_cors_layer(origins: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([header::CONTENT_LENGTH, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(PREFLIGHT_MAX_AGE_SECS));

    match parse_origins(origins) {
        Some(list) => layer.allow_origin(list).allow_credentials(true),
        // Credentials cannot be combined with a wildcard origin.
        None => layer.allow_origin(AllowOrigin::any()),
    }
}

fn parse_origins(origins: &str) -> Option<AllowOrigin> {
    let values: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::debug!(origin, "CORS: allowing origin");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(origin, error = %e, "CORS: ignoring invalid origin");
                None
            }
        })
        .collect();

    if values.is_empty() {
        tracing::warn!("CORS: no valid origins configured, allowing any origin");
        None
    } else {
        tracing::info!(count = values.len(), "CORS: configured allowed origins");
        Some(AllowOrigin::list(values))
    }
}
