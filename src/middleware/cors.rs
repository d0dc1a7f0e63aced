//! CORS policy for the browser client.
//!
//! Note:
//! - The client sends its access token as a cookie, so credentials are allowed.
//!   That rules out a wildcard origin: only the configured origins (exact match)
//!   get `Access-Control-Allow-Origin`.
//! - Apply outside the authentication gate so preflight `OPTIONS` requests are
//!   answered before any credential check.

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub fn layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|s| match HeaderValue::from_str(s) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %s, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Apply the CORS policy to the given Router.
pub fn apply(router: Router, allowed_origins: &[String]) -> Router {
    router.layer(layer(allowed_origins))
}
