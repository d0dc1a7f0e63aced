//! HTTP-level middleware (cross-cutting concerns).
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Access logging / request tracing (TraceLayer)
//! - Body size limit and global timeout, both from `Config`

use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header::HeaderName};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, Copy)]
pub struct HttpLimits {
    pub body_limit_bytes: usize,
    pub timeout: Duration,
}

pub fn apply(router: Router, limits: HttpLimits) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        // TimeoutLayer yields BoxError; turn it back into a response.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                tracing::warn!("request timed out");
                StatusCode::REQUEST_TIMEOUT
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(limits.body_limit_bytes))
        .layer(TimeoutLayer::new(limits.timeout));

    router.layer(layers)
}
