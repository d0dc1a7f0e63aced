//! Response rendering for rejected requests.

use axum::http::Uri;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::middleware::auth::AuthError;

/// Invoked by the gate when a protected request carries no acceptable credential.
///
/// Implementations must answer with a 401; the gate never forwards a request
/// after calling `commence`.
pub trait AuthEntryPoint: Send + Sync {
    fn commence(&self, uri: &Uri, error: &AuthError) -> Response;
}

/// Default entry point: the application's JSON error body.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEntryPoint;

impl AuthEntryPoint for JsonEntryPoint {
    fn commence(&self, _uri: &Uri, _error: &AuthError) -> Response {
        AppError::Unauthorized.into_response()
    }
}
