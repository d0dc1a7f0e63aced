/*
 * Responsibility
 * - リクエストから access token を取り出す (Authorization: Bearer → jwt cookie の順)
 * - 検証はしない (TokenVerifier の責務)
 */
use axum::http::{HeaderMap, header};
use axum_extra::extract::cookie::CookieJar;

use crate::services::auth::TokenError;

/// Cookie the browser client carries the access token in.
pub const AUTH_COOKIE: &str = "jwt";

pub fn extract_token(headers: &HeaderMap) -> Result<String, TokenError> {
    let mut non_bearer_header = false;

    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value.to_str().map_err(|_| TokenError::InvalidScheme)?;
        match strip_bearer(value) {
            Some("") => return Err(TokenError::Missing),
            Some(token) => return Ok(token.to_string()),
            None => non_bearer_header = true,
        }
    }

    let jar = CookieJar::from_headers(headers);
    match jar.get(AUTH_COOKIE).map(|c| c.value().trim()) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ if non_bearer_header => Err(TokenError::InvalidScheme),
        _ => Err(TokenError::Missing),
    }
}

// The auth scheme is case-insensitive (RFC 7235 §2.1).
fn strip_bearer(value: &str) -> Option<&str> {
    let (scheme, rest) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| rest.trim())
}
