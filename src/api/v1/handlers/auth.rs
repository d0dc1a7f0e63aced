/*
 * Responsibility
 * - 公開パス側の handler (register / login / logout / is-authenticated / reset)
 * - login は access token を body と jwt cookie の両方で返す
 */
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{AppendHeaders, IntoResponse},
};
use tracing::info;

use crate::{
    api::v1::dto::{
        auth::{
            EmailQuery, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
            ResetPasswordRequest,
        },
        profile::ProfileResponse,
    },
    api::v1::extractors::{ValidatedJson, ValidatedQuery},
    error::AppError,
    middleware::auth::bearer::AUTH_COOKIE,
    state::AppState,
};

/// Roles granted to every signed-in account.
const DEFAULT_ROLES: &[&str] = &["ROLE_USER"];

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), AppError> {
    let user = state
        .accounts
        .register(&req.name, &req.email, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.authn.authenticate(&req.email, &req.password).await?;

    let roles: Vec<String> = DEFAULT_ROLES.iter().map(|r| r.to_string()).collect();
    let issued = state.jwt.issue(&user.email, &roles)?;
    let cookie = auth_cookie(&issued.token, issued.expires_in, state.secure_cookies)?;

    info!(user_id = %user.user_id, "login succeeded");

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(LoginResponse {
            email: user.email,
            token: issued.token,
        }),
    ))
}

pub async fn logout(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let cookie = auth_cookie("", 0, state.secure_cookies)?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(MessageResponse {
            message: "Logged out successfully!",
        }),
    ))
}

/// Public path, so the gate attached nothing; check the credential here
/// and answer with a plain boolean instead of a 401.
pub async fn is_authenticated(State(state): State<AppState>, headers: HeaderMap) -> Json<bool> {
    Json(state.gate.authenticate(&headers).is_ok())
}

pub async fn send_reset_otp(
    State(state): State<AppState>,
    ValidatedQuery(q): ValidatedQuery<EmailQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.send_reset_otp(&q.email).await?;
    Ok(Json(MessageResponse {
        message: "Password reset OTP sent",
    }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .accounts
        .reset_password(&req.email, &req.otp, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully",
    }))
}

// Max-Age=0 deletes the cookie on the client.
fn auth_cookie(token: &str, max_age: u64, secure: bool) -> Result<HeaderValue, AppError> {
    let attrs = if secure {
        "SameSite=None; Secure"
    } else {
        "SameSite=Lax"
    };
    let raw = format!("{AUTH_COOKIE}={token}; HttpOnly; Path=/; Max-Age={max_age}; {attrs}");

    HeaderValue::from_str(&raw).map_err(|e| {
        tracing::error!(error = %e, "failed to build auth cookie");
        AppError::Internal
    })
}
