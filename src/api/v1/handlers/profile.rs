/*
 * Responsibility
 * - 認証済み主体向け handler (profile / send-otp / verify-otp)
 * - 主体は AuthPrincipal extractor からのみ受け取る
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::{
            auth::MessageResponse,
            profile::{ProfileResponse, VerifyOtpRequest},
        },
        extractors::{AuthPrincipal, ValidatedJson},
    },
    error::AppError,
    state::AppState,
};

pub async fn profile(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state.accounts.profile(&principal.user_id).await?;
    Ok(Json(user.into()))
}

pub async fn send_verify_otp(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<MessageResponse>, AppError> {
    state.accounts.send_verify_otp(&principal.user_id).await?;
    Ok(Json(MessageResponse {
        message: "Verification OTP sent",
    }))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    ValidatedJson(req): ValidatedJson<VerifyOtpRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state
        .accounts
        .verify_email(&principal.user_id, &req.otp)
        .await?;
    Ok(Json(user.into()))
}
