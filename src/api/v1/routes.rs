/*
 * Responsibility
 * - v1 の URL 構造を定義 (パスは API prefix からの相対)
 * - 公開 / 要認証の区別はここではなく認証ゲート (PublicPaths) が持つ
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::{is_authenticated, login, logout, register, reset_password, send_reset_otp},
    profile::{profile, send_verify_otp, verify_otp},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/is-authenticated", get(is_authenticated))
        .route("/send-reset-otp", post(send_reset_otp))
        .route("/reset-password", post(reset_password))
        .route("/profile", get(profile))
        .route("/send-otp", post(send_verify_otp))
        .route("/verify-otp", post(verify_otp))
}
