/*
 * Responsibility
 * - 認証系 (register / login / reset) の request/response DTO
 * - 形式チェックは validator の derive に寄せる (存在確認などは service 側)
 */
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "not_blank", message = "name is required"))]
    pub name: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub email: String,
    pub token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailQuery {
    #[validate(email(message = "email is invalid"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(custom(function = "not_blank", message = "otp is required"))]
    pub otp: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
