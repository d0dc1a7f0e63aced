/*
 * Responsibility
 * - プロフィール / メール確認 OTP の DTO
 * - wire 上は camelCase (ブラウザクライアントに合わせる)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::repos::user_repo::UserRecord;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub is_account_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for ProfileResponse {
    fn from(u: UserRecord) -> Self {
        Self {
            user_id: u.user_id,
            name: u.name,
            email: u.email,
            is_account_verified: u.is_account_verified,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, message = "otp is required"))]
    pub otp: String,
}
