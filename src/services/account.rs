/*
 * Responsibility
 * - アカウント操作 (登録 / プロフィール / メール確認 OTP / パスワードリセット OTP)
 * - handler は DTO の検証だけを行い、状態遷移はここに閉じ込める
 */
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::AppError;
use crate::repos::error::RepoResult;
use crate::repos::user_repo::{StoredOtp, UserRecord, UserStore};
use crate::services::auth::password::{PasswordHasher, hash_blocking};
use crate::services::otp::{OtpPurpose, OtpSender, consume_otp, generate_otp, otp_expiry};

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    passwords: Arc<dyn PasswordHasher>,
    otp_sender: Arc<dyn OtpSender>,
    reset_otp_ttl_seconds: i64,
    verify_otp_ttl_seconds: i64,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("reset_otp_ttl_seconds", &self.reset_otp_ttl_seconds)
            .field("verify_otp_ttl_seconds", &self.verify_otp_ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        passwords: Arc<dyn PasswordHasher>,
        otp_sender: Arc<dyn OtpSender>,
        reset_otp_ttl_seconds: i64,
        verify_otp_ttl_seconds: i64,
    ) -> Self {
        Self {
            users,
            passwords,
            otp_sender,
            reset_otp_ttl_seconds,
            verify_otp_ttl_seconds,
        }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, AppError> {
        let hash = hash_blocking(self.passwords.clone(), password.to_string()).await?;
        let user = UserRecord::new(name.trim().to_string(), email, hash, Utc::now());

        let user = self.users.insert(user).await?;
        info!(user_id = %user.user_id, "account registered");
        Ok(user)
    }

    pub async fn profile(&self, email: &str) -> Result<UserRecord, AppError> {
        self.find(email).await
    }

    pub async fn send_reset_otp(&self, email: &str) -> Result<(), AppError> {
        let otp = generate_otp()?;
        let expires_at = otp_expiry(Utc::now(), self.reset_otp_ttl_seconds)?;

        let user = self
            .users
            .modify(email, &|user: &mut UserRecord| -> RepoResult<()> {
                user.reset_otp = Some(StoredOtp::new(otp.clone(), expires_at));
                Ok(())
            })
            .await?;

        self.otp_sender
            .send(&user.email, OtpPurpose::ResetPassword, &otp)
            .await
    }

    /// The OTP is consumed before the new password is hashed, so a code can
    /// back at most one reset even when requests race.
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        self.users
            .modify(email, &|user: &mut UserRecord| -> RepoResult<()> {
                consume_otp(&mut user.reset_otp, otp, now)
            })
            .await?;

        let hash = hash_blocking(self.passwords.clone(), new_password.to_string()).await?;
        let user = self
            .users
            .modify(email, &|user: &mut UserRecord| -> RepoResult<()> {
                user.password_hash = hash.clone();
                Ok(())
            })
            .await?;

        info!(user_id = %user.user_id, "password reset");
        Ok(())
    }

    pub async fn send_verify_otp(&self, email: &str) -> Result<(), AppError> {
        let user = self.find(email).await?;
        if user.is_account_verified {
            debug!(user_id = %user.user_id, "account already verified; no otp sent");
            return Ok(());
        }

        let otp = generate_otp()?;
        let expires_at = otp_expiry(Utc::now(), self.verify_otp_ttl_seconds)?;
        let user = self
            .users
            .modify(email, &|user: &mut UserRecord| -> RepoResult<()> {
                user.verify_otp = Some(StoredOtp::new(otp.clone(), expires_at));
                Ok(())
            })
            .await?;

        self.otp_sender
            .send(&user.email, OtpPurpose::VerifyEmail, &otp)
            .await
    }

    pub async fn verify_email(&self, email: &str, otp: &str) -> Result<UserRecord, AppError> {
        let now = Utc::now();
        let user = self
            .users
            .modify(email, &|user: &mut UserRecord| -> RepoResult<()> {
                consume_otp(&mut user.verify_otp, otp, now)?;
                user.is_account_verified = true;
                Ok(())
            })
            .await?;

        info!(user_id = %user.user_id, "account verified");
        Ok(user)
    }

    async fn find(&self, email: &str) -> Result<UserRecord, AppError> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or(AppError::not_found("user"))
    }
}
