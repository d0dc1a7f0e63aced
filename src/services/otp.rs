/*
 * Responsibility
 * - 6 桁 OTP の生成と照合
 * - OTP 配送の契約 (OtpSender)。メール送信は持たず、既定実装は tracing に出すだけ
 */
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::error::AppError;
use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_repo::StoredOtp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    VerifyEmail,
    ResetPassword,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerifyEmail => "verify_email",
            Self::ResetPassword => "reset_password",
        }
    }
}

#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, email: &str, purpose: OtpPurpose, otp: &str) -> Result<(), AppError>;
}

/// Delivers OTPs to the log. The code itself is only visible at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, email: &str, purpose: OtpPurpose, otp: &str) -> Result<(), AppError> {
        info!(email = %email, purpose = purpose.as_str(), "otp issued");
        debug!(email = %email, purpose = purpose.as_str(), otp = %otp, "otp value");
        Ok(())
    }
}

/// Six-digit code in `100000..=999999`.
pub fn generate_otp() -> Result<String, AppError> {
    let mut bytes = [0u8; 4];
    getrandom::fill(&mut bytes).map_err(|e| {
        tracing::error!(error = %e, "getrandom failed");
        AppError::Internal
    })?;
    let n = u32::from_le_bytes(bytes) % 900_000 + 100_000;
    Ok(n.to_string())
}

/// Misses allowed before a code is discarded.
pub const MAX_OTP_ATTEMPTS: u32 = 5;

/// Matches `presented` against the code in `slot`.
///
/// - a match empties the slot (single use)
/// - an expired code is dropped and reported as `OTP_EXPIRED`
/// - a miss counts against the code; after `MAX_OTP_ATTEMPTS` misses it is dropped
///
/// Meant to run inside `UserStore::modify` so the check and the slot update
/// land together.
pub fn consume_otp(
    slot: &mut Option<StoredOtp>,
    presented: &str,
    now: DateTime<Utc>,
) -> RepoResult<()> {
    let presented = presented.trim();
    let Some(stored) = slot.as_mut() else {
        return Err(invalid_otp());
    };

    if presented.is_empty() || stored.code != presented {
        stored.failed_attempts += 1;
        if stored.failed_attempts >= MAX_OTP_ATTEMPTS {
            *slot = None;
        }
        return Err(invalid_otp());
    }

    let expired = stored.expires_at <= now;
    *slot = None;
    if expired {
        return Err(RepoError::Rejected {
            code: "OTP_EXPIRED",
            message: "OTP expired",
        });
    }
    Ok(())
}

fn invalid_otp() -> RepoError {
    RepoError::Rejected {
        code: "INVALID_OTP",
        message: "Invalid OTP",
    }
}

/// `now + ttl_seconds`, or an internal error when that is not representable.
pub fn otp_expiry(now: DateTime<Utc>, ttl_seconds: i64) -> Result<DateTime<Utc>, AppError> {
    TimeDelta::try_seconds(ttl_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            tracing::error!(ttl_seconds, "otp expiry out of range");
            AppError::Internal
        })
}
