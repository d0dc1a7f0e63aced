/*
 * Responsibility
 * - 環境変数の読み込み (PORT, CORS 許可, JWT secret, OTP TTL など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - from_lookup() は env に触らないのでテストから直接呼べる
 */
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Origins the browser client is served from when `CORS_ALLOWED_ORIGINS` is unset.
pub const DEFAULT_CORS_ALLOWED_ORIGINS: &str =
    "http://localhost:5173,https://authify-frontend-m3im.onrender.com";

// HS256 key must be at least as long as the hash output.
const MIN_JWT_SECRET_BYTES: usize = 32;

// Upper bound for every lifetime setting (one year).
const MAX_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;
const MAX_LEEWAY_SECONDS: u64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub access_token_ttl_seconds: u64,
    pub access_token_leeway_seconds: u64,

    pub bcrypt_cost: u32,
    pub reset_otp_ttl_seconds: i64,
    pub verify_otp_ttl_seconds: i64,

    pub request_body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the signing secret
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&lookup, "PORT", 8080)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let jwt_issuer = lookup("JWT_ISSUER")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let access_token_ttl_seconds: u64 =
            parse_or(&lookup, "ACCESS_TOKEN_TTL_SECONDS", 36_000)?; // 10h
        let access_token_leeway_seconds: u64 =
            parse_or(&lookup, "ACCESS_TOKEN_LEEWAY_SECONDS", 60)?;
        if !(1..=MAX_TTL_SECONDS as u64).contains(&access_token_ttl_seconds) {
            return Err(ConfigError::Invalid("ACCESS_TOKEN_TTL_SECONDS"));
        }
        if access_token_leeway_seconds > MAX_LEEWAY_SECONDS {
            return Err(ConfigError::Invalid("ACCESS_TOKEN_LEEWAY_SECONDS"));
        }

        let bcrypt_cost: u32 = parse_or(&lookup, "BCRYPT_COST", 10)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid("BCRYPT_COST"));
        }

        let reset_otp_ttl_seconds: i64 = parse_or(&lookup, "RESET_OTP_TTL_SECONDS", 900)?; // 15 min
        let verify_otp_ttl_seconds: i64 =
            parse_or(&lookup, "VERIFY_OTP_TTL_SECONDS", 86_400)?; // 24h
        if !(1..=MAX_TTL_SECONDS).contains(&reset_otp_ttl_seconds) {
            return Err(ConfigError::Invalid("RESET_OTP_TTL_SECONDS"));
        }
        if !(1..=MAX_TTL_SECONDS).contains(&verify_otp_ttl_seconds) {
            return Err(ConfigError::Invalid("VERIFY_OTP_TTL_SECONDS"));
        }

        let request_body_limit_bytes: usize =
            parse_or(&lookup, "REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let request_timeout =
            Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            jwt_issuer,
            access_token_ttl_seconds,
            access_token_leeway_seconds,
            bcrypt_cost,
            reset_otp_ttl_seconds,
            verify_otp_ttl_seconds,
            request_body_limit_bytes,
            request_timeout,
        })
    }
}

// Unset keys fall back to `default`; a present but unparsable value is a startup error.
fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
