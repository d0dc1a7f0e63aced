//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crate::app::{build_router, build_state};
use crate::config::Config;
use crate::error::AppError;
use crate::repos::user_repo::{InMemoryUserStore, UserStore};
use crate::services::account::AccountService;
use crate::services::auth::{BcryptHasher, JwtService};
use crate::services::otp::{OtpPurpose, OtpSender};

pub const TEST_SECRET: &[u8] = b"test-secret-test-secret-test-secret!";

pub fn test_config() -> Config {
    let env: HashMap<&str, String> = HashMap::from([
        ("JWT_SECRET", String::from_utf8_lossy(TEST_SECRET).into_owned()),
        ("BCRYPT_COST", "4".to_string()),
    ]);
    match Config::from_lookup(|key| env.get(key).cloned()) {
        Ok(config) => config,
        Err(e) => panic!("test config rejected: {e}"),
    }
}

pub fn test_jwt() -> JwtService {
    JwtService::new(TEST_SECRET, None, 600, 0)
}

/// Captures OTPs instead of delivering them.
#[derive(Debug, Default)]
pub struct RecordingOtpSender {
    sent: Mutex<Vec<(String, OtpPurpose, String)>>,
}

impl RecordingOtpSender {
    pub fn last_for(&self, email: &str, purpose: OtpPurpose) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, p, _)| e == email && *p == purpose)
            .map(|(_, _, otp)| otp.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl OtpSender for RecordingOtpSender {
    async fn send(&self, email: &str, purpose: OtpPurpose, otp: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), purpose, otp.to_string()));
        Ok(())
    }
}

pub fn test_account_service() -> (AccountService, Arc<dyn UserStore>, Arc<RecordingOtpSender>) {
    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let otps = Arc::new(RecordingOtpSender::default());
    let accounts = AccountService::new(
        users.clone(),
        Arc::new(BcryptHasher::new(4)),
        otps.clone(),
        900,
        86_400,
    );
    (accounts, users, otps)
}

/// Full router (CORS, http layers, gate) over an empty in-memory store.
pub fn test_app() -> (Router, Arc<RecordingOtpSender>) {
    let config = test_config();
    let otps = Arc::new(RecordingOtpSender::default());
    let state = build_state(&config, Arc::new(InMemoryUserStore::new()), otps.clone());
    (build_router(state, &config), otps)
}
