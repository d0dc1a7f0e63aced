/*
 * Responsibility
 * - user-lookup service (email → UserRecord) の契約 (UserStore)
 * - プロセス内 HashMap による実装 (InMemoryUserStore)
 * - email は小文字化して一意キーにする
 */
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_account_verified: bool,

    pub verify_otp: Option<StoredOtp>,
    pub reset_otp: Option<StoredOtp>,

    pub created_at: DateTime<Utc>,
}

/// A one-time code waiting to be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub failed_attempts: u32,
}

impl StoredOtp {
    pub fn new(code: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            code,
            expires_at,
            failed_attempts: 0,
        }
    }
}

impl UserRecord {
    pub fn new(name: String, email: &str, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            name,
            email: normalize_email(email),
            password_hash,
            is_account_verified: false,
            verify_otp: None,
            reset_otp: None,
            created_at: now,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Lookup/persistence seam for accounts.
///
/// Implementations must treat `email` case-insensitively.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>>;

    /// Fails with `RepoError::Conflict` when the email is already registered.
    async fn insert(&self, user: UserRecord) -> RepoResult<UserRecord>;

    /// Runs `change` against the stored record while holding the store's
    /// write access, so concurrent callers observe each change whole.
    ///
    /// Whatever `change` leaves on the record is kept, even when it returns
    /// an error; the error is then passed through. Returns the record as stored.
    async fn modify(
        &self,
        email: &str,
        change: &(dyn for<'r> Fn(&'r mut UserRecord) -> RepoResult<()> + Send + Sync),
    ) -> RepoResult<UserRecord>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(&normalize_email(email)).cloned())
    }

    async fn insert(&self, user: UserRecord) -> RepoResult<UserRecord> {
        let mut users = self.users.write().await;
        let key = normalize_email(&user.email);
        if users.contains_key(&key) {
            return Err(RepoError::Conflict);
        }
        users.insert(key, user.clone());
        Ok(user)
    }

    async fn modify(
        &self,
        email: &str,
        change: &(dyn for<'r> Fn(&'r mut UserRecord) -> RepoResult<()> + Send + Sync),
    ) -> RepoResult<UserRecord> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&normalize_email(email))
            .ok_or(RepoError::NotFound)?;
        change(user)?;
        Ok(user.clone())
    }
}
