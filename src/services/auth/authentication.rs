use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::AppError;
use crate::repos::user_repo::{UserRecord, UserStore};
use crate::services::auth::{
    PasswordHasher,
    password::{hash_blocking, verify_blocking},
};

/// Checks email + password against the user store.
///
/// Unknown email and wrong password produce the same error, and both pay
/// for one hash verification, so neither the body nor the timing tells
/// which accounts exist.
#[derive(Clone)]
pub struct AuthenticationManager {
    users: Arc<dyn UserStore>,
    passwords: Arc<dyn PasswordHasher>,
    // Hash verified against when the email is unknown; built on first use
    // with the hasher's own cost.
    decoy_hash: Arc<OnceCell<String>>,
}

impl std::fmt::Debug for AuthenticationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationManager").finish_non_exhaustive()
    }
}

impl AuthenticationManager {
    pub fn new(users: Arc<dyn UserStore>, passwords: Arc<dyn PasswordHasher>) -> Self {
        Self {
            users,
            passwords,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserRecord, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            debug!("login for unknown email");
            let decoy = self
                .decoy_hash
                .get_or_try_init(|| {
                    hash_blocking(self.passwords.clone(), "decoy-password".to_string())
                })
                .await?;
            verify_blocking(self.passwords.clone(), password.to_string(), decoy.clone()).await?;
            return Err(bad_credentials());
        };

        let matches = verify_blocking(
            self.passwords.clone(),
            password.to_string(),
            user.password_hash.clone(),
        )
        .await?;

        if !matches {
            debug!(user_id = %user.user_id, "password mismatch");
            return Err(bad_credentials());
        }

        Ok(user)
    }
}

fn bad_credentials() -> AppError {
    AppError::bad_request("BAD_CREDENTIALS", "Email or password is incorrect")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::repos::user_repo::InMemoryUserStore;
    use crate::services::auth::password::BcryptHasher;

    async fn manager_with_user() -> AuthenticationManager {
        let hasher = BcryptHasher::new(4);
        let store = InMemoryUserStore::new();
        let hash = hasher.hash("s3cret!").unwrap();
        store
            .insert(UserRecord::new("Ada".into(), "ada@example.com", hash, Utc::now()))
            .await
            .unwrap();

        AuthenticationManager::new(Arc::new(store), Arc::new(hasher))
    }

    fn code(err: AppError) -> &'static str {
        match err {
            AppError::BadRequest { code, .. } => code,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn correct_password_authenticates() {
        let user = manager_with_user()
            .await
            .authenticate("ADA@example.com", "s3cret!")
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let manager = manager_with_user().await;

        let wrong = manager.authenticate("ada@example.com", "nope").await.unwrap_err();
        let unknown = manager.authenticate("bob@example.com", "s3cret!").await.unwrap_err();

        assert_eq!(code(wrong), "BAD_CREDENTIALS");
        assert_eq!(code(unknown), "BAD_CREDENTIALS");
    }

    // Counts verifications so the unknown-email path can be observed.
    struct CountingHasher {
        inner: BcryptHasher,
        verifications: std::sync::atomic::AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, raw: &str) -> Result<String, crate::services::auth::password::PasswordError> {
            self.inner.hash(raw)
        }

        fn verify(&self, raw: &str, hash: &str) -> bool {
            self.verifications
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.inner.verify(raw, hash)
        }
    }

    #[tokio::test]
    async fn unknown_email_still_verifies_a_hash() {
        let hasher = Arc::new(CountingHasher {
            inner: BcryptHasher::new(4),
            verifications: Default::default(),
        });
        let manager = AuthenticationManager::new(Arc::new(InMemoryUserStore::new()), hasher.clone());

        for _ in 0..2 {
            let err = manager.authenticate("bob@example.com", "s3cret!").await.unwrap_err();
            assert_eq!(code(err), "BAD_CREDENTIALS");
        }
        assert_eq!(
            hasher.verifications.load(std::sync::atomic::Ordering::SeqCst),
            2
        );
    }
}
