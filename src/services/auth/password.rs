//! Password hashing seam.
//!
//! bcrypt is CPU-bound; async callers go through [`hash_blocking`] /
//! [`verify_blocking`] so hashing never runs on a runtime worker.

use std::sync::Arc;

use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, raw: &str) -> Result<String, PasswordError>;

    /// A malformed stored hash counts as a mismatch.
    fn verify(&self, raw: &str, hash: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, raw: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(raw, self.cost)?)
    }

    fn verify(&self, raw: &str, hash: &str) -> bool {
        bcrypt::verify(raw, hash).unwrap_or(false)
    }
}

pub async fn hash_blocking(hasher: Arc<dyn PasswordHasher>, raw: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hasher.hash(&raw))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            AppError::Internal
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            AppError::Internal
        })
}

pub async fn verify_blocking(
    hasher: Arc<dyn PasswordHasher>,
    raw: String,
    hash: String,
) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || hasher.verify(&raw, &hash))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password verification task failed");
            AppError::Internal
        })
}
