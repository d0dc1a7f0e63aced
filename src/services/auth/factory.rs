// Factory: build auth collaborators from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{BcryptHasher, JwtService};

pub fn build_jwt_service(config: &Config) -> Arc<JwtService> {
    Arc::new(JwtService::new(
        config.jwt_secret.as_bytes(),
        config.jwt_issuer.clone(),
        config.access_token_ttl_seconds,
        config.access_token_leeway_seconds,
    ))
}

pub fn build_password_hasher(config: &Config) -> Arc<BcryptHasher> {
    Arc::new(BcryptHasher::new(config.bcrypt_cost))
}
