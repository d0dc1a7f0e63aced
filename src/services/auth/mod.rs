pub mod authentication;
pub mod factory;
pub mod jwt;
pub mod password;

pub use authentication::AuthenticationManager;
pub use jwt::{JwtService, TokenError, TokenVerifier, VerifiedAccessToken};
pub use password::{BcryptHasher, PasswordHasher};
