use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::error::AppError;

/// Reasons a presented credential was not accepted.
///
/// Callers on the request path collapse all of these into a single
/// authentication failure; the variants exist for logging only.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no bearer token in request")]
    Missing,
    #[error("authorization header is not a bearer credential")]
    InvalidScheme,
    #[error("token expired")]
    Expired,
    #[error("empty 'sub' claim")]
    EmptySubject,
    #[error("jwt verification failed: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid(e),
        }
    }
}

/// Access token (JWT) claims as they travel on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

/// Verified token content handed to the request layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAccessToken {
    pub subject: String,
    pub roles: Vec<String>,
    pub jti: Option<String>,
}

/// Token-verification seam used by the authentication gate.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<VerifiedAccessToken, TokenError>;
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// HS256 access-token issuer and verifier sharing one secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
    ttl_seconds: u64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(secret: &[u8], issuer: Option<String>, ttl_seconds: u64, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(iss) = issuer.as_deref() {
            validation.set_issuer(&[iss]);
        }

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer,
            ttl_seconds,
        }
    }

    /// Issue an access token for `subject` valid from now.
    pub fn issue(&self, subject: &str, roles: &[String]) -> Result<IssuedToken, AppError> {
        self.issue_at(subject, roles, chrono::Utc::now().timestamp())
    }

    /// Issue an access token as if the current time were `now` (unix seconds).
    pub fn issue_at(
        &self,
        subject: &str,
        roles: &[String],
        now: i64,
    ) -> Result<IssuedToken, AppError> {
        let exp = i64::try_from(self.ttl_seconds)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| {
                error!(ttl_seconds = self.ttl_seconds, "token expiry out of range");
                AppError::Internal
            })?;

        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            exp,
            iat: now,
            iss: self.issuer.clone(),
            jti: Some(Uuid::new_v4().to_string()),
            roles: roles.to_vec(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            AppError::Internal
        })?;

        Ok(IssuedToken {
            token,
            expires_in: self.ttl_seconds,
        })
    }
}

impl TokenVerifier for JwtService {
    /// `jsonwebtoken::Validation` checks signature, `exp` (with leeway) and `iss`
    /// when configured; this additionally rejects a blank subject.
    fn verify(&self, token: &str) -> Result<VerifiedAccessToken, TokenError> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::EmptySubject);
        }

        Ok(VerifiedAccessToken {
            subject: claims.sub,
            roles: claims.roles,
            jti: claims.jti,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn service(issuer: Option<&str>) -> JwtService {
        JwtService::new(SECRET, issuer.map(str::to_string), 600, 60)
    }

    #[test]
    fn issued_token_verifies_with_claims() {
        let jwt = service(Some("authify"));
        let roles = vec!["ROLE_USER".to_string()];
        let issued = jwt.issue("ada@example.com", &roles).unwrap();

        let verified = jwt.verify(&issued.token).unwrap();
        assert_eq!(verified.subject, "ada@example.com");
        assert_eq!(verified.roles, roles);
        assert!(verified.jti.is_some());
        assert_eq!(issued.expires_in, 600);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let jwt = service(None);
        let long_ago = chrono::Utc::now().timestamp() - 600 - 60 - 120;
        let issued = jwt.issue_at("ada@example.com", &[], long_ago).unwrap();

        assert!(matches!(jwt.verify(&issued.token), Err(TokenError::Expired)));
    }

    #[test]
    fn expiry_within_leeway_is_accepted() {
        let jwt = service(None);
        let slightly_late = chrono::Utc::now().timestamp() - 600 - 30;
        let issued = jwt.issue_at("ada@example.com", &[], slightly_late).unwrap();

        assert!(jwt.verify(&issued.token).is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = JwtService::new(b"ffffffffffffffffffffffffffffffff", None, 600, 60);
        let issued = other.issue("ada@example.com", &[]).unwrap();

        assert!(matches!(
            service(None).verify(&issued.token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn issuer_mismatch_is_invalid() {
        let issued = service(Some("someone-else")).issue("ada@example.com", &[]).unwrap();

        assert!(matches!(
            service(Some("authify")).verify(&issued.token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            service(None).verify("not.a.jwt"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn blank_subject_is_rejected() {
        let jwt = service(None);
        let issued = jwt.issue("  ", &[]).unwrap();

        assert!(matches!(jwt.verify(&issued.token), Err(TokenError::EmptySubject)));
    }

    #[test]
    fn unrepresentable_expiry_is_an_error_not_a_wrap() {
        let jwt = JwtService::new(SECRET, None, u64::MAX, 0);
        assert!(matches!(
            jwt.issue("ada@example.com", &[]),
            Err(AppError::Internal)
        ));

        let jwt = JwtService::new(SECRET, None, 600, 0);
        assert!(jwt.issue_at("ada@example.com", &[], i64::MAX - 10).is_err());
    }
}
