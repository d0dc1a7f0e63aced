/*
 * Responsibility
 * - Handler から見える「認証済み主体」の型
 * - gate が検証して request extensions に格納し、handler はこの型だけを受け取る
 */
use crate::services::auth::VerifiedAccessToken;

/// Identity attached to a request that passed the gate.
///
/// - `user_id` is the token subject (the account email)
/// - `authorities` are the token's role strings, possibly empty
/// - `token_id` is the token `jti`, for log correlation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub authorities: Vec<String>,
    pub token_id: Option<String>,
}

impl From<VerifiedAccessToken> for Principal {
    fn from(v: VerifiedAccessToken) -> Self {
        Self {
            user_id: v.subject,
            authorities: v.roles,
            token_id: v.jti,
        }
    }
}
