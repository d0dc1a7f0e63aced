/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::middleware::auth::AccessGate;
use crate::services::account::AccountService;
use crate::services::auth::{AuthenticationManager, JwtService};

#[derive(Clone, Debug)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub jwt: Arc<JwtService>,
    pub authn: AuthenticationManager,
    pub accounts: AccountService,
    // Production cookies are cross-site: `SameSite=None; Secure`
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        gate: Arc<AccessGate>,
        jwt: Arc<JwtService>,
        authn: AuthenticationManager,
        accounts: AccountService,
        secure_cookies: bool,
    ) -> Self {
        Self {
            gate,
            jwt,
            authn,
            accounts,
            secure_cookies,
        }
    }
}
