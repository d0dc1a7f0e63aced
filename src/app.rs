/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config 読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用順: CORS (最外) → http (request id / trace / limit / timeout) → 認証ゲート
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware::{
    self,
    auth::{AccessGate, JsonEntryPoint, PublicPaths},
    http::HttpLimits,
};
use crate::repos::user_repo::{InMemoryUserStore, UserStore};
use crate::services::account::AccountService;
use crate::services::auth::{
    AuthenticationManager,
    factory::{build_jwt_service, build_password_hasher},
};
use crate::services::otp::{LogOtpSender, OtpSender};
use crate::state::AppState;

/// Mount point of the versioned API; public paths are relative to it.
pub const API_PREFIX: &str = "/api/v1.0";

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,authify_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so the panic is noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(
        &config,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(LogOtpSender),
    );
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

/// Wire process-level services into the shared state.
pub fn build_state(
    config: &Config,
    users: Arc<dyn UserStore>,
    otp_sender: Arc<dyn OtpSender>,
) -> AppState {
    let jwt = build_jwt_service(config);
    let passwords = build_password_hasher(config);

    let gate = Arc::new(AccessGate::new(
        jwt.clone(),
        PublicPaths::default(),
        Arc::new(JsonEntryPoint),
    ));
    let authn = AuthenticationManager::new(users.clone(), passwords.clone());
    let accounts = AccountService::new(
        users,
        passwords,
        otp_sender,
        config.reset_otp_ttl_seconds,
        config.verify_otp_ttl_seconds,
    );

    AppState::new(gate, jwt, authn, accounts, config.app_env.is_production())
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let v1 = middleware::auth::access::apply(api::v1::routes(), state.gate.clone());

    let router = Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, v1)
        .with_state(state);

    let router = middleware::http::apply(
        router,
        HttpLimits {
            body_limit_bytes: config.request_body_limit_bytes,
            timeout: config.request_timeout,
        },
    );

    middleware::cors::apply(router, &config.cors_allowed_origins)
}
