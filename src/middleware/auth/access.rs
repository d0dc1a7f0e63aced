//! access token 検証 → Principal を extensions に入れる
//!
//! - 公開パス (PublicPaths) は認証なしで通す。トークンがあっても見ない
//! - それ以外は Bearer (or jwt cookie) を TokenVerifier で検証する
//! - 失敗理由 (欠落 / 形式不正 / 期限切れ / 署名不一致) はログにだけ残し、
//!   応答は entry point の 401 に一本化する

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;

use crate::api::v1::extractors::Principal;
use crate::middleware::auth::bearer::extract_token;
use crate::middleware::auth::{AuthEntryPoint, PublicPaths};
use crate::services::auth::{TokenError, TokenVerifier};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(#[source] TokenError),
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        Self::AuthenticationFailed(e)
    }
}

/// Everything the gate needs per request. Immutable after construction.
#[derive(Clone)]
pub struct AccessGate {
    verifier: Arc<dyn TokenVerifier>,
    public_paths: PublicPaths,
    entry_point: Arc<dyn AuthEntryPoint>,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("public_paths", &self.public_paths)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        public_paths: PublicPaths,
        entry_point: Arc<dyn AuthEntryPoint>,
    ) -> Self {
        Self {
            verifier,
            public_paths,
            entry_point,
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.matches(path)
    }

    /// Extract and verify the request credential.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token = extract_token(headers)?;
        let verified = self.verifier.verify(&token)?;
        Ok(Principal::from(verified))
    }
}

/// Put the gate in front of every route of `router` (fallback included).
///
/// 例：
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.gate.clone());
/// app = app.nest("/api/v1.0", v1);
/// ```
pub fn apply<S>(router: Router<S>, gate: Arc<AccessGate>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(gate, access_middleware))
}

async fn access_middleware(
    State(gate): State<Arc<AccessGate>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if gate.is_public(req.uri().path()) {
        return next.run(req).await;
    }

    match gate.authenticate(req.headers()) {
        Ok(principal) => {
            tracing::debug!(
                user_id = %principal.user_id,
                jti = ?principal.token_id,
                path = %req.uri().path(),
                "authenticated"
            );
            // middleware → extractor への受け渡し
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(err) => {
            tracing::warn!(
                error = ?err,
                method = %req.method(),
                path = %req.uri().path(),
                "authentication failed"
            );
            gate.entry_point.commence(req.uri(), &err)
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json,
        http::{StatusCode, header},
        response::IntoResponse,
        routing::{get, post},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::auth::JsonEntryPoint;
    use crate::services::auth::JwtService;
    use crate::test_support::{TEST_SECRET, test_jwt};

    // Echoes whatever principal the gate attached (or null).
    async fn whoami(req: Request<Body>) -> impl IntoResponse {
        Json(req.extensions().get::<Principal>().map(|p| {
            serde_json::json!({ "user_id": p.user_id, "authorities": p.authorities })
        }))
    }

    fn router(entry_point: Arc<dyn AuthEntryPoint>) -> Router {
        let gate = Arc::new(AccessGate::new(
            Arc::new(test_jwt()),
            PublicPaths::default(),
            entry_point,
        ));
        let routes = Router::new()
            .route("/login", post(whoami))
            .route("/is-authenticated", get(whoami))
            .route("/profile", get(whoami));
        apply(routes, gate)
    }

    fn default_router() -> Router {
        router(Arc::new(JsonEntryPoint))
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    fn get_with(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn public_paths_pass_regardless_of_token() {
        let valid = test_jwt().issue("ada@example.com", &[]).unwrap().token;

        for auth in [None, Some("Bearer garbage".to_string()), Some(bearer(&valid))] {
            let (status, body) =
                send(default_router(), get_with("/is-authenticated", auth.as_deref())).await;
            assert_eq!(status, StatusCode::OK);
            // public paths never get a principal attached
            assert_eq!(body, serde_json::Value::Null);
        }

        let req = Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::AUTHORIZATION, "Bearer expired.or.bogus")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(default_router(), req).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_path_without_token_is_401() {
        let (status, body) = send(default_router(), get_with("/profile", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn malformed_expired_and_foreign_tokens_are_401() {
        let jwt = test_jwt();
        // test_jwt() tokens live for 600s with no leeway
        let long_ago = chrono::Utc::now().timestamp() - 600 - 3600;
        let expired = jwt.issue_at("ada@example.com", &[], long_ago).unwrap().token;
        let foreign = JwtService::new(b"ffffffffffffffffffffffffffffffff", None, 600, 0)
            .issue("ada@example.com", &[])
            .unwrap()
            .token;

        for auth in [
            "Bearer not-a-jwt".to_string(),
            "Basic dXNlcjpwYXNz".to_string(),
            bearer(&expired),
            bearer(&foreign),
        ] {
            let (status, body) = send(default_router(), get_with("/profile", Some(&auth))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{auth}");
            assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn valid_token_attaches_principal_from_claims() {
        let roles = vec!["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()];
        let token = test_jwt().issue("ada@example.com", &roles).unwrap().token;

        let (status, body) =
            send(default_router(), get_with("/profile", Some(&bearer(&token)))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "ada@example.com");
        assert_eq!(body["authorities"], serde_json::json!(["ROLE_USER", "ROLE_ADMIN"]));
    }

    #[tokio::test]
    async fn cookie_token_is_accepted() {
        let token = test_jwt().issue("ada@example.com", &[]).unwrap().token;
        let req = Request::builder()
            .uri("/profile")
            .header(header::COOKIE, format!("jwt={token}"))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(default_router(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "ada@example.com");
    }

    #[tokio::test]
    async fn unknown_routes_are_gated_too() {
        let (status, _) = send(default_router(), get_with("/nope", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    struct TeapotEntryPoint;

    impl AuthEntryPoint for TeapotEntryPoint {
        fn commence(&self, uri: &axum::http::Uri, _error: &AuthError) -> Response {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "authenticated": false, "path": uri.path() })),
            )
                .into_response()
        }
    }

    #[tokio::test]
    async fn custom_entry_point_renders_the_rejection() {
        let (status, body) = send(router(Arc::new(TeapotEntryPoint)), get_with("/profile", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["authenticated"], false);
        assert_eq!(body["path"], "/profile");
    }

    #[test]
    fn authenticate_reports_single_failure_kind() {
        let gate = AccessGate::new(
            Arc::new(JwtService::new(TEST_SECRET, None, 600, 0)),
            PublicPaths::default(),
            Arc::new(JsonEntryPoint),
        );
        let err = gate.authenticate(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailed(TokenError::Missing)));
    }
}
