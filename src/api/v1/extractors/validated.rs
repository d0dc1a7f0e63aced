//! Body / query extractors that reject with the application's JSON error
//! body instead of axum's plain-text rejections.
//!
//! Deserialization failures and `validator` rule violations both answer
//! 400 `INVALID_REQUEST`.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

use crate::error::AppError;

/// `Json<T>` followed by `T::validate()`.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection, "request body rejected");
                AppError::bad_request("INVALID_REQUEST", rejection.body_text())
            })?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// `Query<T>` followed by `T::validate()`.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection, "query rejected");
                AppError::bad_request("INVALID_REQUEST", rejection.body_text())
            })?;
        value.validate()?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::StatusCode, routing::post};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Greeting {
        #[validate(length(min = 2))]
        name: String,
    }

    async fn greet(ValidatedJson(g): ValidatedJson<Greeting>) -> String {
        g.name
    }

    async fn send(body: &str, content_type: Option<&str>) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route("/greet", post(greet));
        let mut builder = axum::http::Request::builder().method("POST").uri("/greet");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let res = app
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn valid_body_reaches_handler() {
        let (status, _) = send(r#"{"name":"Ada"}"#, Some("application/json")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn every_rejection_uses_the_json_error_body() {
        for (body, content_type) in [
            (r#"{}"#, Some("application/json")),
            (r#"{"name":"#, Some("application/json")),
            (r#"{"name":"Ada"}"#, None),
            (r#"{"name":"A"}"#, Some("application/json")),
        ] {
            let (status, json) = send(body, content_type).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json["error"]["code"], "INVALID_REQUEST", "{body}");
        }
    }
}
