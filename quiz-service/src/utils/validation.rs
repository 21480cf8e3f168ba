use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use service_core::error::{AppError, ErrorResponse};
use validator::Validate;

/// JSON body that has passed its `Validate` rules.
///
/// Malformed bodies are rejected with 400 `{error, details}`; rule failures
/// go through [`AppError::ValidationError`].
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            let body = ErrorResponse {
                details: Some(e.body_text()),
                ..ErrorResponse::new("Invalid JSON body")
            };
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        })?;

        value
            .validate()
            .map_err(|e| AppError::ValidationError(e).into_response())?;

        Ok(ValidatedJson(value))
    }
}

/// Query string parsed into `T`, rejected as 400 `{error, details}` like a
/// malformed JSON body.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                let body = ErrorResponse {
                    details: Some(e.body_text()),
                    ..ErrorResponse::new("Invalid query parameters")
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            })?;
        Ok(QueryParams(value))
    }
}

/// Trims an optional string while deserializing so `Validate` rules see the
/// trimmed value. Blank strings become `None`.
pub fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Emails are compared case-insensitively everywhere.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
