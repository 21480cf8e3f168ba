use crate::startup::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use subtle::ConstantTimeEq;

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Guards settings writes. Without a configured password every request is
/// refused.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.admin_password.as_ref() else {
        tracing::warn!("Admin request refused: no admin password configured");
        return AppError::Forbidden(anyhow::anyhow!("Admin access is not configured"))
            .into_response();
    };

    let provided = headers
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(password)
            if bool::from(
                password
                    .as_bytes()
                    .ct_eq(expected.expose_secret().as_bytes()),
            ) =>
        {
            next.run(request).await
        }
        _ => {
            tracing::warn!("Failed admin authentication attempt");
            AppError::Unauthorized(anyhow::anyhow!("Invalid or missing admin password"))
                .into_response()
        }
    }
}
