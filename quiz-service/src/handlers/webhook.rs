use crate::dtos::{WebhookRequest, WebhookResponse};
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{extract::State, Json};
use service_core::error::AppError;
use tracing::instrument;

/// `POST /webhook`
///
/// Delivery failures answer 200 `{success: false}`; only malformed input is
/// an error.
#[instrument(skip_all)]
pub async fn send_webhook(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<WebhookRequest>,
) -> Result<Json<WebhookResponse>, AppError> {
    let event = payload.into_event()?;
    let outcome = state.webhook.send(&event).await;
    Ok(Json(outcome.into()))
}
