use crate::dtos::{QuizStartRequest, QuizStartResponse, MISSING_FIELDS};
use crate::models::UtmAttribution;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use service_core::error::AppError;
use tracing::instrument;

/// `POST /quiz-starts`: records an attempt for abandonment analysis.
#[instrument(skip_all)]
pub async fn create_quiz_start(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<QuizStartRequest>,
) -> Result<(StatusCode, Json<QuizStartResponse>), AppError> {
    let session_id = payload
        .session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request(MISSING_FIELDS))?;
    let utm = UtmAttribution::new(payload.utm_source, payload.utm_campaign);

    let start = state
        .store
        .insert_quiz_start(&session_id, &utm, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(QuizStartResponse {
            id: start.id,
            session_id: start.session_id,
        }),
    ))
}
