use crate::dtos::responses::check_complete_answers;
use crate::dtos::{
    ListResponsesQuery, ListResponsesResponse, SubmitResponseRequest, SubmitResponseResponse,
    UpdateInsightRequest, UpdateWaitlistRequest, MISSING_FIELDS,
};
use crate::models::{NewQuizResponse, QuizResponse, UtmAttribution};
use crate::services::{eligibility, metrics, WebhookEvent};
use crate::startup::AppState;
use crate::utils::{normalize_email, QueryParams, ValidatedJson};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use tracing::{info, instrument, warn};
use uuid::Uuid;

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request("Invalid response id"))
}

/// Sends the automation event for an eligible respondent. Returns whether it
/// was delivered; never fails the caller.
async fn notify_automation(state: &AppState, response: &QuizResponse) -> bool {
    let mode = match state.store.get_cta_config().await {
        Ok(config) => config.mode,
        Err(e) => {
            warn!(error = %e, "Could not load CTA config; assuming waitlist mode");
            Default::default()
        }
    };

    let Some(tag) = eligibility::automation_tag(response.cta_type, mode) else {
        return false;
    };

    let event = WebhookEvent {
        email: response.email.clone(),
        result: response.result,
        has_chronic_pain: response.has_chronic_pain,
        medical_clearance: response.medical_clearance,
        waitlist_opted_in: response.waitlist_opted_in,
        tag: Some(tag.to_string()),
        utm_source: response.utm.source.clone(),
        utm_campaign: response.utm.campaign.clone(),
    };

    state.webhook.send(&event).await.success
}

/// `POST /responses`
///
/// Scores, classification and CTA type are recomputed from the answers.
/// Only the insert is authoritative: completion tracking and the webhook are
/// best effort.
#[instrument(skip_all)]
pub async fn submit_response(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SubmitResponseRequest>,
) -> Result<(StatusCode, Json<SubmitResponseResponse>), AppError> {
    let (Some(email), Some(answers)) = (payload.email, payload.answers) else {
        return Err(AppError::bad_request(MISSING_FIELDS));
    };
    check_complete_answers(&answers)?;

    let new_response = NewQuizResponse::from_answers(
        normalize_email(&email),
        answers,
        payload.free_text,
        UtmAttribution::new(payload.utm_source, payload.utm_campaign),
        payload.ai_insight.filter(|s| !s.trim().is_empty()),
    );

    let now = Utc::now();
    let stored = state.store.insert_response(&new_response, now).await?;
    metrics::record_response_stored(stored.result.as_str(), stored.cta_type.as_str());
    info!(
        response_id = %stored.id,
        result = %stored.result,
        total = stored.scores.total,
        "Quiz response submitted"
    );

    if let Some(session_id) = payload.session_id.filter(|s| !s.trim().is_empty()) {
        match state
            .store
            .mark_quiz_completed(&session_id, stored.id, now)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => warn!(session_id = %session_id, "No quiz start recorded for session"),
            Err(e) => warn!(error = %e, "Failed to mark quiz start completed"),
        }
    }

    let webhook_delivered = notify_automation(&state, &stored).await;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponseResponse {
            id: stored.id,
            result: stored.result,
            scores: stored.scores,
            cta_type: stored.cta_type,
            webhook_delivered,
        }),
    ))
}

/// `PATCH /responses/:id/waitlist`
///
/// Opting in re-sends the automation event so the contact picks up the
/// waitlist flag.
#[instrument(skip(state, payload))]
pub async fn update_waitlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateWaitlistRequest>,
) -> Result<Json<QuizResponse>, AppError> {
    let id = parse_id(&id)?;
    let opted_in = payload
        .opted_in
        .ok_or_else(|| AppError::bad_request(MISSING_FIELDS))?;

    let updated = state.store.set_waitlist_opt_in(id, opted_in).await?;
    info!(response_id = %id, opted_in, "Waitlist status updated");

    if opted_in {
        notify_automation(&state, &updated).await;
    }

    Ok(Json(updated))
}

/// `PATCH /responses/:id/insight`
#[instrument(skip(state, payload))]
pub async fn update_insight(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateInsightRequest>,
) -> Result<Json<QuizResponse>, AppError> {
    let id = parse_id(&id)?;
    let insight = payload
        .ai_insight
        .ok_or_else(|| AppError::bad_request(MISSING_FIELDS))?;

    let updated = state.store.set_ai_insight(id, &insight).await?;
    Ok(Json(updated))
}

/// `GET /responses` (admin)
#[instrument(skip_all)]
pub async fn list_responses(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListResponsesQuery>,
) -> Result<Json<ListResponsesResponse>, AppError> {
    let filter = query.into_filter()?;
    let responses = state.store.list_responses(&filter).await?;
    info!(count = responses.len(), "Listed quiz responses");

    Ok(Json(ListResponsesResponse {
        count: responses.len(),
        responses,
    }))
}
