use crate::dtos::GenerateInsightRequest;
use crate::middleware::ClientIp;
use crate::services::InsightReport;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{extract::State, Json};
use service_core::error::AppError;
use tracing::{info, instrument};

/// `POST /generate-insight`
///
/// Rate limited by email and client IP. Provider failures still answer 200
/// with null text fields so the client can fall back to static copy.
#[instrument(skip_all, fields(client_ip = %client_ip.0))]
pub async fn generate_insight(
    State(state): State<AppState>,
    client_ip: ClientIp,
    ValidatedJson(payload): ValidatedJson<GenerateInsightRequest>,
) -> Result<Json<InsightReport>, AppError> {
    let (email, context) = payload.into_context()?;

    let decision = state.limiter.check(&email, &client_ip.0).await;
    if !decision.allowed {
        info!(kind = ?decision.kind, "Insight request rate limited");
        return Err(AppError::TooManyRequests {
            message: decision.reason.unwrap_or("Too many requests").to_string(),
            kind: decision.kind.map(|k| k.as_str().to_string()),
        });
    }

    Ok(Json(state.insights.generate_or_fallback(&context).await))
}
