use crate::dtos::UpdateCtaConfigRequest;
use crate::models::CtaConfig;
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use axum::{extract::State, Json};
use service_core::error::AppError;
use tracing::{info, instrument};

/// `GET /settings/cta`
pub async fn get_cta_config(State(state): State<AppState>) -> Result<Json<CtaConfig>, AppError> {
    Ok(Json(state.store.get_cta_config().await?))
}

/// `PUT /settings/cta`, behind the admin guard.
#[instrument(skip_all)]
pub async fn update_cta_config(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateCtaConfigRequest>,
) -> Result<Json<CtaConfig>, AppError> {
    let config = payload.into_config()?;
    let stored = state.store.update_cta_config(&config).await?;
    info!(mode = ?stored.mode, "CTA settings changed");
    Ok(Json(stored))
}
