use crate::models::{CtaConfig, CtaMode};
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCtaConfigRequest {
    #[validate(required)]
    pub mode: Option<CtaMode>,

    #[validate(url(message = "buttonUrl must be a valid URL"))]
    pub button_url: Option<String>,
}

impl UpdateCtaConfigRequest {
    /// Live mode needs somewhere to send people.
    pub fn into_config(self) -> Result<CtaConfig, AppError> {
        let mode = self.mode.unwrap_or_default();
        let button_url = self
            .button_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        if mode == CtaMode::Live && button_url.is_none() {
            return Err(AppError::bad_request("buttonUrl is required in live mode"));
        }

        Ok(CtaConfig { mode, button_url })
    }
}
