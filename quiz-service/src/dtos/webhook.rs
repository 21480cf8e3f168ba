use super::MISSING_FIELDS;
use crate::models::{Classification, MedicalClearance};
use crate::services::webhook::{WebhookEvent, WebhookOutcome};
use crate::utils::{normalize_email, trimmed};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(required, email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(required)]
    pub result: Option<String>,

    #[serde(default)]
    pub has_pain: bool,

    pub medical_clearance: Option<MedicalClearance>,

    pub waitlist_opted_in: Option<bool>,

    pub tag: Option<String>,

    pub utm_source: Option<String>,

    pub utm_campaign: Option<String>,
}

impl WebhookRequest {
    pub fn into_event(self) -> Result<WebhookEvent, AppError> {
        let (Some(email), Some(result)) = (self.email, self.result) else {
            return Err(AppError::bad_request(MISSING_FIELDS));
        };

        let result: Classification = result
            .parse()
            .map_err(|_| AppError::bad_request("result must be sensitized or not_sensitized"))?;

        Ok(WebhookEvent {
            email: normalize_email(&email),
            result,
            has_chronic_pain: self.has_pain,
            medical_clearance: self.medical_clearance,
            waitlist_opted_in: self.waitlist_opted_in.unwrap_or(false),
            tag: self.tag,
            utm_source: self.utm_source,
            utm_campaign: self.utm_campaign,
        })
    }
}

/// Client-facing summary of a dispatch; upstream error text is only logged.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl From<WebhookOutcome> for WebhookResponse {
    fn from(outcome: WebhookOutcome) -> Self {
        Self {
            success: outcome.success,
            error: (!outcome.success).then_some("Webhook failed"),
        }
    }
}
