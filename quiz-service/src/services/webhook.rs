//! Marketing automation webhook.
//!
//! One POST per event, no retry. Delivery failures are reported in the
//! returned [`WebhookOutcome`] and never surface as errors.

use crate::models::{Classification, MedicalClearance};
use crate::services::metrics;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

pub const URL_NOT_CONFIGURED: &str = "Webhook URL not configured";

/// Data describing one completed quiz, as the dispatcher receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub email: String,
    pub result: Classification,
    pub has_chronic_pain: bool,
    pub medical_clearance: Option<MedicalClearance>,
    pub waitlist_opted_in: bool,
    pub tag: Option<String>,
    pub utm_source: Option<String>,
    pub utm_campaign: Option<String>,
}

/// Wire body sent to the automation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload<'a> {
    pub email: &'a str,
    pub result: Classification,
    pub has_chronic_pain: bool,
    pub medical_clearance: Option<MedicalClearance>,
    pub waitlist_opted_in: bool,
    pub tag: Option<&'a str>,
    pub utm_source: Option<&'a str>,
    pub utm_campaign: Option<&'a str>,
    pub timestamp: String,
}

impl<'a> WebhookPayload<'a> {
    pub fn new(event: &'a WebhookEvent, at: DateTime<Utc>) -> Self {
        Self {
            email: &event.email,
            result: event.result,
            has_chronic_pain: event.has_chronic_pain,
            medical_clearance: event.medical_clearance,
            waitlist_opted_in: event.waitlist_opted_in,
            tag: event.tag.as_deref(),
            utm_source: event.utm_source.as_deref(),
            utm_campaign: event.utm_campaign.as_deref(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookOutcome {
    fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Clone)]
pub struct WebhookDispatcher {
    client: Client,
    url: Option<String>,
}

impl WebhookDispatcher {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let url = url.filter(|u| !u.trim().is_empty());

        if url.is_none() {
            warn!("Webhook URL not configured; automation events will not be delivered");
        }

        Ok(Self { client, url })
    }

    #[instrument(skip(self, event), fields(result = %event.result, tag = ?event.tag))]
    pub async fn send(&self, event: &WebhookEvent) -> WebhookOutcome {
        let Some(url) = self.url.as_deref() else {
            error!("{}", URL_NOT_CONFIGURED);
            metrics::record_webhook("not_configured");
            return WebhookOutcome::failed(URL_NOT_CONFIGURED);
        };

        let payload = WebhookPayload::new(event, Utc::now());

        let outcome = match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => WebhookOutcome::delivered(),
            Ok(response) => {
                WebhookOutcome::failed(format!("Webhook failed with status {}", response.status().as_u16()))
            }
            Err(e) => WebhookOutcome::failed(e.to_string()),
        };

        match &outcome.error {
            None => {
                info!("Webhook delivered");
                metrics::record_webhook("delivered");
            }
            Some(e) => {
                error!(error = %e, "Webhook delivery failed");
                metrics::record_webhook("failed");
            }
        }

        outcome
    }
}
