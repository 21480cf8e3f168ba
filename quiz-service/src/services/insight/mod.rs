//! Personalized result narrative generated by a language model.

pub mod parser;
pub mod prompt;

use crate::models::{AnswerSet, Classification, MedicalClearance, Scores};
use crate::services::metrics;
use crate::services::providers::{GenerationParams, ProviderError, TextProvider};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Message returned to clients whenever generation fails.
pub const UNAVAILABLE_MESSAGE: &str = "AI service unavailable";

pub const DEFAULT_MAX_TOKENS: u32 = 550;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Everything the prompt is built from.
#[derive(Debug, Clone)]
pub struct InsightContext {
    pub result: Classification,
    pub scores: Scores,
    pub answers: AnswerSet,
    pub has_pain: bool,
    pub medical_clearance: Option<MedicalClearance>,
    pub free_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub what_this_means: Option<String>,
    pub what_to_do: Option<String>,
    pub closing_message: Option<String>,
}

impl Insight {
    pub fn is_empty(&self) -> bool {
        self.what_this_means.is_none() && self.what_to_do.is_none() && self.closing_message.is_none()
    }
}

#[derive(Debug, Error)]
pub enum InsightError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("no JSON object in model reply")]
    NoJson,

    #[error("model reply has none of the expected fields")]
    MissingFields,
}

impl InsightError {
    fn kind(&self) -> &'static str {
        match self {
            InsightError::Provider(e) => e.kind(),
            InsightError::NoJson => "no_json",
            InsightError::MissingFields => "missing_fields",
        }
    }
}

/// Body of a `/generate-insight` reply. `error` is only present on failure,
/// in which case every text field is null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub what_this_means: Option<String>,
    pub what_to_do: Option<String>,
    pub closing_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InsightReport {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            what_this_means: None,
            what_to_do: None,
            closing_message: None,
            error: Some(message.into()),
        }
    }
}

impl From<Insight> for InsightReport {
    fn from(insight: Insight) -> Self {
        Self {
            what_this_means: insight.what_this_means,
            what_to_do: insight.what_to_do,
            closing_message: insight.closing_message,
            error: None,
        }
    }
}

#[derive(Clone)]
pub struct InsightGenerator {
    provider: Arc<dyn TextProvider>,
    params: GenerationParams,
}

impl InsightGenerator {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self::with_params(provider, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE)
    }

    pub fn with_params(provider: Arc<dyn TextProvider>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            provider,
            params: GenerationParams {
                temperature: Some(temperature),
                max_tokens: Some(max_tokens),
                system: Some(prompt::SYSTEM_PROMPT.to_string()),
            },
        }
    }

    #[instrument(skip(self, ctx), fields(provider = self.provider.name(), result = %ctx.result))]
    pub async fn try_generate(&self, ctx: &InsightContext) -> Result<Insight, InsightError> {
        let message = prompt::build_user_message(ctx);

        let start = Instant::now();
        let response = self.provider.generate(&message, &self.params).await;
        metrics::record_provider_latency(self.provider.name(), start.elapsed().as_secs_f64());

        let response = response?;
        info!(
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            finish_reason = ?response.finish_reason,
            "Insight reply received"
        );

        parser::parse_insight(&response.text)
    }

    /// Never fails: errors collapse into [`InsightReport::failure`].
    pub async fn generate_or_fallback(&self, ctx: &InsightContext) -> InsightReport {
        match self.try_generate(ctx).await {
            Ok(insight) => {
                metrics::record_insight("success");
                insight.into()
            }
            Err(e) => {
                warn!(error = %e, "Insight generation failed");
                metrics::record_insight(e.kind());
                InsightReport::failure(UNAVAILABLE_MESSAGE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerValue;
    use crate::services::providers::mock::MockTextProvider;

    fn context() -> InsightContext {
        InsightContext {
            result: Classification::NotSensitized,
            scores: Scores {
                trigger: 3,
                recovery: 3,
                baseline: 3,
                total: 9,
            },
            answers: (1..=9)
                .map(|i| (format!("q{}", i), AnswerValue::Scale(1)))
                .collect(),
            has_pain: false,
            medical_clearance: None,
            free_text: Some("Tried everything for my back.".to_string()),
        }
    }

    #[tokio::test]
    async fn parses_reply_embedded_in_prose() {
        let provider = Arc::new(MockTextProvider::new());
        provider
            .push_reply(Ok(r#"Sure! {"whatThisMeans":"A","whatToDo":"B","closingMessage":"C"} Done."#.to_string()))
            .await;
        let generator = InsightGenerator::new(provider.clone());

        let report = generator.generate_or_fallback(&context()).await;

        assert_eq!(report.what_this_means.as_deref(), Some("A"));
        assert_eq!(report.closing_message.as_deref(), Some("C"));
        assert_eq!(report.error, None);

        let prompts = provider.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Tried everything for my back."));
    }

    #[tokio::test]
    async fn timeout_yields_uniform_failure() {
        let generator = InsightGenerator::new(Arc::new(MockTextProvider::failing(
            ProviderError::Timeout,
        )));

        let report = generator.generate_or_fallback(&context()).await;

        assert_eq!(report, InsightReport::failure(UNAVAILABLE_MESSAGE));
    }

    #[tokio::test]
    async fn unparseable_reply_is_a_failure() {
        let generator = InsightGenerator::new(Arc::new(MockTextProvider::with_fallback(Ok(
            "Plain text, no JSON at all.".to_string(),
        ))));

        assert!(matches!(
            generator.try_generate(&context()).await,
            Err(InsightError::NoJson)
        ));
        assert_eq!(
            generator.generate_or_fallback(&context()).await.error.as_deref(),
            Some(UNAVAILABLE_MESSAGE)
        );
    }

    #[test]
    fn failure_serializes_with_null_fields() {
        let json = serde_json::to_value(InsightReport::failure(UNAVAILABLE_MESSAGE)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "whatThisMeans": null,
                "whatToDo": null,
                "closingMessage": null,
                "error": UNAVAILABLE_MESSAGE
            })
        );
    }
}
