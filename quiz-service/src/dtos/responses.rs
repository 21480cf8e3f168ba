use super::MISSING_FIELDS;
use crate::models::answers::{CLEARANCE_QUESTION, PAIN_QUESTION};
use crate::models::{
    AnswerSet, AnswerValue, Classification, CtaType, MedicalClearance, QuizResponse,
    ResponseFilter, Scores,
};
use chrono::{DateTime, Utc};
use crate::services::scoring::{BASELINE_QUESTIONS, RECOVERY_QUESTIONS, TRIGGER_QUESTIONS};
use crate::utils::trimmed;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(required, email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(required)]
    pub answers: Option<AnswerSet>,

    #[validate(length(max = 5000, message = "Free text is too long"))]
    pub free_text: Option<String>,

    pub utm_source: Option<String>,

    pub utm_campaign: Option<String>,

    /// Links the response to its `quiz_starts` row.
    pub session_id: Option<String>,

    pub ai_insight: Option<String>,
}

/// Checks the shape of a full submission: every scored question answered
/// 1-4, the pain question answered yes/no and, when present, a clearance
/// choice for q11.
pub fn check_complete_answers(answers: &AnswerSet) -> Result<(), AppError> {
    for question_id in TRIGGER_QUESTIONS
        .iter()
        .chain(RECOVERY_QUESTIONS.iter())
        .chain(BASELINE_QUESTIONS.iter())
    {
        match answers.get(question_id) {
            None => return Err(AppError::bad_request(MISSING_FIELDS)),
            Some(AnswerValue::Scale(v)) if (1..=4).contains(v) => {}
            Some(_) => {
                return Err(AppError::bad_request(format!(
                    "Answer for {} must be between 1 and 4",
                    question_id
                )))
            }
        }
    }

    match answers.get(PAIN_QUESTION) {
        None => return Err(AppError::bad_request(MISSING_FIELDS)),
        Some(AnswerValue::YesNo(_)) => {}
        Some(_) => {
            return Err(AppError::bad_request(format!(
                "Answer for {} must be true or false",
                PAIN_QUESTION
            )))
        }
    }

    match answers.get(CLEARANCE_QUESTION) {
        None | Some(AnswerValue::Clearance(_)) => Ok(()),
        Some(_) => Err(AppError::bad_request(format!(
            "Answer for {} is not a recognised option",
            CLEARANCE_QUESTION
        ))),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseResponse {
    pub id: Uuid,
    pub result: Classification,
    pub scores: Scores,
    pub cta_type: CtaType,
    pub webhook_delivered: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWaitlistRequest {
    #[validate(required)]
    pub opted_in: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInsightRequest {
    #[validate(required, length(min = 1, max = 20000))]
    pub ai_insight: Option<String>,
}

/// Query params for `GET /responses`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponsesQuery {
    pub result: Option<Classification>,
    pub has_chronic_pain: Option<bool>,
    pub medical_clearance: Option<MedicalClearance>,
    pub cta_type: Option<CtaType>,
    pub waitlist_opted_in: Option<bool>,
    pub email: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ListResponsesQuery {
    pub fn into_filter(self) -> Result<ResponseFilter, AppError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::bad_request("startDate must not be after endDate"));
            }
        }

        Ok(ResponseFilter {
            result: self.result,
            has_chronic_pain: self.has_chronic_pain,
            medical_clearance: self.medical_clearance,
            cta_type: self.cta_type,
            waitlist_opted_in: self.waitlist_opted_in,
            email_contains: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            created_from: self.start_date,
            created_to: self.end_date,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponsesResponse {
    pub responses: Vec<QuizResponse>,
    pub count: usize,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizStartRequest {
    #[validate(required, length(min = 1, max = 128))]
    pub session_id: Option<String>,

    pub utm_source: Option<String>,

    pub utm_campaign: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStartResponse {
    pub id: Uuid,
    pub session_id: String,
}
