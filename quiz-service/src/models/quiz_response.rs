//! Completed quiz responses.

use super::{AnswerSet, Classification, CtaType, MedicalClearance, Scores, UtmAttribution};
use crate::services::{eligibility, scoring};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A response ready to be persisted. Scores, classification and CTA type are
/// always computed here from the answers, never taken from the client.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuizResponse {
    pub email: String,
    pub answers: AnswerSet,
    pub scores: Scores,
    pub result: Classification,
    pub has_chronic_pain: bool,
    pub medical_clearance: Option<MedicalClearance>,
    pub free_text: Option<String>,
    pub cta_type: CtaType,
    pub ai_insight: Option<String>,
    pub utm: UtmAttribution,
}

impl NewQuizResponse {
    pub fn from_answers(
        email: String,
        answers: AnswerSet,
        free_text: Option<String>,
        utm: UtmAttribution,
        ai_insight: Option<String>,
    ) -> Self {
        let scores = scoring::calculate_scores(&answers);
        let result = scoring::determine_result(&scores);
        let has_chronic_pain = answers.has_chronic_pain();
        let medical_clearance = answers.medical_clearance();
        let cta_type = eligibility::cta_type(has_chronic_pain, medical_clearance);

        Self {
            email,
            answers,
            scores,
            result,
            has_chronic_pain,
            medical_clearance,
            free_text: free_text
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            cta_type,
            ai_insight,
            utm,
        }
    }

    pub fn into_response(self, id: Uuid, created_at: DateTime<Utc>) -> QuizResponse {
        QuizResponse {
            id,
            email: self.email,
            result: self.result,
            scores: self.scores,
            answers: self.answers,
            has_chronic_pain: self.has_chronic_pain,
            medical_clearance: self.medical_clearance,
            free_text: self.free_text,
            cta_type: self.cta_type,
            waitlist_opted_in: false,
            ai_insight: self.ai_insight,
            utm: self.utm,
            created_at,
        }
    }
}

/// A persisted response row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub id: Uuid,
    pub email: String,
    pub result: Classification,
    pub scores: Scores,
    pub answers: AnswerSet,
    pub has_chronic_pain: bool,
    pub medical_clearance: Option<MedicalClearance>,
    pub free_text: Option<String>,
    pub cta_type: CtaType,
    pub waitlist_opted_in: bool,
    pub ai_insight: Option<String>,
    pub utm: UtmAttribution,
    pub created_at: DateTime<Utc>,
}

impl QuizResponse {
    /// The stored classification must be the one its stored scores produce.
    pub fn is_consistent(&self) -> bool {
        self.scores.is_consistent() && scoring::determine_result(&self.scores) == self.result
    }
}

/// Equality filters applied when listing responses. Unset fields match
/// everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseFilter {
    pub result: Option<Classification>,
    pub has_chronic_pain: Option<bool>,
    pub medical_clearance: Option<MedicalClearance>,
    pub cta_type: Option<CtaType>,
    pub waitlist_opted_in: Option<bool>,
    /// Case-insensitive substring of the stored email.
    pub email_contains: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
}

impl ResponseFilter {
    pub fn matches(&self, response: &QuizResponse) -> bool {
        fn eq<T: PartialEq>(wanted: &Option<T>, actual: &T) -> bool {
            wanted.as_ref().map_or(true, |w| w == actual)
        }

        eq(&self.result, &response.result)
            && eq(&self.has_chronic_pain, &response.has_chronic_pain)
            && self
                .medical_clearance
                .map_or(true, |c| response.medical_clearance == Some(c))
            && eq(&self.cta_type, &response.cta_type)
            && eq(&self.waitlist_opted_in, &response.waitlist_opted_in)
            && self.email_contains.as_deref().map_or(true, |needle| {
                response
                    .email
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            })
            && self.created_from.map_or(true, |from| response.created_at >= from)
            && self.created_to.map_or(true, |to| response.created_at <= to)
    }
}
