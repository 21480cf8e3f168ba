use super::MISSING_FIELDS;
use crate::models::{AnswerSet, AnswerValue, Classification, MedicalClearance, Scores};
use crate::services::insight::InsightContext;
use crate::services::scoring;
use crate::utils::{normalize_email, trimmed};
use serde::Deserialize;
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInsightRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(required, email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(required)]
    pub result: Option<String>,

    #[validate(required)]
    pub scores: Option<Scores>,

    #[validate(required)]
    pub answers: Option<AnswerSet>,

    #[serde(default)]
    pub has_pain: bool,

    pub medical_clearance: Option<MedicalClearance>,

    pub free_text: Option<String>,
}

impl GenerateInsightRequest {
    /// Normalized email plus the prompt context. Rejects classifications
    /// and scores that disagree with the submitted answers.
    pub fn into_context(self) -> Result<(String, InsightContext), AppError> {
        let (Some(email), Some(result), Some(scores), Some(answers)) =
            (self.email, self.result, self.scores, self.answers)
        else {
            return Err(AppError::bad_request(MISSING_FIELDS));
        };

        let result: Classification = result
            .parse()
            .map_err(|_| AppError::bad_request("result must be sensitized or not_sensitized"))?;

        for (question_id, value) in answers.iter() {
            if let AnswerValue::Scale(v) = value {
                if !(1..=4).contains(v) {
                    return Err(AppError::bad_request(format!(
                        "Answer for {} must be between 1 and 4",
                        question_id
                    )));
                }
            }
        }

        if !scores.is_consistent() || scoring::calculate_scores(&answers) != scores {
            return Err(AppError::bad_request("Scores do not match answers"));
        }
        if scoring::determine_result(&scores) != result {
            return Err(AppError::bad_request("Result does not match scores"));
        }

        let context = InsightContext {
            result,
            scores,
            answers,
            has_pain: self.has_pain,
            medical_clearance: self.medical_clearance.filter(|_| self.has_pain),
            free_text: self.free_text,
        };

        Ok((normalize_email(&email), context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(result: &str, total: u16) -> serde_json::Value {
        json!({
            "email": " Someone@Example.com ",
            "result": result,
            "scores": { "trigger": 12, "recovery": 12, "baseline": 12, "total": total },
            "answers": {
                "q1": 4, "q2": 4, "q3": 4, "q4": 4, "q5": 4,
                "q6": 4, "q7": 4, "q8": 4, "q9": 4
            },
            "hasPain": false,
            "medicalClearance": "not_evaluated",
            "freeText": "hello"
        })
    }

    #[test]
    fn accepts_consistent_submission() {
        let request: GenerateInsightRequest =
            serde_json::from_value(body("sensitized", 36)).unwrap();
        request.validate().unwrap();

        let (email, ctx) = request.into_context().unwrap();

        assert_eq!(email, "someone@example.com");
        assert_eq!(ctx.result, Classification::Sensitized);
        assert_eq!(ctx.medical_clearance, None);
    }

    #[test]
    fn rejects_mismatched_result_and_scores() {
        let request: GenerateInsightRequest =
            serde_json::from_value(body("not_sensitized", 36)).unwrap();
        assert!(matches!(request.into_context(), Err(AppError::BadRequest(_))));

        let request: GenerateInsightRequest =
            serde_json::from_value(body("sensitized", 30)).unwrap();
        assert!(matches!(request.into_context(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn missing_answers_fails_required_rule() {
        let request: GenerateInsightRequest = serde_json::from_value(json!({
            "email": "a@example.com",
            "result": "sensitized",
            "scores": { "trigger": 1, "recovery": 1, "baseline": 1, "total": 3 }
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("answers"));
    }
}
