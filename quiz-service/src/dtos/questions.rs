use crate::models::{AnswerSet, Question};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct VisibleQuestionsRequest {
    #[serde(default)]
    pub answers: AnswerSet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleQuestionsResponse {
    pub questions: Vec<&'static Question>,
    pub total_questions: usize,
}
