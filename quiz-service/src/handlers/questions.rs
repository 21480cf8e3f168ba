use crate::dtos::{VisibleQuestionsRequest, VisibleQuestionsResponse};
use crate::models::{Question, QUESTIONS};
use crate::services::visibility;
use crate::utils::ValidatedJson;
use axum::Json;

/// `GET /questions`: the full catalog, conditional questions included.
pub async fn list_questions() -> Json<&'static [Question]> {
    Json(&QUESTIONS[..])
}

/// `POST /questions/visible`: questions that apply to the given answers.
pub async fn visible_questions(
    ValidatedJson(payload): ValidatedJson<VisibleQuestionsRequest>,
) -> Json<VisibleQuestionsResponse> {
    Json(VisibleQuestionsResponse {
        questions: visibility::visible_questions(&payload.answers),
        total_questions: visibility::total_question_count(&payload.answers),
    })
}
