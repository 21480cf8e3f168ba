mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn catalog_lists_every_question() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/questions").await;

    assert_eq!(status, StatusCode::OK);
    let questions = body.as_array().unwrap();
    assert_eq!(questions.len(), 11);
    assert_eq!(questions[0]["id"], "q1");
    assert_eq!(questions[10]["id"], "q11");
}

#[tokio::test]
async fn clearance_question_follows_pain_answer() {
    let app = TestApp::spawn().await;

    let (status, body) = app.post_json("/questions/visible", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalQuestions"], 10);

    let (_, body) = app
        .post_json("/questions/visible", &json!({ "answers": { "q10": true } }))
        .await;
    assert_eq!(body["totalQuestions"], 11);

    let (_, body) = app
        .post_json(
            "/questions/visible",
            &json!({ "answers": { "q10": false, "q11": "not_evaluated" } }),
        )
        .await;
    assert_eq!(body["totalQuestions"], 10);
}
