mod common;

use axum::http::StatusCode;
use common::{calm_answers, submission, TestApp, WEBHOOK_PATH};
use quiz_service::models::{CtaConfig, CtaMode};
use quiz_service::services::QuizStore;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn submission_is_scored_on_the_server() {
    let app = TestApp::spawn().await;
    let mut body = submission("  Person@Example.com ");
    // Client-side scores are ignored.
    body["scores"] = json!({ "trigger": 12, "recovery": 12, "baseline": 12, "total": 36 });
    body["result"] = json!("not_sensitized");

    let (status, reply) = app.post_json("/responses", &body).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["result"], "sensitized");
    assert_eq!(
        reply["scores"],
        json!({ "trigger": 3, "recovery": 3, "baseline": 9, "total": 15 })
    );
    assert_eq!(reply["ctaType"], "eligible");

    let stored = app.store.responses().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].email, "person@example.com");
    assert!(stored[0].has_chronic_pain);
    assert_eq!(stored[0].utm.source.as_deref(), Some("instagram"));
    assert!(stored[0].is_consistent());
}

#[tokio::test]
async fn eligible_submission_triggers_tagged_webhook() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .and(body_partial_json(json!({
            "email": "person@example.com",
            "result": "sensitized",
            "has_chronic_pain": true,
            "medical_clearance": "yes_confident",
            "waitlist_opted_in": false,
            "tag": "waitlist-ready",
            "utm_source": "instagram",
            "utm_campaign": "spring"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.webhook_server)
        .await;

    let (status, reply) = app
        .post_json("/responses", &submission("person@example.com"))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["webhookDelivered"], true);
}

#[tokio::test]
async fn live_mode_uses_program_tag() {
    let app = TestApp::spawn().await;
    app.store
        .update_cta_config(&CtaConfig {
            mode: CtaMode::Live,
            button_url: Some("https://example.com/join".to_string()),
        })
        .await
        .unwrap();
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "tag": "program-joined" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.webhook_server)
        .await;

    let (status, _) = app
        .post_json("/responses", &submission("person@example.com"))
        .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn webhook_failure_does_not_fail_submission() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.webhook_server)
        .await;

    let (status, reply) = app
        .post_json("/responses", &submission("person@example.com"))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["webhookDelivered"], false);
    assert_eq!(app.store.responses().await.len(), 1);
}

#[tokio::test]
async fn incomplete_answers_are_rejected() {
    let app = TestApp::spawn().await;
    let mut body = submission("person@example.com");
    body["answers"] = json!({ "q1": 2, "q2": 2 });

    let (status, reply) = app.post_json("/responses", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["error"], "Missing required fields");
    assert!(app.store.responses().await.is_empty());
}

#[tokio::test]
async fn out_of_range_answer_is_rejected() {
    let app = TestApp::spawn().await;
    let mut body = submission("person@example.com");
    body["answers"]["q4"] = json!(7);

    let (status, _) = app.post_json("/responses", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_outage_is_retryable() {
    let app = TestApp::spawn().await;
    app.store.set_unavailable(true);

    let (status, reply) = app
        .post_json("/responses", &submission("person@example.com"))
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reply["retryable"], true);
}

#[tokio::test]
async fn submission_completes_its_quiz_start() {
    let app = TestApp::spawn().await;
    let (status, _) = app
        .post_json("/quiz-starts", &json!({ "sessionId": "session-42" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let mut body = submission("person@example.com");
    body["sessionId"] = json!("session-42");
    let (status, reply) = app.post_json("/responses", &body).await;
    assert_eq!(status, StatusCode::CREATED);

    let start = app.store.quiz_start("session-42").await.unwrap();
    assert!(start.completed);
    assert_eq!(
        start.response_id.map(|id| id.to_string()),
        reply["id"].as_str().map(str::to_string)
    );
}

#[tokio::test]
async fn unknown_session_does_not_fail_submission() {
    let app = TestApp::spawn().await;
    let mut body = submission("person@example.com");
    body["sessionId"] = json!("never-started");

    let (status, _) = app.post_json("/responses", &body).await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn waitlist_opt_in_updates_row_and_notifies() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "waitlist_opted_in": true })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .with_priority(1)
        .mount(&app.webhook_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.webhook_server)
        .await;

    let mut body = submission("person@example.com");
    body["answers"] = calm_answers();
    let (_, created) = app.post_json("/responses", &body).await;
    let id = created["id"].as_str().unwrap();

    let (status, reply) = app
        .send_json(
            "PATCH",
            &format!("/responses/{}/waitlist", id),
            &json!({ "optedIn": true }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["waitlistOptedIn"], true);
    assert_eq!(reply["result"], "not_sensitized");
    assert!(app.store.responses().await[0].waitlist_opted_in);
}

#[tokio::test]
async fn waitlist_for_unknown_response_is_not_found() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .send_json(
            "PATCH",
            "/responses/6f1c2a4e-8d3b-4c55-9a0e-2b7f1d9c3e10/waitlist",
            &json!({ "optedIn": true }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_response_id_is_bad_request() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .send_json(
            "PATCH",
            "/responses/not-a-uuid/insight",
            &json!({ "aiInsight": "text" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn insight_can_be_attached_after_submission() {
    let app = TestApp::spawn().await;
    let (_, created) = app
        .post_json("/responses", &submission("person@example.com"))
        .await;
    let id = created["id"].as_str().unwrap();

    let (status, reply) = app
        .send_json(
            "PATCH",
            &format!("/responses/{}/insight", id),
            &json!({ "aiInsight": "{\"whatThisMeans\":\"A\"}" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["aiInsight"], "{\"whatThisMeans\":\"A\"}");
}
