mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn root_reports_service_identity() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "quiz-service");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn health_follows_store_availability() {
    let app = TestApp::spawn().await;

    let (status, _) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);

    app.store.set_unavailable(true);
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let app = TestApp::spawn().await;

    let (status, _) = app.get("/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
