//! Shared setup for quiz-service integration tests.
//!
//! Every test gets an in-memory store, a scripted text provider and a
//! wiremock server standing in for the automation webhook.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request as HttpRequest, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use quiz_service::config::CorsConfig;
use quiz_service::services::providers::mock::MockTextProvider;
use quiz_service::services::{
    InsightGenerator, MemoryQuizStore, RateLimitPolicy, RateLimiter, WebhookDispatcher,
};
use quiz_service::{build_router, AppState};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::MockServer;

pub const TEST_ADMIN_PASSWORD: &str = "test-admin-password";
pub const WEBHOOK_PATH: &str = "/automation";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryQuizStore>,
    pub provider: Arc<MockTextProvider>,
    pub webhook_server: MockServer,
}

pub struct TestAppBuilder {
    provider: MockTextProvider,
    admin_password: Option<String>,
    webhook_configured: bool,
}

impl TestAppBuilder {
    pub fn provider(mut self, provider: MockTextProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn without_admin_password(mut self) -> Self {
        self.admin_password = None;
        self
    }

    pub fn without_webhook_url(mut self) -> Self {
        self.webhook_configured = false;
        self
    }

    pub async fn build(self) -> TestApp {
        let store = Arc::new(MemoryQuizStore::new());
        let provider = Arc::new(self.provider);
        let webhook_server = MockServer::start().await;

        let webhook_url = self
            .webhook_configured
            .then(|| format!("{}{}", webhook_server.uri(), WEBHOOK_PATH));

        let state = AppState {
            store: store.clone(),
            limiter: RateLimiter::new(store.clone(), RateLimitPolicy::default()),
            insights: InsightGenerator::new(provider.clone()),
            webhook: WebhookDispatcher::new(webhook_url, Duration::from_secs(5))
                .expect("webhook client"),
            admin_password: self.admin_password.map(Secret::new),
        };

        let router = build_router(
            state,
            &CorsConfig {
                allowed_origin: "*".to_string(),
            },
        );

        TestApp {
            router,
            store,
            provider,
            webhook_server,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            provider: MockTextProvider::new(),
            admin_password: Some(TEST_ADMIN_PASSWORD.to_string()),
            webhook_configured: true,
        }
    }

    pub async fn spawn() -> TestApp {
        Self::builder().build().await
    }

    pub async fn request(&self, request: HttpRequest<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(
            HttpRequest::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send_json_from(method, uri, body, "203.0.113.7").await
    }

    /// Sends `body` as if from `ip`, via `x-forwarded-for`.
    pub async fn send_json_from(
        &self,
        method: &str,
        uri: &str,
        body: &Value,
        ip: &str,
    ) -> (StatusCode, Value) {
        self.request(
            HttpRequest::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .header("x-forwarded-for", ip)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send_json("POST", uri, body).await
    }
}

/// All-ones answers: scores 3/3/3, total 9, not sensitized.
pub fn calm_answers() -> Value {
    json!({
        "q1": 1, "q2": 1, "q3": 1,
        "q4": 1, "q5": 1, "q6": 1,
        "q7": 1, "q8": 1, "q9": 1,
        "q10": false
    })
}

/// Baseline 9 trips the baseline threshold despite a low total.
pub fn sensitized_answers() -> Value {
    json!({
        "q1": 1, "q2": 1, "q3": 1,
        "q4": 1, "q5": 1, "q6": 1,
        "q7": 3, "q8": 3, "q9": 3,
        "q10": true,
        "q11": "yes_confident"
    })
}

pub fn insight_request(email: &str) -> Value {
    json!({
        "email": email,
        "result": "not_sensitized",
        "scores": { "trigger": 3, "recovery": 3, "baseline": 3, "total": 9 },
        "answers": calm_answers(),
        "hasPain": false,
        "freeText": "My shoulders are always tense."
    })
}

pub fn submission(email: &str) -> Value {
    json!({
        "email": email,
        "answers": sensitized_answers(),
        "freeText": "Can't switch off at night.",
        "utmSource": "instagram",
        "utmCampaign": "spring"
    })
}
