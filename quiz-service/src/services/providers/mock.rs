//! Scripted provider for tests and local runs without an API key.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Replays queued replies in order. Once the queue is empty every call
/// returns `fallback`.
pub struct MockTextProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
    fallback: Result<String, ProviderError>,
}

impl MockTextProvider {
    pub fn new() -> Self {
        Self::with_fallback(Ok(r#"{"whatThisMeans":"Mock insight.","whatToDo":"Mock guidance.","closingMessage":"Mock closing."}"#.to_string()))
    }

    pub fn with_fallback(fallback: Result<String, ProviderError>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            fallback,
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::with_fallback(Err(error))
    }

    pub async fn push_reply(&self, reply: Result<String, ProviderError>) {
        self.replies.lock().await.push_back(reply);
    }

    /// Prompts received so far, oldest first.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.prompts.lock().await.push(prompt.to_string());

        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let text = reply?;
        Ok(ProviderResponse {
            output_tokens: (text.len() / 4) as u32,
            input_tokens: (prompt.len() / 4) as u32,
            text,
            finish_reason: FinishReason::Complete,
        })
    }
}
