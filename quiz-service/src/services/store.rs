//! Persistence boundary for quiz data.
//!
//! Handlers and the rate limiter only see [`QuizStore`]. PostgreSQL backs it in
//! production; [`MemoryQuizStore`] backs tests and local runs without a
//! database.

use crate::models::{
    CtaConfig, NewQuizResponse, QuizResponse, QuizStart, ResponseFilter, UtmAttribution,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            StoreError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            other => AppError::DatabaseError(anyhow::Error::new(other)),
        }
    }
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Responses stored for `email` at or after `since`.
    async fn count_responses_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    /// Recorded attempts from `ip` at or after `since`.
    async fn count_ip_attempts_since(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError>;

    async fn record_ip_attempt(&self, ip: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Drops IP attempts, for every address, recorded before `before`.
    /// Returns how many were removed.
    async fn prune_ip_attempts(&self, before: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn insert_response(
        &self,
        response: &NewQuizResponse,
        created_at: DateTime<Utc>,
    ) -> Result<QuizResponse, StoreError>;

    async fn set_waitlist_opt_in(
        &self,
        id: Uuid,
        opted_in: bool,
    ) -> Result<QuizResponse, StoreError>;

    async fn set_ai_insight(&self, id: Uuid, insight: &str) -> Result<QuizResponse, StoreError>;

    /// Responses matching `filter`, newest first.
    async fn list_responses(
        &self,
        filter: &ResponseFilter,
    ) -> Result<Vec<QuizResponse>, StoreError>;

    async fn insert_quiz_start(
        &self,
        session_id: &str,
        utm: &UtmAttribution,
        started_at: DateTime<Utc>,
    ) -> Result<QuizStart, StoreError>;

    /// Returns `None` when no start was recorded for the session.
    async fn mark_quiz_completed(
        &self,
        session_id: &str,
        response_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<QuizStart>, StoreError>;

    async fn get_cta_config(&self) -> Result<CtaConfig, StoreError>;

    async fn update_cta_config(&self, config: &CtaConfig) -> Result<CtaConfig, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    responses: Vec<QuizResponse>,
    ip_attempts: Vec<(String, DateTime<Utc>)>,
    quiz_starts: Vec<QuizStart>,
    cta_config: CtaConfig,
}

/// In-process store. Can be switched into an unavailable mode where every
/// call fails, to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryQuizStore {
    state: RwLock<MemoryState>,
    unavailable: AtomicBool,
}

impl MemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    pub async fn ip_attempts(&self, ip: &str) -> usize {
        self.state
            .read()
            .await
            .ip_attempts
            .iter()
            .filter(|(addr, _)| addr == ip)
            .count()
    }

    pub async fn total_ip_attempts(&self) -> usize {
        self.state.read().await.ip_attempts.len()
    }

    pub async fn responses(&self) -> Vec<QuizResponse> {
        self.state.read().await.responses.clone()
    }

    pub async fn quiz_start(&self, session_id: &str) -> Option<QuizStart> {
        self.state
            .read()
            .await
            .quiz_starts
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
    }
}

#[async_trait]
impl QuizStore for MemoryQuizStore {
    async fn count_responses_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state
            .responses
            .iter()
            .filter(|r| r.email == email && r.created_at >= since)
            .count() as i64)
    }

    async fn count_ip_attempts_since(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state
            .ip_attempts
            .iter()
            .filter(|(addr, at)| addr == ip && *at >= since)
            .count() as i64)
    }

    async fn record_ip_attempt(&self, ip: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.state
            .write()
            .await
            .ip_attempts
            .push((ip.to_string(), at));
        Ok(())
    }

    async fn prune_ip_attempts(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        let len = state.ip_attempts.len();
        state.ip_attempts.retain(|(_, at)| *at >= before);
        Ok((len - state.ip_attempts.len()) as u64)
    }

    async fn insert_response(
        &self,
        response: &NewQuizResponse,
        created_at: DateTime<Utc>,
    ) -> Result<QuizResponse, StoreError> {
        self.ensure_available()?;
        let row = response.clone().into_response(Uuid::new_v4(), created_at);
        self.state.write().await.responses.push(row.clone());
        Ok(row)
    }

    async fn set_waitlist_opt_in(
        &self,
        id: Uuid,
        opted_in: bool,
    ) -> Result<QuizResponse, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        let row = state
            .responses
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("response {}", id)))?;
        row.waitlist_opted_in = opted_in;
        Ok(row.clone())
    }

    async fn set_ai_insight(&self, id: Uuid, insight: &str) -> Result<QuizResponse, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        let row = state
            .responses
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("response {}", id)))?;
        row.ai_insight = Some(insight.to_string());
        Ok(row.clone())
    }

    async fn list_responses(
        &self,
        filter: &ResponseFilter,
    ) -> Result<Vec<QuizResponse>, StoreError> {
        self.ensure_available()?;
        let state = self.state.read().await;
        let mut matching: Vec<QuizResponse> = state
            .responses
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn insert_quiz_start(
        &self,
        session_id: &str,
        utm: &UtmAttribution,
        started_at: DateTime<Utc>,
    ) -> Result<QuizStart, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        if state.quiz_starts.iter().any(|s| s.session_id == session_id) {
            return Err(StoreError::Conflict(format!(
                "session {} already started",
                session_id
            )));
        }
        let start = QuizStart::new(session_id.to_string(), utm.clone(), started_at);
        state.quiz_starts.push(start.clone());
        Ok(start)
    }

    async fn mark_quiz_completed(
        &self,
        session_id: &str,
        response_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<QuizStart>, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        Ok(state
            .quiz_starts
            .iter_mut()
            .find(|s| s.session_id == session_id)
            .map(|start| {
                start.mark_completed(response_id, at);
                start.clone()
            }))
    }

    async fn get_cta_config(&self) -> Result<CtaConfig, StoreError> {
        self.ensure_available()?;
        Ok(self.state.read().await.cta_config.clone())
    }

    async fn update_cta_config(&self, config: &CtaConfig) -> Result<CtaConfig, StoreError> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        state.cta_config = config.clone();
        Ok(state.cta_config.clone())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ensure_available()
    }
}
