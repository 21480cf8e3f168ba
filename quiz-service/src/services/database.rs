//! PostgreSQL-backed [`QuizStore`].

use crate::models::answers::{CLEARANCE_QUESTION, PAIN_QUESTION};
use crate::models::cta_config::CTA_CONFIG_KEY;
use crate::models::{
    AnswerSet, AnswerValue, CtaConfig, MedicalClearance, NewQuizResponse, QuizResponse,
    QuizStart, ResponseFilter, Scores, UtmAttribution,
};
use crate::services::metrics;
use crate::services::scoring::{BASELINE_QUESTIONS, RECOVERY_QUESTIONS, TRIGGER_QUESTIONS};
use crate::services::store::{QuizStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use uuid::Uuid;

const RESPONSE_COLUMNS: &str = "id, email, result, score_total, score_trigger, score_recovery, \
     score_baseline, q1_answer, q2_answer, q3_answer, q4_answer, q5_answer, q6_answer, \
     q7_answer, q8_answer, q9_answer, has_chronic_pain, medical_clearance, free_text_response, \
     cta_type, waitlist_opted_in, ai_insight, utm_source, utm_campaign, created_at";

const QUIZ_START_COLUMNS: &str =
    "id, session_id, utm_source, utm_campaign, started_at, completed, completed_at, response_id";

/// Connection pool wrapper.
#[derive(Clone)]
pub struct PgQuizStore {
    pool: PgPool,
}

impl PgQuizStore {
    #[instrument(skip(database_url), fields(service = "quiz-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

/// Times a query and records it under `operation`.
async fn timed<T, F>(operation: &str, query: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    let start = Instant::now();
    let result = query.await;
    metrics::record_db_operation(operation, start.elapsed().as_secs_f64(), result.is_ok());
    result.map_err(StoreError::from)
}

#[derive(sqlx::FromRow)]
struct ResponseRow {
    id: Uuid,
    email: String,
    result: String,
    score_total: i32,
    score_trigger: i32,
    score_recovery: i32,
    score_baseline: i32,
    q1_answer: Option<i32>,
    q2_answer: Option<i32>,
    q3_answer: Option<i32>,
    q4_answer: Option<i32>,
    q5_answer: Option<i32>,
    q6_answer: Option<i32>,
    q7_answer: Option<i32>,
    q8_answer: Option<i32>,
    q9_answer: Option<i32>,
    has_chronic_pain: bool,
    medical_clearance: Option<String>,
    free_text_response: Option<String>,
    cta_type: String,
    waitlist_opted_in: bool,
    ai_insight: Option<String>,
    utm_source: Option<String>,
    utm_campaign: Option<String>,
    created_at: DateTime<Utc>,
}

fn small(value: i32, column: &str) -> Result<u16, StoreError> {
    u16::try_from(value).map_err(|_| StoreError::Corrupt(format!("{} out of range: {}", column, value)))
}

impl TryFrom<ResponseRow> for QuizResponse {
    type Error = StoreError;

    fn try_from(row: ResponseRow) -> Result<Self, Self::Error> {
        let scale_columns = [
            row.q1_answer,
            row.q2_answer,
            row.q3_answer,
            row.q4_answer,
            row.q5_answer,
            row.q6_answer,
            row.q7_answer,
            row.q8_answer,
            row.q9_answer,
        ];

        let mut answers = AnswerSet::new();
        for (i, value) in scale_columns.into_iter().enumerate() {
            if let Some(v) = value {
                let v = u8::try_from(v).map_err(|_| {
                    StoreError::Corrupt(format!("q{}_answer out of range: {}", i + 1, v))
                })?;
                answers.set(format!("q{}", i + 1), AnswerValue::Scale(v));
            }
        }
        answers.set(PAIN_QUESTION, AnswerValue::YesNo(row.has_chronic_pain));

        let medical_clearance: Option<MedicalClearance> = row
            .medical_clearance
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(StoreError::Corrupt)?;
        if let Some(clearance) = medical_clearance {
            answers.set(CLEARANCE_QUESTION, AnswerValue::Clearance(clearance));
        }

        let response = QuizResponse {
            id: row.id,
            email: row.email,
            result: row.result.parse().map_err(StoreError::Corrupt)?,
            scores: Scores {
                trigger: small(row.score_trigger, "score_trigger")?,
                recovery: small(row.score_recovery, "score_recovery")?,
                baseline: small(row.score_baseline, "score_baseline")?,
                total: small(row.score_total, "score_total")?,
            },
            answers,
            has_chronic_pain: row.has_chronic_pain,
            medical_clearance,
            free_text: row.free_text_response,
            cta_type: row.cta_type.parse().map_err(StoreError::Corrupt)?,
            waitlist_opted_in: row.waitlist_opted_in,
            ai_insight: row.ai_insight,
            utm: UtmAttribution {
                source: row.utm_source,
                campaign: row.utm_campaign,
            },
            created_at: row.created_at,
        };

        if !response.is_consistent() {
            return Err(StoreError::Corrupt(format!(
                "response {} classification does not match its scores",
                response.id
            )));
        }

        Ok(response)
    }
}

#[derive(sqlx::FromRow)]
struct QuizStartRow {
    id: Uuid,
    session_id: String,
    utm_source: Option<String>,
    utm_campaign: Option<String>,
    started_at: DateTime<Utc>,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
    response_id: Option<Uuid>,
}

impl From<QuizStartRow> for QuizStart {
    fn from(row: QuizStartRow) -> Self {
        QuizStart {
            id: row.id,
            session_id: row.session_id,
            utm: UtmAttribution {
                source: row.utm_source,
                campaign: row.utm_campaign,
            },
            started_at: row.started_at,
            completed: row.completed,
            completed_at: row.completed_at,
            response_id: row.response_id,
        }
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn scale_column(answers: &AnswerSet, question_id: &str) -> Option<i32> {
    answers.scale_answer(question_id).map(i32::from)
}

#[async_trait]
impl QuizStore for PgQuizStore {
    #[instrument(skip(self, email))]
    async fn count_responses_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        timed(
            "count_responses_since",
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM responses WHERE email = $1 AND created_at >= $2",
            )
            .bind(email)
            .bind(since)
            .fetch_one(&self.pool),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn count_ip_attempts_since(
        &self,
        ip: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        timed(
            "count_ip_attempts_since",
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM ip_rate_limits WHERE ip_address = $1 AND created_at >= $2",
            )
            .bind(ip)
            .bind(since)
            .fetch_one(&self.pool),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn record_ip_attempt(&self, ip: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        timed(
            "record_ip_attempt",
            sqlx::query("INSERT INTO ip_rate_limits (id, ip_address, created_at) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(ip)
                .bind(at)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn prune_ip_attempts(&self, before: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = timed(
            "prune_ip_attempts",
            sqlx::query("DELETE FROM ip_rate_limits WHERE created_at < $1")
                .bind(before)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, response), fields(result = %response.result))]
    async fn insert_response(
        &self,
        response: &NewQuizResponse,
        created_at: DateTime<Utc>,
    ) -> Result<QuizResponse, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO responses (
                id, email, result, score_total, score_trigger, score_recovery, score_baseline,
                q1_answer, q2_answer, q3_answer, q4_answer, q5_answer, q6_answer,
                q7_answer, q8_answer, q9_answer, has_chronic_pain, medical_clearance,
                free_text_response, cta_type, waitlist_opted_in, ai_insight,
                utm_source, utm_campaign, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, FALSE, $21, $22, $23, $24)
            RETURNING {}
            "#,
            RESPONSE_COLUMNS
        );

        let answers = &response.answers;
        let mut query = sqlx::query_as::<_, ResponseRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&response.email)
            .bind(response.result.as_str())
            .bind(i32::from(response.scores.total))
            .bind(i32::from(response.scores.trigger))
            .bind(i32::from(response.scores.recovery))
            .bind(i32::from(response.scores.baseline));
        for question_id in TRIGGER_QUESTIONS
            .iter()
            .chain(RECOVERY_QUESTIONS.iter())
            .chain(BASELINE_QUESTIONS.iter())
        {
            query = query.bind(scale_column(answers, question_id));
        }

        let row = timed(
            "insert_response",
            query
                .bind(response.has_chronic_pain)
                .bind(response.medical_clearance.map(|c| c.as_str()))
                .bind(&response.free_text)
                .bind(response.cta_type.as_str())
                .bind(&response.ai_insight)
                .bind(&response.utm.source)
                .bind(&response.utm.campaign)
                .bind(created_at)
                .fetch_one(&self.pool),
        )
        .await?;

        let stored = QuizResponse::try_from(row)?;
        info!(response_id = %stored.id, "Quiz response stored");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn set_waitlist_opt_in(
        &self,
        id: Uuid,
        opted_in: bool,
    ) -> Result<QuizResponse, StoreError> {
        let sql = format!(
            "UPDATE responses SET waitlist_opted_in = $2 WHERE id = $1 RETURNING {}",
            RESPONSE_COLUMNS
        );
        let row = timed(
            "set_waitlist_opt_in",
            sqlx::query_as::<_, ResponseRow>(&sql)
                .bind(id)
                .bind(opted_in)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("response {}", id)))?;

        QuizResponse::try_from(row)
    }

    #[instrument(skip(self, insight))]
    async fn set_ai_insight(&self, id: Uuid, insight: &str) -> Result<QuizResponse, StoreError> {
        let sql = format!(
            "UPDATE responses SET ai_insight = $2 WHERE id = $1 RETURNING {}",
            RESPONSE_COLUMNS
        );
        let row = timed(
            "set_ai_insight",
            sqlx::query_as::<_, ResponseRow>(&sql)
                .bind(id)
                .bind(insight)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("response {}", id)))?;

        QuizResponse::try_from(row)
    }

    #[instrument(skip(self, filter))]
    async fn list_responses(
        &self,
        filter: &ResponseFilter,
    ) -> Result<Vec<QuizResponse>, StoreError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx = 1;
        let mut next = |condition: &str| {
            conditions.push(condition.replace("{}", &format!("${}", param_idx)));
            param_idx += 1;
        };

        if filter.result.is_some() {
            next("result = {}");
        }
        if filter.has_chronic_pain.is_some() {
            next("has_chronic_pain = {}");
        }
        if filter.medical_clearance.is_some() {
            next("medical_clearance = {}");
        }
        if filter.cta_type.is_some() {
            next("cta_type = {}");
        }
        if filter.waitlist_opted_in.is_some() {
            next("waitlist_opted_in = {}");
        }
        if filter.email_contains.is_some() {
            next("email ILIKE '%' || {} || '%'");
        }
        if filter.created_from.is_some() {
            next("created_at >= {}");
        }
        if filter.created_to.is_some() {
            next("created_at <= {}");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM responses {} ORDER BY created_at DESC",
            RESPONSE_COLUMNS, where_clause
        );

        let mut query = sqlx::query_as::<_, ResponseRow>(&sql);
        if let Some(result) = filter.result {
            query = query.bind(result.as_str());
        }
        if let Some(pain) = filter.has_chronic_pain {
            query = query.bind(pain);
        }
        if let Some(clearance) = filter.medical_clearance {
            query = query.bind(clearance.as_str());
        }
        if let Some(cta_type) = filter.cta_type {
            query = query.bind(cta_type.as_str());
        }
        if let Some(opted_in) = filter.waitlist_opted_in {
            query = query.bind(opted_in);
        }
        if let Some(email) = &filter.email_contains {
            query = query.bind(escape_like(email));
        }
        if let Some(from) = filter.created_from {
            query = query.bind(from);
        }
        if let Some(to) = filter.created_to {
            query = query.bind(to);
        }

        let rows = timed("list_responses", query.fetch_all(&self.pool)).await?;
        rows.into_iter().map(QuizResponse::try_from).collect()
    }

    #[instrument(skip(self, utm))]
    async fn insert_quiz_start(
        &self,
        session_id: &str,
        utm: &UtmAttribution,
        started_at: DateTime<Utc>,
    ) -> Result<QuizStart, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO quiz_starts (id, session_id, utm_source, utm_campaign, started_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            QUIZ_START_COLUMNS
        );

        let result = timed(
            "insert_quiz_start",
            sqlx::query_as::<_, QuizStartRow>(&sql)
                .bind(Uuid::new_v4())
                .bind(session_id)
                .bind(&utm.source)
                .bind(&utm.campaign)
                .bind(started_at)
                .fetch_one(&self.pool),
        )
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(StoreError::Database(sqlx::Error::Database(ref db_err)))
                if db_err.is_unique_violation() =>
            {
                Err(StoreError::Conflict(format!(
                    "session {} already started",
                    session_id
                )))
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn mark_quiz_completed(
        &self,
        session_id: &str,
        response_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<QuizStart>, StoreError> {
        let sql = format!(
            r#"
            UPDATE quiz_starts
            SET completed = TRUE, completed_at = $3, response_id = $2
            WHERE session_id = $1
            RETURNING {}
            "#,
            QUIZ_START_COLUMNS
        );

        let row = timed(
            "mark_quiz_completed",
            sqlx::query_as::<_, QuizStartRow>(&sql)
                .bind(session_id)
                .bind(response_id)
                .bind(at)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(QuizStart::from))
    }

    #[instrument(skip(self))]
    async fn get_cta_config(&self) -> Result<CtaConfig, StoreError> {
        let value = timed(
            "get_cta_config",
            sqlx::query_scalar::<_, Json<CtaConfig>>("SELECT value FROM settings WHERE key = $1")
                .bind(CTA_CONFIG_KEY)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(value.map(|Json(config)| config).unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn update_cta_config(&self, config: &CtaConfig) -> Result<CtaConfig, StoreError> {
        let Json(stored) = timed(
            "update_cta_config",
            sqlx::query_scalar::<_, Json<CtaConfig>>(
                r#"
                INSERT INTO settings (key, value, updated_at)
                VALUES ($1, $2, NOW())
                ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
                RETURNING value
                "#,
            )
            .bind(CTA_CONFIG_KEY)
            .bind(Json(config))
            .fetch_one(&self.pool),
        )
        .await?;

        info!(mode = ?stored.mode, "CTA config updated");
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), StoreError> {
        timed("health_check", sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("jane_doe%"), "jane\\_doe\\%");
        assert_eq!(escape_like("plain@example.com"), "plain@example.com");
    }
}
