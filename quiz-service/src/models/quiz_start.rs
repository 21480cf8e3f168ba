use super::UtmAttribution;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A quiz attempt that was started, used for abandonment analysis. The only
/// mutation it ever sees is the completion marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizStart {
    pub id: Uuid,
    pub session_id: String,
    pub utm: UtmAttribution,
    pub started_at: DateTime<Utc>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub response_id: Option<Uuid>,
}

impl QuizStart {
    pub fn new(session_id: String, utm: UtmAttribution, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            utm,
            started_at,
            completed: false,
            completed_at: None,
            response_id: None,
        }
    }

    pub fn mark_completed(&mut self, response_id: Uuid, at: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(at);
        self.response_id = Some(response_id);
    }
}
