pub mod insight;
pub mod questions;
pub mod responses;
pub mod settings;
pub mod webhook;

pub use insight::GenerateInsightRequest;
pub use questions::{VisibleQuestionsRequest, VisibleQuestionsResponse};
pub use responses::{
    ListResponsesQuery, ListResponsesResponse, QuizStartRequest, QuizStartResponse,
    SubmitResponseRequest, SubmitResponseResponse, UpdateInsightRequest, UpdateWaitlistRequest,
};
pub use settings::UpdateCtaConfigRequest;
pub use webhook::{WebhookRequest, WebhookResponse};

/// Message used whenever a required field is absent.
pub const MISSING_FIELDS: &str = "Missing required fields";
