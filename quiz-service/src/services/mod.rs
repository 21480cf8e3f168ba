pub mod database;
pub mod eligibility;
pub mod insight;
pub mod metrics;
pub mod providers;
pub mod rate_limiter;
pub mod scoring;
pub mod store;
pub mod visibility;
pub mod webhook;

pub use database::PgQuizStore;
pub use insight::{InsightContext, InsightGenerator, InsightReport};
pub use rate_limiter::{RateLimitDecision, RateLimitPolicy, RateLimiter, StoreErrorPolicy};
pub use store::{MemoryQuizStore, QuizStore, StoreError};
pub use webhook::{WebhookDispatcher, WebhookEvent, WebhookOutcome};
