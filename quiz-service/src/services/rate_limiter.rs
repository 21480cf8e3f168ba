//! Dual-key submission limiter.
//!
//! Counts come from stored rows, so the cap is heuristic: two concurrent
//! submissions from the same key can both read a count below the limit and
//! both pass. Treat it as a soft ceiling, not an exact one.

use crate::services::metrics;
use crate::services::store::QuizStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub const EMAIL_LIMIT_MESSAGE: &str =
    "You've already taken this quiz twice. If you need help, please contact support.";
pub const IP_LIMIT_MESSAGE: &str =
    "Too many quiz submissions from your network. Please try again in an hour.";

/// What to do when the store cannot answer a limit query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreErrorPolicy {
    #[default]
    Allow,
    Deny,
}

impl std::str::FromStr for StoreErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(StoreErrorPolicy::Allow),
            "deny" => Ok(StoreErrorPolicy::Deny),
            other => Err(format!("expected allow or deny, got '{}'", other)),
        }
    }
}

/// Which key tripped a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    Email,
    Ip,
}

impl LimitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitKind::Email => "email",
            LimitKind::Ip => "ip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub reason: Option<&'static str>,
    pub kind: Option<LimitKind>,
}

impl RateLimitDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            kind: None,
        }
    }

    fn reject(kind: LimitKind) -> Self {
        let reason = match kind {
            LimitKind::Email => EMAIL_LIMIT_MESSAGE,
            LimitKind::Ip => IP_LIMIT_MESSAGE,
        };
        Self {
            allowed: false,
            reason: Some(reason),
            kind: Some(kind),
        }
    }
}

/// Limits and windows for both keys. Windows are in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub email_limit: i64,
    pub email_window_secs: i64,
    pub ip_limit: i64,
    pub ip_window_secs: i64,
    pub email_on_store_error: StoreErrorPolicy,
    pub ip_on_store_error: StoreErrorPolicy,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            email_limit: 2,
            email_window_secs: 24 * 60 * 60,
            ip_limit: 3,
            ip_window_secs: 60 * 60,
            email_on_store_error: StoreErrorPolicy::Allow,
            ip_on_store_error: StoreErrorPolicy::Allow,
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn QuizStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn QuizStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn check(&self, email: &str, ip: &str) -> RateLimitDecision {
        self.check_at(Utc::now(), email, ip).await
    }

    /// Email is checked first, then IP. An allowed request records one IP
    /// attempt at `now` and prunes attempts older than the IP window; failures
    /// of either write are logged and ignored.
    #[instrument(skip(self, email))]
    pub async fn check_at(&self, now: DateTime<Utc>, email: &str, ip: &str) -> RateLimitDecision {
        let email_since = now - Duration::seconds(self.policy.email_window_secs);
        match self.store.count_responses_since(email, email_since).await {
            Ok(count) if count >= self.policy.email_limit => {
                metrics::record_rate_limit(LimitKind::Email.as_str(), "rejected");
                return RateLimitDecision::reject(LimitKind::Email);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Email rate limit check failed");
                if self.policy.email_on_store_error == StoreErrorPolicy::Deny {
                    metrics::record_rate_limit(LimitKind::Email.as_str(), "store_error");
                    return RateLimitDecision::reject(LimitKind::Email);
                }
            }
        }

        let ip_since = now - Duration::seconds(self.policy.ip_window_secs);
        match self.store.count_ip_attempts_since(ip, ip_since).await {
            Ok(count) if count >= self.policy.ip_limit => {
                metrics::record_rate_limit(LimitKind::Ip.as_str(), "rejected");
                return RateLimitDecision::reject(LimitKind::Ip);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "IP rate limit check failed");
                if self.policy.ip_on_store_error == StoreErrorPolicy::Deny {
                    metrics::record_rate_limit(LimitKind::Ip.as_str(), "store_error");
                    return RateLimitDecision::reject(LimitKind::Ip);
                }
            }
        }

        if let Err(e) = self.store.record_ip_attempt(ip, now).await {
            warn!(error = %e, "Failed to record IP attempt");
        }
        match self.store.prune_ip_attempts(ip_since).await {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "Pruned expired IP attempts"),
            Err(e) => warn!(error = %e, "Failed to prune IP attempts"),
        }

        metrics::record_rate_limit("all", "allowed");
        RateLimitDecision::allow()
    }
}
