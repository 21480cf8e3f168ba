use crate::services::providers::anthropic::{ANTHROPIC_API_BASE, DEFAULT_MODEL};
use crate::services::rate_limiter::RateLimitPolicy;
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct QuizConfig {
    pub common: core_config::Config,
    pub is_prod: bool,
    pub database: DatabaseConfig,
    pub provider: ProviderConfig,
    pub webhook: WebhookConfig,
    pub admin: AdminConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// Required for the Postgres backend.
    pub url: Option<Secret<String>>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Insight requests degrade to the null shape while unset.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Settings writes are refused while unset.
    pub password: Option<Secret<String>>,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// `*` allows any origin.
    pub allowed_origin: String,
}

impl QuizConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: StoreBackend = parse_env("STORE_BACKEND", "postgres")?;
        let database_url = optional_env("DATABASE_URL").map(Secret::new);
        if backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_URL is required but not set"
            )));
        }

        let api_key = optional_env("ANTHROPIC_API_KEY")
            .or_else(|| optional_env("CLAUDE_API_KEY"))
            .map(Secret::new);

        let admin_password = optional_env("ADMIN_PASSWORD").map(Secret::new);
        if is_prod && admin_password.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ADMIN_PASSWORD is required in production but not set"
            )));
        }

        let defaults = RateLimitPolicy::default();

        Ok(QuizConfig {
            common: common_config,
            is_prod,
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10")?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1")?,
                run_migrations: parse_env("DATABASE_RUN_MIGRATIONS", "true")?,
            },
            provider: ProviderConfig {
                api_key,
                model: get_env("ANTHROPIC_MODEL", Some(DEFAULT_MODEL), false)?,
                base_url: get_env("ANTHROPIC_BASE_URL", Some(ANTHROPIC_API_BASE), false)?,
                timeout: Duration::from_secs(parse_env("ANTHROPIC_TIMEOUT_SECS", "30")?),
                max_tokens: parse_env("INSIGHT_MAX_TOKENS", "550")?,
                temperature: parse_env("INSIGHT_TEMPERATURE", "0.7")?,
            },
            webhook: WebhookConfig {
                url: optional_env("WEBHOOK_URL").or_else(|| optional_env("N8N_WEBHOOK_URL")),
                timeout: Duration::from_secs(parse_env("WEBHOOK_TIMEOUT_SECS", "10")?),
            },
            admin: AdminConfig {
                password: admin_password,
            },
            cors: CorsConfig {
                allowed_origin: get_env("ALLOWED_ORIGIN", Some("*"), is_prod)?,
            },
            rate_limit: RateLimitPolicy {
                email_limit: parse_env("RATE_LIMIT_EMAIL_MAX", &defaults.email_limit.to_string())?,
                email_window_secs: parse_env(
                    "RATE_LIMIT_EMAIL_WINDOW_SECS",
                    &defaults.email_window_secs.to_string(),
                )?,
                ip_limit: parse_env("RATE_LIMIT_IP_MAX", &defaults.ip_limit.to_string())?,
                ip_window_secs: parse_env(
                    "RATE_LIMIT_IP_WINDOW_SECS",
                    &defaults.ip_window_secs.to_string(),
                )?,
                email_on_store_error: parse_env("RATE_LIMIT_EMAIL_ON_STORE_ERROR", "allow")?,
                ip_on_store_error: parse_env("RATE_LIMIT_IP_ON_STORE_ERROR", "allow")?,
            },
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Read `key`, falling back to `default`, and parse it.
fn parse_env<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(key, Some(default), false)?;
    raw.trim()
        .parse()
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("invalid {}='{}': {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::rate_limiter::StoreErrorPolicy;

    #[test]
    fn parses_backend_and_policy_names() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("Postgres".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert!("sqlite".parse::<StoreBackend>().is_err());

        assert_eq!("deny".parse::<StoreErrorPolicy>(), Ok(StoreErrorPolicy::Deny));
        assert!("maybe".parse::<StoreErrorPolicy>().is_err());
    }

    #[test]
    fn missing_key_uses_default_outside_production() {
        let value: u32 = parse_env("QUIZ_TEST_UNSET_NUMBER", "42").unwrap();
        assert_eq!(value, 42);

        assert!(get_env("QUIZ_TEST_UNSET_REQUIRED", None, false).is_err());
        assert!(get_env("QUIZ_TEST_UNSET_REQUIRED", Some("x"), true).is_err());
    }
}
