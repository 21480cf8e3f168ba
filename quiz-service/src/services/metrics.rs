//! Prometheus metrics for quiz-service.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Mutex, OnceLock};

pub static REGISTRY: OnceLock<Registry> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

// Submission pipeline
pub static RATE_LIMIT_DECISIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static RESPONSES_STORED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// AI
pub static INSIGHT_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// Automation
pub static WEBHOOK_DELIVERIES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Database
pub static DB_OPERATION_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static DB_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Register all metrics. Later calls are no-ops.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let rate_limit_decisions = IntCounterVec::new(
        Opts::new(
            "quiz_rate_limit_decisions_total",
            "Rate limiter decisions by key and outcome",
        ),
        &["kind", "decision"],
    )?;

    let responses_stored = IntCounterVec::new(
        Opts::new("quiz_responses_stored_total", "Quiz responses persisted"),
        &["result", "cta_type"],
    )?;

    let insight_requests = IntCounterVec::new(
        Opts::new("quiz_insight_requests_total", "Insight generations by outcome"),
        &["outcome"],
    )?;

    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "quiz_provider_latency_seconds",
            "Language model provider latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["provider"],
    )?;

    let webhook_deliveries = IntCounterVec::new(
        Opts::new("quiz_webhook_deliveries_total", "Webhook deliveries by outcome"),
        &["outcome"],
    )?;

    let db_duration = HistogramVec::new(
        HistogramOpts::new(
            "quiz_db_operation_duration_seconds",
            "Database operation duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["operation"],
    )?;

    let db_errors = IntCounterVec::new(
        Opts::new("quiz_db_errors_total", "Total database errors"),
        &["operation"],
    )?;

    registry.register(Box::new(rate_limit_decisions.clone()))?;
    registry.register(Box::new(responses_stored.clone()))?;
    registry.register(Box::new(insight_requests.clone()))?;
    registry.register(Box::new(provider_latency.clone()))?;
    registry.register(Box::new(webhook_deliveries.clone()))?;
    registry.register(Box::new(db_duration.clone()))?;
    registry.register(Box::new(db_errors.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = RATE_LIMIT_DECISIONS_TOTAL.set(rate_limit_decisions);
    let _ = RESPONSES_STORED_TOTAL.set(responses_stored);
    let _ = INSIGHT_REQUESTS_TOTAL.set(insight_requests);
    let _ = PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = WEBHOOK_DELIVERIES_TOTAL.set(webhook_deliveries);
    let _ = DB_OPERATION_DURATION_SECONDS.set(db_duration);
    let _ = DB_ERRORS_TOTAL.set(db_errors);

    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

/// Metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return "# Metrics registry not initialized\n".to_string();
    };

    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
        format!("# Failed to convert metrics to UTF-8: {}\n", e)
    })
}

pub fn record_rate_limit(kind: &str, decision: &str) {
    if let Some(counter) = RATE_LIMIT_DECISIONS_TOTAL.get() {
        counter.with_label_values(&[kind, decision]).inc();
    }
}

pub fn record_response_stored(result: &str, cta_type: &str) {
    if let Some(counter) = RESPONSES_STORED_TOTAL.get() {
        counter.with_label_values(&[result, cta_type]).inc();
    }
}

pub fn record_insight(outcome: &str) {
    if let Some(counter) = INSIGHT_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_provider_latency(provider: &str, duration_secs: f64) {
    if let Some(histogram) = PROVIDER_LATENCY_SECONDS.get() {
        histogram.with_label_values(&[provider]).observe(duration_secs);
    }
}

pub fn record_webhook(outcome: &str) {
    if let Some(counter) = WEBHOOK_DELIVERIES_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_db_operation(operation: &str, duration_secs: f64, success: bool) {
    if let Some(histogram) = DB_OPERATION_DURATION_SECONDS.get() {
        histogram.with_label_values(&[operation]).observe(duration_secs);
    }
    if !success {
        if let Some(counter) = DB_ERRORS_TOTAL.get() {
            counter.with_label_values(&[operation]).inc();
        }
    }
}
