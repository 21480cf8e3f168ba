//! Application wiring: shared state, router and server lifecycle.

use crate::config::{CorsConfig, QuizConfig, StoreBackend};
use crate::handlers;
use crate::middleware::{admin_auth_middleware, ADMIN_PASSWORD_HEADER};
use crate::services::providers::anthropic::{AnthropicConfig, AnthropicProvider};
use crate::services::{
    InsightGenerator, MemoryQuizStore, PgQuizStore, QuizStore, RateLimiter, WebhookDispatcher,
};
use axum::{
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
    Router,
};
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use service_core::middleware::{
    request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    pub limiter: RateLimiter,
    pub insights: InsightGenerator,
    pub webhook: WebhookDispatcher,
    pub admin_password: Option<Secret<String>>,
}

pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/generate-insight", post(handlers::generate_insight))
        .route("/webhook", post(handlers::send_webhook))
        .route("/quiz-starts", post(handlers::create_quiz_start))
        .route(
            "/responses",
            post(handlers::submit_response).merge(
                get(handlers::list_responses)
                    .route_layer(from_fn_with_state(state.clone(), admin_auth_middleware)),
            ),
        )
        .route("/responses/:id/waitlist", patch(handlers::update_waitlist))
        .route("/responses/:id/insight", patch(handlers::update_insight))
        .route(
            "/settings/cta",
            get(handlers::get_cta_config).merge(
                put(handlers::update_cta_config)
                    .route_layer(from_fn_with_state(state.clone(), admin_auth_middleware)),
            ),
        )
        .route("/questions", get(handlers::list_questions))
        .route("/questions/visible", post(handlers::visible_questions))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(cors))
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(ADMIN_PASSWORD_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ]);

    if cors.allowed_origin.trim() == "*" {
        return layer.allow_origin(Any);
    }

    match cors.allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::error!(
                "Invalid CORS origin '{}': {}. Allowing any origin.",
                cors.allowed_origin,
                e
            );
            layer.allow_origin(Any)
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: QuizConfig) -> Result<Self, AppError> {
        let store: Arc<dyn QuizStore> = match config.database.backend {
            StoreBackend::Postgres => {
                let url = config.database.url.as_ref().ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required but not set"))
                })?;
                let db = PgQuizStore::new(
                    url.expose_secret(),
                    config.database.max_connections,
                    config.database.min_connections,
                )
                .await?;
                if config.database.run_migrations {
                    db.run_migrations().await?;
                }
                Arc::new(db)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                Arc::new(MemoryQuizStore::new())
            }
        };

        let limiter = RateLimiter::new(store.clone(), config.rate_limit.clone());

        if config.provider.api_key.is_none() {
            tracing::warn!("ANTHROPIC_API_KEY not configured - insights will be unavailable");
        }
        let provider = AnthropicProvider::new(AnthropicConfig {
            api_key: config.provider.api_key.clone(),
            model: config.provider.model.clone(),
            base_url: config.provider.base_url.clone(),
            timeout: config.provider.timeout,
        })
        .map_err(|e| {
            tracing::error!("Failed to initialize Anthropic provider: {}", e);
            AppError::InternalError(anyhow::anyhow!("provider initialization error: {}", e))
        })?;
        tracing::info!(model = %config.provider.model, "Initialized Anthropic text provider");

        let insights = InsightGenerator::with_params(
            Arc::new(provider),
            config.provider.max_tokens,
            config.provider.temperature,
        );

        let webhook = WebhookDispatcher::new(config.webhook.url.clone(), config.webhook.timeout)
            .map_err(|e| {
                tracing::error!("Failed to build webhook client: {}", e);
                AppError::InternalError(e.into())
            })?;

        if config.admin.password.is_none() {
            tracing::warn!("ADMIN_PASSWORD not configured - settings cannot be changed");
        }

        let state = AppState {
            store,
            limiter,
            insights,
            webhook,
            admin_password: config.admin.password.clone(),
        };
        let router = build_router(state, &config.cors);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Quiz service listening on port {}", port);

        Ok(Self {
            listener,
            router,
        })
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
