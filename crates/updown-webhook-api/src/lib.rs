//! # updown-webhook HTTP Service
//!
//! HTTP layer for receiving updown.io webhooks.
//!
//! This crate provides:
//! - The webhook endpoint, which authenticates, decodes and dispatches batches
//! - A health check endpoint
//! - A Prometheus metrics endpoint
//! - Configuration types and loading

pub mod config;
pub mod errors;
pub mod metrics;

pub use config::{LoggingConfig, MetricsConfig, ProviderConfig, ServerConfig, ServiceConfig};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use metrics::{BuildInfo, ServiceMetrics};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    middleware,
    response::{Json, Response},
    routing::{any, get},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};
use updown_webhook_core::{
    decode_batch, EventDispatcher, ProviderIpSet, RequestAuthenticator, RequestHeaders,
};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Header, origin and method checks
    pub authenticator: Arc<RequestAuthenticator>,

    /// Per-batch validation, logging and counting
    pub dispatcher: Arc<EventDispatcher>,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Create new application state
    ///
    /// The dispatcher reports to `metrics` using the configured subsystem.
    pub fn new(
        config: ServiceConfig,
        provider_ips: Arc<ProviderIpSet>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        let authenticator = RequestAuthenticator::new(provider_ips)
            .with_user_agent_marker(config.provider.user_agent.clone());
        let dispatcher = EventDispatcher::new(config.metrics.subsystem.clone(), metrics.clone());

        Self {
            config,
            authenticator: Arc::new(authenticator),
            dispatcher: Arc::new(dispatcher),
            metrics,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
///
/// The webhook endpoint accepts every method so that the authenticator, not
/// the router, decides between 400 and 405.
pub fn create_router(state: AppState) -> Router {
    let webhook_routes = Router::new().route(&state.config.server.endpoint_path, any(handle_webhook));

    let observability_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(webhook_routes)
        .merge(observability_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM. In-flight requests get
/// `server.shutdown_timeout_seconds` to finish after the signal.
pub async fn start_server(
    config: ServiceConfig,
    provider_ips: Arc<ProviderIpSet>,
) -> Result<(), ServiceError> {
    let metrics = ServiceMetrics::new(&config.metrics.namespace, &config.metrics.subsystem)?;

    let build_info = BuildInfo::current();
    metrics.record_build_info(&build_info);
    info!(
        version = %build_info.version,
        build_time = %build_info.build_time,
        git_commit = %build_info.git_commit,
        os_version = %build_info.os_version,
        rust_version = %build_info.rust_version,
        start_time = %build_info.start_time,
        "Build info"
    );

    let state = AppState::new(config.clone(), provider_ips, metrics);
    let app = create_router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener =
        tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: address.clone(),
                message: e.to_string(),
            })?;

    info!(
        address = %address,
        endpoint = %config.server.endpoint_path,
        "Starting HTTP server"
    );

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let (signalled_tx, mut signalled_rx) = tokio::sync::watch::channel(false);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Initiating graceful shutdown"
            );
            let _ = signalled_tx.send(true);
        })
        .into_future();

    let deadline = async move {
        if signalled_rx.wait_for(|signalled| *signalled).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = deadline => {
            warn!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out; dropping in-flight requests"
            );
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Handle updown.io webhook requests
///
/// 1. Authenticate from headers and method, before the body is read
/// 2. Read and decode the body into a batch
/// 3. Dispatch every event; any invalid event fails the request
#[instrument(skip(state, method, headers, body), fields(method = %method))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    let request_headers = to_request_headers(&headers);
    state
        .authenticator
        .authenticate(method.as_str(), &request_headers)?;

    let body = axum::body::to_bytes(body, state.config.server.max_body_size)
        .await
        .map_err(|e| WebhookHandlerError::BodyUnreadable {
            message: e.to_string(),
        })?;

    let batch = decode_batch(&body)?;
    state.dispatcher.process(&batch)?;

    info!(events = batch.len(), "Processed webhook batch");

    Ok(Json(WebhookResponse {
        status: "processed".to_string(),
        events: batch.len(),
    }))
}

/// Copy axum's header map into the core's case-insensitive multi-map
fn to_request_headers(headers: &HeaderMap) -> RequestHeaders {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

// ============================================================================
// Health and Observability Handlers
// ============================================================================

/// Liveness check
#[instrument(skip_all)]
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.encode().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
///
/// Reuses an incoming `x-correlation-id` or generates one, echoes it on the
/// response and logs completion at a level chosen by status class.
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

// ============================================================================
// Response Types
// ============================================================================

/// Webhook processing response
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: String,
    pub events: usize,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
