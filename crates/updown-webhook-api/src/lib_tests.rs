//! Tests for the webhook router and handlers.

use super::*;
use axum::http::{header, Request};
use serde_json::Value;
use std::net::IpAddr;
use tower::ServiceExt;

const PROVIDER_IP: &str = "198.51.100.10";

// ============================================================================
// Test helpers
// ============================================================================

fn test_state(config: ServiceConfig) -> AppState {
    let ips: ProviderIpSet = [PROVIDER_IP.parse::<IpAddr>().unwrap()]
        .into_iter()
        .collect();
    let metrics =
        ServiceMetrics::new(&config.metrics.namespace, &config.metrics.subsystem).unwrap();
    AppState::new(config, Arc::new(ips), metrics)
}

fn provider_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, "updown.io daemon 2.12")
        .header("X-Forwarded-For", PROVIDER_IP)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn received(state: &AppState, event: &str) -> u64 {
    state
        .metrics
        .handler_total
        .with_label_values(&["webhook", "process_events", event])
        .get()
}

fn failures(state: &AppState, event: &str) -> u64 {
    state
        .metrics
        .handler_failures
        .with_label_values(&["webhook", "process_events", event])
        .get()
}

const DOWN_BATCH: &str = r#"[{"event":"check.down","time":"2024-01-01T00:00:00Z","downtime":{"id":"d1","error":"timeout","started_at":"2024-01-01T00:00:00Z"}}]"#;

// ============================================================================
// Webhook endpoint
// ============================================================================

#[tokio::test]
async fn test_valid_batch_returns_ok() {
    let state = test_state(ServiceConfig::default());
    let app = create_router(state.clone());

    let response = app
        .oneshot(provider_request("POST", "/", DOWN_BATCH))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-correlation-id"));
    let body = json_body(response).await;
    assert_eq!(body["status"], "processed");
    assert_eq!(body["events"], 1);
    assert_eq!(received(&state, "check.down"), 1);
    assert_eq!(failures(&state, "check.down"), 0);
}

#[tokio::test]
async fn test_invalid_event_returns_server_error_with_count() {
    let state = test_state(ServiceConfig::default());
    let app = create_router(state.clone());

    let response = app
        .oneshot(provider_request(
            "POST",
            "/",
            r#"[{"event":"check.ssl_invalid","ssl":{}}]"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "1 event is invalid");
    assert_eq!(body["status"], 500);
    assert_eq!(failures(&state, "check.ssl_invalid"), 1);
}

#[tokio::test]
async fn test_wrong_user_agent_is_bad_request() {
    let state = test_state(ServiceConfig::default());
    let app = create_router(state.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::USER_AGENT, "curl/8.0")
        .header("X-Forwarded-For", PROVIDER_IP)
        .body(Body::from(DOWN_BATCH))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(received(&state, "check.down"), 0);
}

#[tokio::test]
async fn test_get_from_provider_is_method_not_allowed() {
    let app = create_router(test_state(ServiceConfig::default()));

    let response = app
        .oneshot(provider_request("GET", "/", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = json_body(response).await;
    assert_eq!(body["status"], 405);
}

#[tokio::test]
async fn test_malformed_body_is_server_error() {
    let app = create_router(test_state(ServiceConfig::default()));

    let response = app
        .oneshot(provider_request("POST", "/", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_oversized_body_is_bad_request() {
    let mut config = ServiceConfig::default();
    config.server.max_body_size = 16;
    let app = create_router(test_state(config));

    let response = app
        .oneshot(provider_request("POST", "/", DOWN_BATCH))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_custom_endpoint_path_and_user_agent() {
    let mut config = ServiceConfig::default();
    config.server.endpoint_path = "/hooks/updown".to_string();
    config.provider.user_agent = "updown.io daemon".to_string();
    let app = create_router(test_state(config));

    let response = app
        .clone()
        .oneshot(provider_request("POST", "/hooks/updown", "[]"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(provider_request("POST", "/", "[]"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let app = create_router(test_state(ServiceConfig::default()));

    let mut request = provider_request("POST", "/", "[]");
    request
        .headers_mut()
        .insert("x-correlation-id", "abc-123".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-correlation-id").unwrap(),
        "abc-123"
    );
}

// ============================================================================
// Health and metrics
// ============================================================================

#[tokio::test]
async fn test_health_reports_version() {
    let app = create_router(test_state(ServiceConfig::default()));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_handler_counters() {
    let state = test_state(ServiceConfig::default());
    let app = create_router(state.clone());

    app.clone()
        .oneshot(provider_request("POST", "/", DOWN_BATCH))
        .await
        .unwrap();

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(
        r#"updown_handler_total{event="check.down",handler="process_events",subsystem="webhook"} 1"#
    ));
}

// ============================================================================
// Error mapping
// ============================================================================

#[test]
fn test_error_status_codes() {
    use updown_webhook_core::{AuthenticationError, BatchError, ValidationError};

    let method = WebhookHandlerError::from(AuthenticationError::MethodNotAllowed {
        method: "GET".to_string(),
    });
    assert_eq!(method.status_code(), StatusCode::METHOD_NOT_ALLOWED);

    let origin = WebhookHandlerError::from(AuthenticationError::MissingForwardedFor);
    assert_eq!(origin.status_code(), StatusCode::BAD_REQUEST);

    let batch = WebhookHandlerError::from(BatchError::InvalidEvents {
        errors: vec![ValidationError::UnrecognizedKind {
            kind: "x".to_string(),
        }],
    });
    assert_eq!(batch.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_service_error_exit_codes_are_distinct() {
    let codes = [
        ServiceError::BindFailed {
            address: "0.0.0.0:8888".to_string(),
            message: "in use".to_string(),
        }
        .exit_code(),
        ServiceError::ServerFailed {
            message: "boom".to_string(),
        }
        .exit_code(),
        ServiceError::Configuration(ConfigError::Missing {
            key: "server.host".to_string(),
        })
        .exit_code(),
        ServiceError::ProviderResolution(updown_webhook_core::ResolveError::NoAddresses {
            host: "ips.updown.io".to_string(),
        })
        .exit_code(),
        ServiceError::Metrics(prometheus::Error::Msg("bad".to_string())).exit_code(),
    ];

    let unique: std::collections::BTreeSet<i32> = codes.iter().copied().collect();
    assert_eq!(unique.len(), codes.len());
    assert!(codes.iter().all(|code| *code != 0));
}
