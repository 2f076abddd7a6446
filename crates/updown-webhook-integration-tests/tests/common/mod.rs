//! Common test utilities for updown-webhook integration tests
//!
//! This module provides:
//! - A fake DNS resolver standing in for the provider whitelist lookup
//! - Builders for application state and provider-shaped requests
//! - Helpers to read response bodies and counter values

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use updown_webhook_api::{AppState, ServiceConfig, ServiceMetrics};
use updown_webhook_core::{HostResolver, ProviderIpResolver, ProviderIpSet};

/// Address the fake resolver reports for the provider
#[allow(dead_code)]
pub const PROVIDER_IP: &str = "198.51.100.10";

/// A second provider address
#[allow(dead_code)]
pub const SECOND_PROVIDER_IP: &str = "2001:db8::10";

/// An address that is not the provider's
#[allow(dead_code)]
pub const STRANGER_IP: &str = "203.0.113.99";

#[allow(dead_code)]
pub const PROVIDER_USER_AGENT: &str = "updown.io webhooks (+https://updown.io)";

// ============================================================================
// Fake Resolver
// ============================================================================

/// Resolves every host to a fixed address list
#[allow(dead_code)]
pub struct StaticResolver {
    addresses: Vec<IpAddr>,
}

impl StaticResolver {
    #[allow(dead_code)]
    pub fn new(addresses: &[&str]) -> Self {
        Self {
            addresses: addresses
                .iter()
                .map(|address| address.parse().unwrap())
                .collect(),
        }
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn lookup(&self, _host: &str) -> io::Result<Vec<IpAddr>> {
        Ok(self.addresses.clone())
    }
}

// ============================================================================
// State Builders
// ============================================================================

/// Resolve the provider set through the real resolver with a fake lookup
#[allow(dead_code)]
pub async fn resolve_provider_ips(config: &ServiceConfig) -> Arc<ProviderIpSet> {
    let resolver = ProviderIpResolver::new(Arc::new(StaticResolver::new(&[
        PROVIDER_IP,
        SECOND_PROVIDER_IP,
    ])));
    Arc::new(
        resolver
            .resolve(&config.provider.whitelist_host)
            .await
            .unwrap(),
    )
}

#[allow(dead_code)]
pub async fn create_test_app_state_with_config(config: ServiceConfig) -> AppState {
    let provider_ips = resolve_provider_ips(&config).await;
    let metrics =
        ServiceMetrics::new(&config.metrics.namespace, &config.metrics.subsystem).unwrap();
    AppState::new(config, provider_ips, metrics)
}

#[allow(dead_code)]
pub async fn create_test_app_state() -> AppState {
    create_test_app_state_with_config(ServiceConfig::default()).await
}

// ============================================================================
// Requests and Responses
// ============================================================================

/// A request carrying the provider's User-Agent and origin
#[allow(dead_code)]
pub fn provider_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    request_from(method, uri, PROVIDER_USER_AGENT, PROVIDER_IP, body)
}

#[allow(dead_code)]
pub fn request_from(
    method: &str,
    uri: &str,
    user_agent: &str,
    forwarded_for: &str,
    body: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("User-Agent", user_agent)
        .header("X-Forwarded-For", forwarded_for)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub async fn read_body(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&read_body(response).await).unwrap()
}

/// Value of `handler_total` for an event under the default subsystem
#[allow(dead_code)]
pub fn received_count(state: &AppState, event: &str) -> u64 {
    state
        .metrics
        .handler_total
        .with_label_values(&[
            state.config.metrics.subsystem.as_str(),
            updown_webhook_core::PROCESS_EVENTS_HANDLER,
            event,
        ])
        .get()
}

/// Value of `handler_failures` for an event under the default subsystem
#[allow(dead_code)]
pub fn failure_count(state: &AppState, event: &str) -> u64 {
    state
        .metrics
        .handler_failures
        .with_label_values(&[
            state.config.metrics.subsystem.as_str(),
            updown_webhook_core::PROCESS_EVENTS_HANDLER,
            event,
        ])
        .get()
}

// ============================================================================
// Payload Fixtures
// ============================================================================

#[allow(dead_code)]
pub const DOWN_EVENT: &str = r#"{"event":"check.down","time":"2024-01-01T00:00:00Z","downtime":{"id":"d1","error":"timeout","started_at":"2024-01-01T00:00:00Z"}}"#;

#[allow(dead_code)]
pub const UP_EVENT: &str = r#"{"event":"check.up","time":"2024-01-01T00:10:00Z","downtime":{"id":"d1","started_at":"2024-01-01T00:00:00Z","ended_at":"2024-01-01T00:10:00Z","duration":600}}"#;

#[allow(dead_code)]
pub const SSL_INVALID_EMPTY_EVENT: &str = r#"{"event":"check.ssl_invalid","ssl":{}}"#;

#[allow(dead_code)]
pub const SSL_EXPIRATION_TODAY_EVENT: &str = r#"{"event":"check.ssl_expiration","ssl":{"days_before_expiration":0,"cert":{"subject":"example.com","issuer":"R3","from":"2024-01-01T00:00:00Z","To":"2024-04-01T00:00:00Z","algorithm":"SHA256withRSA"}}}"#;

#[allow(dead_code)]
pub const PERFORMANCE_DROP_EVENT: &str = r#"{"event":"check.performance_drop","apdex_dropped":"0.9 to 0.6","last_metrics":{"2024-01-01T00:00:00Z":{"apdex":0.9},"2024-01-01T01:00:00Z":{"apdex":0.6}}}"#;

/// Wrap events into a batch body
#[allow(dead_code)]
pub fn batch(events: &[&str]) -> String {
    format!("[{}]", events.join(","))
}
