//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};
use updown_webhook_core::{AuthenticationError, BatchError, DecodeError};

/// Webhook handler errors with HTTP status code mapping
///
/// - `400 Bad Request`: the request does not come from the provider
/// - `405 Method Not Allowed`: the provider's headers are present but the
///   method is not `POST`
/// - `500 Internal Server Error`: the body could not be decoded or at least
///   one event in it was invalid
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// Maps to: `400 Bad Request`, or `405 Method Not Allowed` for a wrong method
    #[error("Request rejected: {0}")]
    Authentication(#[from] AuthenticationError),

    /// Maps to: `400 Bad Request`
    #[error("Failed to read request body: {message}")]
    BodyUnreadable { message: String },

    /// Maps to: `500 Internal Server Error`
    #[error("{0}")]
    Decode(#[from] DecodeError),

    /// Maps to: `500 Internal Server Error`
    #[error("{0}")]
    InvalidBatch(#[from] BatchError),
}

impl WebhookHandlerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication(auth) if auth.is_method_not_allowed() => {
                StatusCode::METHOD_NOT_ALLOWED
            }
            Self::Authentication(_) | Self::BodyUnreadable { .. } => StatusCode::BAD_REQUEST,
            Self::Decode(_) | Self::InvalidBatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Authentication(_) | Self::BodyUnreadable { .. } => {
                warn!(error = %self, status = %status, "Webhook request refused");
            }
            Self::Decode(_) | Self::InvalidBatch(_) => {
                error!(error = %self, status = %status, "Webhook processing failed");
            }
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Provider address resolution failed: {0}")]
    ProviderResolution(#[from] updown_webhook_core::ResolveError),

    #[error("Metrics initialisation failed: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ServiceError {
    /// Process exit code reported for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
            Self::ProviderResolution(_) => 4,
            Self::Metrics(_) => 5,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration loading failed: {0}")]
    Loading(#[from] config::ConfigError),
}
