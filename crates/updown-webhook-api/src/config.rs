//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use updown_webhook_core::{PROVIDER_USER_AGENT, PROVIDER_WHITELIST_HOST};

/// Paths served by the router itself
pub(crate) const RESERVED_PATHS: [&str; 2] = ["/metrics", "/health"];

/// Service configuration
///
/// Every section and field has a default, so an empty configuration source
/// produces a runnable service.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// How the provider is recognised
    pub provider: ProviderConfig,

    /// Metric naming
    pub metrics: MetricsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from files and the environment
    ///
    /// Sources, later ones overriding earlier ones:
    ///  1. `/etc/updown-webhook/service.yaml` (optional)
    ///  2. `./config/service.yaml` (optional)
    ///  3. `explicit_path` (required when given)
    ///  4. Environment variables prefixed `UPDOWN__`, e.g.
    ///     `UPDOWN__SERVER__PORT=9090` sets `server.port`
    ///
    /// The result is validated before it is returned.
    pub fn load(explicit_path: Option<&str>) -> Result<Self, ConfigError> {
        use config::{Environment, File, FileFormat};

        let mut builder = config::Config::builder()
            .add_source(
                File::with_name("/etc/updown-webhook/service")
                    .required(false)
                    .format(FileFormat::Yaml),
            )
            .add_source(
                File::with_name("config/service")
                    .required(false)
                    .format(FileFormat::Yaml),
            );

        if let Some(path) = explicit_path.filter(|path| !path.is_empty()) {
            builder = builder.add_source(
                File::with_name(path)
                    .required(true)
                    .format(FileFormat::Yaml),
            );
        }

        let service_config: ServiceConfig = builder
            .add_source(Environment::with_prefix("UPDOWN").separator("__"))
            .build()?
            .try_deserialize()?;

        service_config.validate()?;
        Ok(service_config)
    }

    /// Check values that deserialize fine but cannot run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must not be 0".to_string(),
            });
        }

        if !self.server.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "server.endpoint_path '{}' must start with '/'",
                    self.server.endpoint_path
                ),
            });
        }

        if RESERVED_PATHS.contains(&self.server.endpoint_path.as_str()) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "server.endpoint_path '{}' is reserved",
                    self.server.endpoint_path
                ),
            });
        }

        let required = [
            ("server.host", &self.server.host),
            ("provider.user_agent", &self.provider.user_agent),
            ("provider.whitelist_host", &self.provider.whitelist_host),
            ("metrics.namespace", &self.metrics.namespace),
            ("metrics.subsystem", &self.metrics.subsystem),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing {
                    key: key.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Path the provider posts webhooks to
    pub endpoint_path: String,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
            endpoint_path: "/".to_string(),
            shutdown_timeout_seconds: 30,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Provider identification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Fragment that must appear in the User-Agent header
    pub user_agent: String,

    /// DNS name resolving to the provider's notification addresses
    pub whitelist_host: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            user_agent: PROVIDER_USER_AGENT.to_string(),
            whitelist_host: PROVIDER_WHITELIST_HOST.to_string(),
        }
    }
}

/// Metric naming configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prefix of every metric name
    pub namespace: String,

    /// Value of the `subsystem` label
    pub subsystem: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: "updown".to_string(),
            subsystem: "webhook".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level, used when `RUST_LOG` is not set
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
