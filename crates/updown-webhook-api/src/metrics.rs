//! Prometheus metrics for the API service.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use updown_webhook_core::monitoring::{CounterLabels, EventMetrics};

const EVENT_LABELS: [&str; 3] = ["subsystem", "handler", "event"];

/// Build metadata reported once at startup through `build_info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub build_time: String,
    pub git_commit: String,
    pub os_version: String,
    pub rust_version: String,
    /// Process start as unix seconds
    pub start_time: String,
}

impl BuildInfo {
    /// Metadata for the running binary
    ///
    /// `BUILD_TIME` and `GIT_COMMIT` are read at compile time, `OS_VERSION`
    /// at runtime; missing values are reported as `unknown`.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
            git_commit: option_env!("GIT_COMMIT").unwrap_or("unknown").to_string(),
            os_version: std::env::var("OS_VERSION").unwrap_or_else(|_| "unknown".to_string()),
            rust_version: option_env!("CARGO_PKG_RUST_VERSION")
                .filter(|version| !version.is_empty())
                .unwrap_or("stable")
                .to_string(),
            start_time: chrono::Utc::now().timestamp().to_string(),
        }
    }
}

/// Service metrics for observability
///
/// Each instance owns its registry, so several can coexist in one process.
#[derive(Debug)]
pub struct ServiceMetrics {
    registry: Registry,
    subsystem: String,

    /// Events taken out of a batch, labelled by subsystem, handler and event
    pub handler_total: IntCounterVec,

    /// Events that failed validation, same labels as `handler_total`
    pub handler_failures: IntCounterVec,

    /// Constant 1, labelled with build metadata
    pub build_info: IntCounterVec,
}

impl ServiceMetrics {
    pub fn new(namespace: &str, subsystem: &str) -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let handler_total = IntCounterVec::new(
            Opts::new("handler_total", "Total number of events received per handler")
                .namespace(namespace),
            &EVENT_LABELS,
        )?;
        let handler_failures = IntCounterVec::new(
            Opts::new("handler_failures", "Total number of invalid events per handler")
                .namespace(namespace),
            &EVENT_LABELS,
        )?;
        let build_info = IntCounterVec::new(
            Opts::new("build_info", "Build information of the running service")
                .namespace(namespace),
            &[
                "subsystem",
                "version",
                "build_time",
                "git_commit",
                "os_version",
                "rust_version",
                "start_time",
            ],
        )?;

        registry.register(Box::new(handler_total.clone()))?;
        registry.register(Box::new(handler_failures.clone()))?;
        registry.register(Box::new(build_info.clone()))?;

        Ok(Arc::new(Self {
            registry,
            subsystem: subsystem.to_string(),
            handler_total,
            handler_failures,
            build_info,
        }))
    }

    /// Set the `build_info` series for this process
    pub fn record_build_info(&self, info: &BuildInfo) {
        self.build_info
            .with_label_values(&[
                self.subsystem.as_str(),
                info.version.as_str(),
                info.build_time.as_str(),
                info.git_commit.as_str(),
                info.os_version.as_str(),
                info.rust_version.as_str(),
                info.start_time.as_str(),
            ])
            .inc();
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl EventMetrics for ServiceMetrics {
    fn record_event_received(&self, labels: &CounterLabels<'_>) {
        self.handler_total
            .with_label_values(&[labels.subsystem, labels.handler, labels.event])
            .inc();
    }

    fn record_event_failure(&self, labels: &CounterLabels<'_>) {
        self.handler_failures
            .with_label_values(&[labels.subsystem, labels.handler, labels.event])
            .inc();
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
