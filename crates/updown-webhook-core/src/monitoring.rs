//! Metrics collection for event processing.
//!
//! The dispatcher reports every event it sees through the [`EventMetrics`]
//! trait. The api crate implements it with Prometheus counters; tests use
//! [`NoOpEventMetrics`] or their own recording fakes.
//!
//! # Examples
//!
//! ```rust
//! use updown_webhook_core::monitoring::{CounterLabels, EventMetrics, NoOpEventMetrics};
//! use std::sync::Arc;
//!
//! let metrics: Arc<dyn EventMetrics> = Arc::new(NoOpEventMetrics);
//!
//! let labels = CounterLabels {
//!     subsystem: "webhook",
//!     handler: "process_events",
//!     event: "check.down",
//! };
//! metrics.record_event_received(&labels);
//! metrics.record_event_failure(&labels);
//! ```

/// Label values attached to every event counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterLabels<'a> {
    /// Deployment subsystem, e.g. `webhook`
    pub subsystem: &'a str,
    /// Processing stage that counted the event
    pub handler: &'a str,
    /// Raw event tag as received, including unrecognized ones
    pub event: &'a str,
}

/// Counter sink for per-event outcomes.
///
/// Recording must never fail or block; implementations swallow their own
/// errors.
pub trait EventMetrics: Send + Sync {
    /// Count an event taken out of a batch, valid or not.
    ///
    /// # Metrics Updated
    ///
    /// - `handler_total`: Incremented by 1
    fn record_event_received(&self, labels: &CounterLabels<'_>);

    /// Count an event that failed validation.
    ///
    /// # Metrics Updated
    ///
    /// - `handler_failures`: Incremented by 1
    fn record_event_failure(&self, labels: &CounterLabels<'_>);
}

/// Metrics sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventMetrics;

impl EventMetrics for NoOpEventMetrics {
    fn record_event_received(&self, _labels: &CounterLabels<'_>) {
        // No-op
    }

    fn record_event_failure(&self, _labels: &CounterLabels<'_>) {
        // No-op
    }
}

#[cfg(test)]
#[path = "monitoring_tests.rs"]
mod tests;
