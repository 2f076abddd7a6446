//! # Event Dispatch
//!
//! Drives validation, logging and counting for every event in a batch.
//!
//! A batch is processed strictly in order and an invalid event never stops
//! the ones after it. Every event is counted as received before validation;
//! invalid ones are additionally counted as failures and collected into the
//! [`BatchError`] returned once the whole batch has been seen.

use crate::event::{Event, EventPayload, ValidationError, WireEvent};
use crate::monitoring::{CounterLabels, EventMetrics};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Handler label used on counters and log records produced while dispatching
pub const PROCESS_EVENTS_HANDLER: &str = "process_events";

/// Failure of a batch in which at least one event was invalid
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("{}", describe_invalid(.errors))]
    InvalidEvents { errors: Vec<ValidationError> },
}

impl BatchError {
    /// Number of events that failed validation
    pub fn invalid_count(&self) -> usize {
        match self {
            Self::InvalidEvents { errors } => errors.len(),
        }
    }

    /// Validation errors in batch order
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Self::InvalidEvents { errors } => errors,
        }
    }
}

fn describe_invalid(errors: &[ValidationError]) -> String {
    match errors.len() {
        1 => "1 event is invalid".to_string(),
        count => format!("{count} events are invalid"),
    }
}

/// Validates and records each event of a decoded batch
#[derive(Clone)]
pub struct EventDispatcher {
    subsystem: String,
    metrics: Arc<dyn EventMetrics>,
}

impl EventDispatcher {
    pub fn new(subsystem: impl Into<String>, metrics: Arc<dyn EventMetrics>) -> Self {
        Self {
            subsystem: subsystem.into(),
            metrics,
        }
    }

    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// Process a batch in order
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidEvents`] after the whole batch has been
    /// processed if any event failed validation.
    #[instrument(skip(self, batch), fields(handler = PROCESS_EVENTS_HANDLER, events = batch.len()))]
    pub fn process(&self, batch: &[WireEvent]) -> Result<(), BatchError> {
        let mut errors = Vec::new();

        for wire in batch {
            let labels = CounterLabels {
                subsystem: &self.subsystem,
                handler: PROCESS_EVENTS_HANDLER,
                event: wire.kind_label(),
            };

            let url = wire.check.as_ref().map_or("", |check| check.url.as_str());
            info!(
                event = %wire.kind_label(),
                url = %url,
                description = %wire.description,
                "Event"
            );
            self.metrics.record_event_received(&labels);

            match Event::try_from(wire) {
                Ok(event) => log_event(&event),
                Err(validation_error) => {
                    error!(
                        event = %wire.kind_label(),
                        error = %validation_error,
                        "Invalid event"
                    );
                    self.metrics.record_event_failure(&labels);
                    errors.push(validation_error);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(BatchError::InvalidEvents { errors })
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subsystem", &self.subsystem)
            .finish_non_exhaustive()
    }
}

fn log_event(event: &Event) {
    let kind = event.kind();
    match &event.payload {
        EventPayload::Down(downtime) | EventPayload::Up(downtime) => {
            info!(event = %kind, downtime = ?downtime, "Downtime");
        }
        EventPayload::SslInvalid { cert, error } => {
            info!(event = %kind, cert = ?cert, error = %error, "Invalid certificate");
        }
        EventPayload::SslValid { cert } => {
            info!(event = %kind, cert = ?cert, "Valid certificate");
        }
        EventPayload::SslExpiration {
            cert,
            days_before_expiration,
        } => {
            info!(
                event = %kind,
                cert = ?cert,
                days_before_expiration = *days_before_expiration,
                "Certificate expiring"
            );
        }
        EventPayload::SslRenewed { new_cert, old_cert } => {
            info!(event = %kind, new_cert = ?new_cert, old_cert = ?old_cert, "Certificate renewed");
        }
        EventPayload::PerformanceDrop {
            apdex_dropped,
            last_metrics,
        } => {
            info!(
                event = %kind,
                apdex_dropped = %apdex_dropped,
                last_metrics = ?last_metrics,
                "Performance drop"
            );
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
