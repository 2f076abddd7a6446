//! Per-kind structural validation of wire events.
//!
//! | kind | required | additional checks |
//! |------|----------|-------------------|
//! | `check.down`, `check.up` | `downtime` | |
//! | `check.ssl_invalid` | `ssl`, `ssl.cert` | `ssl.error` must be non-empty |
//! | `check.ssl_valid` | `ssl`, `ssl.cert` | |
//! | `check.ssl_expiration` | `ssl`, `ssl.cert` | `days_before_expiration` may be zero |
//! | `check.ssl_renewed` | `ssl` | `ssl.new_cert` or `ssl.old_cert` |
//! | `check.performance_drop` | `apdex_dropped`, `last_metrics` | both non-empty |
//!
//! Payload objects that do not belong to the event's kind are ignored.

use super::{Cert, Downtime, Event, EventKind, EventPayload, WireEvent};

/// Reason a single event was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("expected '{kind}' event to contain '{field}'")]
    MissingField {
        kind: EventKind,
        field: &'static str,
    },

    #[error("expected '{kind}' event to contain '{first}' or '{second}'")]
    MissingEitherField {
        kind: EventKind,
        first: &'static str,
        second: &'static str,
    },

    #[error("unrecognized event kind '{kind}'")]
    UnrecognizedKind { kind: String },
}

impl ValidationError {
    fn missing(kind: EventKind, field: &'static str) -> Self {
        Self::MissingField { kind, field }
    }
}

impl WireEvent {
    /// Check that the payload required by this event's kind is present
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found; see the module table for
    /// the rules applied per kind.
    pub fn validate(&self) -> Result<(), ValidationError> {
        Event::try_from(self).map(|_| ())
    }
}

impl TryFrom<&WireEvent> for Event {
    type Error = ValidationError;

    fn try_from(wire: &WireEvent) -> Result<Self, Self::Error> {
        let kind = wire.kind()?;

        let payload = match kind {
            EventKind::Down => EventPayload::Down(required_downtime(kind, &wire.downtime)?),
            EventKind::Up => EventPayload::Up(required_downtime(kind, &wire.downtime)?),
            EventKind::SslInvalid => {
                let ssl = wire
                    .ssl
                    .as_ref()
                    .ok_or_else(|| ValidationError::missing(kind, "ssl"))?;
                let cert = required_cert(kind, "ssl.cert", &ssl.cert)?;
                let error = ssl
                    .error
                    .clone()
                    .filter(|error| !error.is_empty())
                    .ok_or_else(|| ValidationError::missing(kind, "ssl.error"))?;
                EventPayload::SslInvalid { cert, error }
            }
            EventKind::SslValid => {
                let ssl = wire
                    .ssl
                    .as_ref()
                    .ok_or_else(|| ValidationError::missing(kind, "ssl"))?;
                EventPayload::SslValid {
                    cert: required_cert(kind, "ssl.cert", &ssl.cert)?,
                }
            }
            EventKind::SslExpiration => {
                let ssl = wire
                    .ssl
                    .as_ref()
                    .ok_or_else(|| ValidationError::missing(kind, "ssl"))?;
                EventPayload::SslExpiration {
                    cert: required_cert(kind, "ssl.cert", &ssl.cert)?,
                    // zero is a legitimate value, so absence is read as zero
                    days_before_expiration: ssl.days_before_expiration.unwrap_or_default(),
                }
            }
            EventKind::SslRenewed => {
                let ssl = wire
                    .ssl
                    .as_ref()
                    .ok_or_else(|| ValidationError::missing(kind, "ssl"))?;
                let new_cert = non_empty_cert(&ssl.new_cert);
                let old_cert = non_empty_cert(&ssl.old_cert);
                if new_cert.is_none() && old_cert.is_none() {
                    return Err(ValidationError::MissingEitherField {
                        kind,
                        first: "ssl.new_cert",
                        second: "ssl.old_cert",
                    });
                }
                EventPayload::SslRenewed { new_cert, old_cert }
            }
            EventKind::PerformanceDrop => {
                let apdex_dropped = wire
                    .apdex_dropped
                    .clone()
                    .filter(|apdex| !apdex.is_empty())
                    .ok_or_else(|| ValidationError::missing(kind, "apdex_dropped"))?;
                let last_metrics = wire
                    .last_metrics
                    .clone()
                    .filter(|metrics| !metrics.is_empty())
                    .ok_or_else(|| ValidationError::missing(kind, "last_metrics"))?;
                EventPayload::PerformanceDrop {
                    apdex_dropped,
                    last_metrics,
                }
            }
        };

        Ok(Event {
            time: wire.time,
            description: wire.description.clone(),
            check: wire.check.clone(),
            payload,
        })
    }
}

impl TryFrom<WireEvent> for Event {
    type Error = ValidationError;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        Event::try_from(&wire)
    }
}

/// An all-default downtime counts as absent.
fn required_downtime(
    kind: EventKind,
    downtime: &Option<Downtime>,
) -> Result<Downtime, ValidationError> {
    downtime
        .as_ref()
        .filter(|downtime| !downtime.is_empty())
        .cloned()
        .ok_or_else(|| ValidationError::missing(kind, "downtime"))
}

fn required_cert(
    kind: EventKind,
    field: &'static str,
    cert: &Option<Cert>,
) -> Result<Cert, ValidationError> {
    non_empty_cert(cert).ok_or_else(|| ValidationError::missing(kind, field))
}

/// An all-default certificate counts as absent.
fn non_empty_cert(cert: &Option<Cert>) -> Option<Cert> {
    cert.as_ref().filter(|cert| !cert.is_empty()).cloned()
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
