//! # Event Model
//!
//! Wire and typed representations of updown.io webhook events.
//!
//! updown.io posts a JSON array of events with every webhook call. Each event
//! carries an `event` tag selecting which of the optional payload objects must
//! be present:
//!
//! - [`WireEvent`] mirrors the JSON document exactly. Every payload object is
//!   optional and unknown tags are kept verbatim so they can be counted and
//!   rejected.
//! - [`Event`] is the validated form. Its [`EventPayload`] has one variant per
//!   [`EventKind`] and carries only the fields relevant to that kind.
//!
//! Conversion from the wire form to the typed form is the validation step, see
//! [`Event::try_from`] and [`WireEvent::validate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

mod check;
mod codec;
mod validation;

pub use check::Check;
pub use codec::{decode_batch, encode_batch, DecodeError};
pub use validation::ValidationError;

// ============================================================================
// Event Kinds
// ============================================================================

/// Discriminant of an updown.io webhook event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// `check.down`
    Down,
    /// `check.up`
    Up,
    /// `check.ssl_invalid`
    SslInvalid,
    /// `check.ssl_valid`
    SslValid,
    /// `check.ssl_expiration`
    SslExpiration,
    /// `check.ssl_renewed`
    SslRenewed,
    /// `check.performance_drop`
    PerformanceDrop,
}

impl EventKind {
    /// Every kind the provider is known to send
    pub const ALL: [EventKind; 7] = [
        Self::Down,
        Self::Up,
        Self::SslInvalid,
        Self::SslValid,
        Self::SslExpiration,
        Self::SslRenewed,
        Self::PerformanceDrop,
    ];

    /// Get the wire tag for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Down => "check.down",
            Self::Up => "check.up",
            Self::SslInvalid => "check.ssl_invalid",
            Self::SslValid => "check.ssl_valid",
            Self::SslExpiration => "check.ssl_expiration",
            Self::SslRenewed => "check.ssl_renewed",
            Self::PerformanceDrop => "check.performance_drop",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnrecognizedKind {
                kind: s.to_string(),
            })
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Read an explicit JSON `null` as the field's default value
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single event exactly as it appears in the request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    /// Raw event tag, e.g. `check.down`
    #[serde(rename = "event", default, deserialize_with = "null_as_default")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Check>,

    /// Only sent with `check.performance_drop`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apdex_dropped: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downtime: Option<Downtime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<Ssl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_metrics: Option<BTreeMap<DateTime<Utc>, Metric>>,
}

impl WireEvent {
    /// Parse the raw tag into a known kind
    pub fn kind(&self) -> Result<EventKind, ValidationError> {
        self.kind.parse()
    }

    /// Raw tag, used as the `event` label on metrics and logs
    pub fn kind_label(&self) -> &str {
        &self.kind
    }
}

/// Downtime details sent with `check.down` and `check.up`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Downtime {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    /// Duration in seconds, absent while the check is still down
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    /// Passed through untouched; updown.io does not document its shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<serde_json::Value>,
}

impl Downtime {
    /// True when every field holds its default value
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Certificate details sent with the `check.ssl_*` events
///
/// Depending on the kind either `cert` or `new_cert`/`old_cert` is populated:
/// `cert` for invalid, valid and expiration events, the pair for renewals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ssl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_before_expiration: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<Cert>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_cert: Option<Cert>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_cert: Option<Cert>,
}

/// A TLS certificate summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cert {
    #[serde(deserialize_with = "null_as_default")]
    pub subject: String,

    #[serde(deserialize_with = "null_as_default")]
    pub issuer: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,

    #[serde(alias = "To", skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "null_as_default")]
    pub algorithm: String,
}

impl Cert {
    /// True when every field holds its default value
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Apdex sample attached to `check.performance_drop`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metric {
    #[serde(deserialize_with = "null_as_default")]
    pub apdex: f32,
}

// ============================================================================
// Typed Events
// ============================================================================

/// A validated event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time: Option<DateTime<Utc>>,
    pub description: String,
    pub check: Option<Check>,
    pub payload: EventPayload,
}

impl Event {
    /// Kind selected by the payload
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// Kind-specific event data
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Down(Downtime),
    Up(Downtime),
    SslInvalid {
        cert: Cert,
        error: String,
    },
    SslValid {
        cert: Cert,
    },
    SslExpiration {
        cert: Cert,
        days_before_expiration: u32,
    },
    /// At least one of the two certificates is present.
    SslRenewed {
        new_cert: Option<Cert>,
        old_cert: Option<Cert>,
    },
    PerformanceDrop {
        apdex_dropped: String,
        last_metrics: BTreeMap<DateTime<Utc>, Metric>,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Down(_) => EventKind::Down,
            Self::Up(_) => EventKind::Up,
            Self::SslInvalid { .. } => EventKind::SslInvalid,
            Self::SslValid { .. } => EventKind::SslValid,
            Self::SslExpiration { .. } => EventKind::SslExpiration,
            Self::SslRenewed { .. } => EventKind::SslRenewed,
            Self::PerformanceDrop { .. } => EventKind::PerformanceDrop,
        }
    }
}

impl From<Event> for WireEvent {
    fn from(event: Event) -> Self {
        let mut wire = WireEvent {
            kind: event.kind().as_str().to_string(),
            time: event.time,
            description: event.description,
            check: event.check,
            ..Default::default()
        };

        match event.payload {
            EventPayload::Down(downtime) | EventPayload::Up(downtime) => {
                wire.downtime = Some(downtime);
            }
            EventPayload::SslInvalid { cert, error } => {
                wire.ssl = Some(Ssl {
                    cert: Some(cert),
                    error: Some(error),
                    ..Default::default()
                });
            }
            EventPayload::SslValid { cert } => {
                wire.ssl = Some(Ssl {
                    cert: Some(cert),
                    ..Default::default()
                });
            }
            EventPayload::SslExpiration {
                cert,
                days_before_expiration,
            } => {
                wire.ssl = Some(Ssl {
                    cert: Some(cert),
                    days_before_expiration: Some(days_before_expiration),
                    ..Default::default()
                });
            }
            EventPayload::SslRenewed { new_cert, old_cert } => {
                wire.ssl = Some(Ssl {
                    new_cert,
                    old_cert,
                    ..Default::default()
                });
            }
            EventPayload::PerformanceDrop {
                apdex_dropped,
                last_metrics,
            } => {
                wire.apdex_dropped = Some(apdex_dropped);
                wire.last_metrics = Some(last_metrics);
            }
        }

        wire
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
