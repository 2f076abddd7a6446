//! Snapshot of the monitored check embedded in each event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of an updown.io check at the time the event was emitted
///
/// Carried through unchanged; only the URL is read, for logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Check {
    #[serde(deserialize_with = "super::null_as_default")]
    pub token: String,

    #[serde(deserialize_with = "super::null_as_default")]
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<f32>,

    #[serde(deserialize_with = "super::null_as_default")]
    pub down: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_since: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Interval between checks in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub apdex_t: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_match: Option<String>,

    #[serde(deserialize_with = "super::null_as_default")]
    pub enabled: bool,

    #[serde(deserialize_with = "super::null_as_default")]
    pub published: bool,

    #[serde(deserialize_with = "super::null_as_default")]
    pub disabled_locations: Vec<String>,

    #[serde(deserialize_with = "super::null_as_default")]
    pub recipients: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_check_at: Option<DateTime<Utc>>,

    /// Either a timestamp or a keyword such as `recovery`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute_until: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,

    #[serde(deserialize_with = "super::null_as_default")]
    pub custom_headers: BTreeMap<String, serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_verb: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_body: Option<String>,
}
