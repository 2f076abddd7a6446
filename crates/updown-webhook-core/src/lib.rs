//! # updown-webhook Core
//!
//! Domain logic for receiving updown.io webhook notifications.
//!
//! This crate decides whether a request comes from updown.io, decodes the
//! event batch it carries, validates each event against the payload its kind
//! requires and reports the outcome through logs and counters.
//!
//! ## Architecture
//!
//! - [`auth`]: provider address resolution and request authentication
//! - [`event`]: wire and typed event model, batch codec and validation
//! - [`dispatch`]: per-batch processing driving validation, logging and metrics
//! - [`monitoring`]: the metrics trait implemented by the infrastructure layer
//!
//! Nothing here knows about HTTP frameworks or Prometheus; those live in the
//! api crate.
//!
//! ## Usage
//!
//! ```rust
//! use updown_webhook_core::{decode_batch, EventDispatcher, NoOpEventMetrics};
//! use std::sync::Arc;
//!
//! let body = br#"[{"event":"check.up","downtime":{"id":"d1","duration":600}}]"#;
//! let batch = decode_batch(body).unwrap();
//!
//! let dispatcher = EventDispatcher::new("webhook", Arc::new(NoOpEventMetrics));
//! assert!(dispatcher.process(&batch).is_ok());
//! ```

pub mod auth;
pub mod dispatch;
pub mod event;
pub mod monitoring;

pub use auth::{
    AuthenticationError, HostResolver, ProviderIpResolver, ProviderIpSet, RequestAuthenticator,
    RequestHeaders, ResolveError, PROVIDER_USER_AGENT, PROVIDER_WHITELIST_HOST,
};
pub use dispatch::{BatchError, EventDispatcher, PROCESS_EVENTS_HANDLER};
pub use event::{
    decode_batch, encode_batch, Cert, Check, DecodeError, Downtime, Event, EventKind,
    EventPayload, Metric, Ssl, ValidationError, WireEvent,
};
pub use monitoring::{CounterLabels, EventMetrics, NoOpEventMetrics};
