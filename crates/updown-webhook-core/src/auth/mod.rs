//! # Request Authentication
//!
//! Decides whether an incoming request genuinely comes from updown.io.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. `User-Agent` must be present and one of its values must contain the
//!    provider marker.
//! 2. The first `X-Forwarded-For` entry must parse as an IP address that is a
//!    member of the resolved [`ProviderIpSet`]. Later entries are ignored.
//! 3. The method must be `POST`.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::warn;

mod provider_ips;

pub use provider_ips::{
    HostResolver, ProviderIpResolver, ProviderIpSet, ResolveError, SystemHostResolver,
};

/// User-Agent fragment sent by the provider
pub const PROVIDER_USER_AGENT: &str = "updown.io";

/// DNS name listing the provider's notification addresses
pub const PROVIDER_WHITELIST_HOST: &str = "ips.updown.io";

const USER_AGENT: &str = "user-agent";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

// ============================================================================
// Headers
// ============================================================================

/// Case-insensitive multi-map of request headers
///
/// Repeated headers keep every value in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    values: BTreeMap<String, Vec<String>>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for `name`, keeping earlier values
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// All values for `name`, empty when the header is absent
    pub fn get_all(&self, name: &str) -> &[String] {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }
}

impl<N, V> FromIterator<(N, V)> for RequestHeaders
where
    N: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value);
        }
        headers
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Reasons a request is refused before its body is looked at
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Missing User-Agent header")]
    MissingUserAgent,

    #[error("User-Agent {values:?} does not identify {expected}")]
    UnexpectedUserAgent {
        expected: String,
        values: Vec<String>,
    },

    #[error("Missing X-Forwarded-For header")]
    MissingForwardedFor,

    #[error("X-Forwarded-For header has no entries")]
    EmptyForwardedFor,

    #[error("X-Forwarded-For entry '{value}' is not an IP address")]
    InvalidForwardedFor { value: String },

    #[error("Address {ip} is not a provider address")]
    ForbiddenAddress { ip: IpAddr },

    #[error("Method {method} is not allowed")]
    MethodNotAllowed { method: String },
}

impl AuthenticationError {
    /// True when the request was refused only because of its method
    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, Self::MethodNotAllowed { .. })
    }
}

// ============================================================================
// Authenticator
// ============================================================================

/// Header, origin and method checks for webhook requests
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    provider_ips: Arc<ProviderIpSet>,
    user_agent_marker: String,
}

impl RequestAuthenticator {
    pub fn new(provider_ips: Arc<ProviderIpSet>) -> Self {
        Self {
            provider_ips,
            user_agent_marker: PROVIDER_USER_AGENT.to_string(),
        }
    }

    /// Replace the User-Agent fragment that identifies the provider
    pub fn with_user_agent_marker(mut self, marker: impl Into<String>) -> Self {
        self.user_agent_marker = marker.into();
        self
    }

    pub fn provider_ips(&self) -> &ProviderIpSet {
        &self.provider_ips
    }

    /// Run all checks against a request
    ///
    /// # Errors
    ///
    /// Returns the first failing check. Only
    /// [`AuthenticationError::MethodNotAllowed`] maps to 405; every other
    /// variant is a bad request.
    pub fn authenticate(
        &self,
        method: &str,
        headers: &RequestHeaders,
    ) -> Result<(), AuthenticationError> {
        let result = self
            .check_user_agent(headers)
            .and_then(|_| self.check_forwarded_for(headers))
            .and_then(|_| check_method(method));

        if let Err(error) = &result {
            warn!(error = %error, method = %method, "Rejected webhook request");
        }

        result
    }

    fn check_user_agent(&self, headers: &RequestHeaders) -> Result<(), AuthenticationError> {
        let values = headers.get_all(USER_AGENT);
        if values.is_empty() {
            return Err(AuthenticationError::MissingUserAgent);
        }

        if values
            .iter()
            .any(|value| value.contains(self.user_agent_marker.as_str()))
        {
            Ok(())
        } else {
            Err(AuthenticationError::UnexpectedUserAgent {
                expected: self.user_agent_marker.clone(),
                values: values.to_vec(),
            })
        }
    }

    fn check_forwarded_for(&self, headers: &RequestHeaders) -> Result<(), AuthenticationError> {
        let first_line = headers
            .get(X_FORWARDED_FOR)
            .ok_or(AuthenticationError::MissingForwardedFor)?;

        // proxies append, so only the first hop is the original client
        let first = first_line.split(',').next().unwrap_or_default().trim();
        if first.is_empty() {
            return Err(AuthenticationError::EmptyForwardedFor);
        }

        let ip: IpAddr = first
            .parse()
            .map_err(|_| AuthenticationError::InvalidForwardedFor {
                value: first.to_string(),
            })?;

        if self.provider_ips.contains(ip) {
            Ok(())
        } else {
            Err(AuthenticationError::ForbiddenAddress { ip })
        }
    }
}

fn check_method(method: &str) -> Result<(), AuthenticationError> {
    if method == "POST" {
        Ok(())
    } else {
        Err(AuthenticationError::MethodNotAllowed {
            method: method.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
