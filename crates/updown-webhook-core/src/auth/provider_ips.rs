//! Resolution of the provider's outbound notification addresses.
//!
//! updown.io publishes the addresses its webhooks originate from behind a
//! single DNS name. The name is resolved once at startup; the resulting
//! [`ProviderIpSet`] is immutable and shared for the lifetime of the process.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, instrument};

// ============================================================================
// Host Resolution
// ============================================================================

/// DNS lookup abstraction
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `host` to all of its addresses
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system via tokio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHostResolver;

#[async_trait]
impl HostResolver for SystemHostResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addresses = tokio::net::lookup_host((host, 0)).await?;
        Ok(addresses.map(|address| address.ip()).collect())
    }
}

// ============================================================================
// Address Set
// ============================================================================

/// Set of addresses allowed to deliver webhooks
///
/// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are stored and looked up
/// in their IPv4 form, so either spelling matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderIpSet {
    addresses: BTreeSet<IpAddr>,
}

impl ProviderIpSet {
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.addresses.contains(&canonical(ip))
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpAddr> {
        self.addresses.iter()
    }
}

impl FromIterator<IpAddr> for ProviderIpSet {
    fn from_iter<I: IntoIterator<Item = IpAddr>>(iter: I) -> Self {
        Self {
            addresses: iter.into_iter().map(canonical).collect(),
        }
    }
}

fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Errors raised while building the provider address set
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Failed to resolve provider host '{host}': {source}")]
    Lookup {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("Provider host '{host}' resolved to no addresses")]
    NoAddresses { host: String },
}

/// Resolves the provider whitelist host into a [`ProviderIpSet`]
#[derive(Clone)]
pub struct ProviderIpResolver {
    resolver: Arc<dyn HostResolver>,
}

impl ProviderIpResolver {
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        Self { resolver }
    }

    /// Resolver that uses the system DNS configuration
    pub fn system() -> Self {
        Self::new(Arc::new(SystemHostResolver))
    }

    /// Resolve `host` once and build the immutable address set
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Lookup`] if the lookup fails and
    /// [`ResolveError::NoAddresses`] if it succeeds with an empty answer. Both
    /// are meant to abort startup.
    #[instrument(skip(self))]
    pub async fn resolve(&self, host: &str) -> Result<ProviderIpSet, ResolveError> {
        let addresses = self
            .resolver
            .lookup(host)
            .await
            .map_err(|source| ResolveError::Lookup {
                host: host.to_string(),
                source,
            })?;

        let set: ProviderIpSet = addresses.into_iter().collect();
        if set.is_empty() {
            return Err(ResolveError::NoAddresses {
                host: host.to_string(),
            });
        }

        let listed: Vec<String> = set.iter().map(ToString::to_string).collect();
        info!(
            host = %host,
            count = set.len(),
            addresses = ?listed,
            "Caching provider IP whitelist"
        );

        Ok(set)
    }
}

impl std::fmt::Debug for ProviderIpResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderIpResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "provider_ips_tests.rs"]
mod tests;
