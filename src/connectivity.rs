// MIT License - Copyright (c) 2026 Peter Wright
// Connectivity gate

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Why a name lookup failed.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Host not found: {host}")]
    HostNotFound { host: String },

    #[error("Resolver error: {0}")]
    Other(#[from] io::Error),
}

/// Name resolution, split out so the gate can be driven without a network.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, host: &str) -> std::result::Result<(), ResolveError>;
}

/// Resolver backed by the system's `getaddrinfo` via tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str) -> std::result::Result<(), ResolveError> {
        match tokio::net::lookup_host((host, 443)).await {
            Ok(mut addrs) => {
                if addrs.next().is_some() {
                    Ok(())
                } else {
                    Err(ResolveError::HostNotFound { host: host.to_string() })
                }
            }
            Err(e) if is_host_not_found(&e) => {
                Err(ResolveError::HostNotFound { host: host.to_string() })
            }
            Err(e) => Err(ResolveError::Other(e)),
        }
    }
}

/// Whether a lookup error means the name does not resolve at all
/// (`EAI_NONAME` and friends), as opposed to a resolver hiccup.
fn is_host_not_found(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::NotFound {
        return true;
    }
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("name or service not known")
        || msg.contains("nodename nor servname")
        || msg.contains("no such host")
        || msg.contains("host not found")
}

/// Reports whether the remote service's host is currently resolvable.
///
/// Only a definite "host not found" counts as unreachable. Every other
/// failure, including a lookup that outlives its timeout, is treated as
/// reachable so a flaky resolver does not take the accessory offline.
#[derive(Clone)]
pub struct ConnectivityGate {
    host: String,
    lookup_timeout: Duration,
    resolver: Arc<dyn Resolver>,
}

impl ConnectivityGate {
    pub fn new(host: impl Into<String>, lookup_timeout: Duration) -> Self {
        Self::with_resolver(host, lookup_timeout, Arc::new(SystemResolver))
    }

    pub fn with_resolver(
        host: impl Into<String>,
        lookup_timeout: Duration,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        Self {
            host: host.into(),
            lookup_timeout,
            resolver,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn is_reachable(&self) -> bool {
        match timeout(self.lookup_timeout, self.resolver.resolve(&self.host)).await {
            Ok(Ok(())) => true,
            Ok(Err(ResolveError::HostNotFound { host })) => {
                warn!("Unable to reach Yale servers: {host} does not resolve");
                false
            }
            Ok(Err(e)) => {
                debug!("Connectivity check inconclusive, assuming reachable: {e}");
                true
            }
            Err(_) => {
                debug!(
                    "Connectivity check for {} timed out after {:?}, assuming reachable",
                    self.host, self.lookup_timeout
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Outcome {
        Ok,
        NotFound,
        Refused,
        Hang,
    }

    struct FakeResolver(Outcome);

    #[async_trait]
    impl Resolver for FakeResolver {
        async fn resolve(&self, host: &str) -> std::result::Result<(), ResolveError> {
            match self.0 {
                Outcome::Ok => Ok(()),
                Outcome::NotFound => Err(ResolveError::HostNotFound { host: host.to_string() }),
                Outcome::Refused => Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into()),
                Outcome::Hang => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
            }
        }
    }

    fn gate(outcome: Outcome) -> ConnectivityGate {
        ConnectivityGate::with_resolver(
            "mob.yalehomesystem.co.uk",
            Duration::from_secs(5),
            Arc::new(FakeResolver(outcome)),
        )
    }

    #[tokio::test]
    async fn test_resolvable_host_is_reachable() {
        assert!(gate(Outcome::Ok).is_reachable().await);
    }

    #[tokio::test]
    async fn test_host_not_found_is_unreachable() {
        assert!(!gate(Outcome::NotFound).is_reachable().await);
    }

    #[tokio::test]
    async fn test_other_resolver_errors_are_reachable() {
        assert!(gate(Outcome::Refused).is_reachable().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_lookup_is_reachable() {
        assert!(gate(Outcome::Hang).is_reachable().await);
    }

    #[test]
    fn test_host_not_found_classification() {
        let nonname = io::Error::other("failed to lookup address information: Name or service not known");
        assert!(is_host_not_found(&nonname));
        let macos = io::Error::other("failed to lookup address information: nodename nor servname provided, or not known");
        assert!(is_host_not_found(&macos));
        let again = io::Error::other("failed to lookup address information: Temporary failure in name resolution");
        assert!(!is_host_not_found(&again));
    }
}
