//! Server pool and the read-only view the dispatcher consumes.

use super::continuum::Continuum;
use super::hash::{KeyHasher, XxHasher};
use crate::core::config::{Config, MAX_REPLICAS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Default memcached port.
pub const DEFAULT_PORT: u16 = 11211;

/// How keys are spread across the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// `hash % host_count`.
    #[default]
    Modula,
    /// Continuum lookup; fail-over walks the ring.
    Consistent,
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Distribution::Modula => write!(f, "modula"),
            Distribution::Consistent => write!(f, "consistent"),
        }
    }
}

impl std::str::FromStr for Distribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "modula" => Ok(Distribution::Modula),
            "consistent" => Ok(Distribution::Consistent),
            other => Err(format!("unknown distribution: {}", other)),
        }
    }
}

/// Invalid `host[:port]` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostParseError {
    #[error("empty host name")]
    EmptyHost,
    #[error("invalid port: {0}")]
    InvalidPort(String),
    #[error("unterminated IPv6 literal")]
    UnterminatedBracket,
}

/// One cache server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    pub hostname: String,
    pub port: u16,
}

impl Host {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }

    /// Parse `host`, `host:port`, `[v6]` or `[v6]:port`.
    pub fn parse(s: &str) -> Result<Self, HostParseError> {
        let s = s.trim();
        let (hostname, port) = if let Some(rest) = s.strip_prefix('[') {
            let end = rest.find(']').ok_or(HostParseError::UnterminatedBracket)?;
            let port = match rest[end + 1..].strip_prefix(':') {
                Some(port) => Some(port),
                None if rest[end + 1..].is_empty() => None,
                None => return Err(HostParseError::InvalidPort(rest[end + 1..].to_string())),
            };
            (&rest[..end], port)
        } else if s.matches(':').count() == 1 {
            let (host, port) = s.split_once(':').unwrap_or((s, ""));
            (host, Some(port))
        } else {
            (s, None)
        };

        if hostname.is_empty() {
            return Err(HostParseError::EmptyHost);
        }
        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| HostParseError::InvalidPort(p.to_string()))?,
            None => DEFAULT_PORT,
        };
        Ok(Self::new(hostname, port))
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hostname.contains(':') {
            write!(f, "[{}]:{}", self.hostname, self.port)
        } else {
            write!(f, "{}:{}", self.hostname, self.port)
        }
    }
}

/// Read-only view of a server pool.
///
/// The dispatcher only needs counts, modes and the initial server for a key;
/// it never touches hosts.
pub trait PoolView {
    /// Number of servers.
    fn host_count(&self) -> usize;

    /// Distribution mode.
    fn distribution(&self) -> Distribution;

    /// Attempts per command.
    fn replica_count(&self) -> u32;

    /// Whether keys go through the validator before dispatch.
    fn verify_key(&self) -> bool;

    /// Index of the server that owns `key`. Only called on non-empty pools.
    fn server_for_key(&self, key: &[u8]) -> usize;
}

/// Immutable pool snapshot.
#[derive(Debug, Clone)]
pub struct Pool {
    hosts: Vec<Host>,
    replicas: u32,
    distribution: Distribution,
    verify_key: bool,
    hasher: Arc<dyn KeyHasher>,
    continuum: Continuum,
}

impl Pool {
    /// Create a pool with one replica and no key verification.
    pub fn new(hosts: Vec<Host>, distribution: Distribution) -> Self {
        let hasher: Arc<dyn KeyHasher> = Arc::new(XxHasher::default());
        let continuum = Self::continuum_for(&hosts, distribution, hasher.as_ref());
        Self {
            hosts,
            replicas: 1,
            distribution,
            verify_key: false,
            hasher,
            continuum,
        }
    }

    /// Build the pool described by a config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let hosts = config.hosts()?;
        Ok(Self::new(hosts, config.pool.distribution)
            .with_hasher(Arc::new(XxHasher::with_seed(config.pool.hash_seed)))
            .with_replicas(config.pool.replicas)
            .with_verify_key(config.pool.verify_key))
    }

    /// Set the replica count, clamped to `1..=MAX_REPLICAS`.
    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas.clamp(1, MAX_REPLICAS);
        self
    }

    pub fn with_verify_key(mut self, verify_key: bool) -> Self {
        self.verify_key = verify_key;
        self
    }

    /// Replace the key hasher, rebuilding the continuum.
    pub fn with_hasher(mut self, hasher: Arc<dyn KeyHasher>) -> Self {
        self.continuum = Self::continuum_for(&self.hosts, self.distribution, hasher.as_ref());
        self.hasher = hasher;
        self
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn host(&self, index: usize) -> Option<&Host> {
        self.hosts.get(index)
    }

    fn continuum_for(
        hosts: &[Host],
        distribution: Distribution,
        hasher: &dyn KeyHasher,
    ) -> Continuum {
        match distribution {
            Distribution::Consistent => Continuum::build(hosts, hasher),
            Distribution::Modula => Continuum::default(),
        }
    }
}

impl PoolView for Pool {
    fn host_count(&self) -> usize {
        self.hosts.len()
    }

    fn distribution(&self) -> Distribution {
        self.distribution
    }

    fn replica_count(&self) -> u32 {
        self.replicas
    }

    fn verify_key(&self) -> bool {
        self.verify_key
    }

    fn server_for_key(&self, key: &[u8]) -> usize {
        let count = self.hosts.len();
        if count <= 1 {
            return 0;
        }

        let hash = self.hasher.hash(key);
        match self.distribution {
            Distribution::Modula => hash as usize % count,
            Distribution::Consistent => self
                .continuum
                .lookup(hash)
                .unwrap_or(hash as usize % count),
        }
    }
}
