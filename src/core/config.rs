//! Configuration parsing and validation.
//!
//! memshard configuration is loaded from TOML files with CLI overrides.

use crate::routing::{Distribution, Host};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Largest key the ASCII protocol accepts.
pub const MAX_KEY_LENGTH: usize = 250;

/// Default size of one protocol command, in bytes.
pub const DEFAULT_COMMAND_SIZE: usize = 350;

/// Upper bound on attempts per command.
pub const MAX_REPLICAS: u32 = 16;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server pool.
    pub pool: PoolConfig,

    /// Network transport settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Wire protocol settings.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Logging configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Server pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Servers as `host[:port]`, in pool order.
    pub servers: Vec<String>,

    /// Number of attempts per command.
    #[serde(default = "default_replicas")]
    pub replicas: u32,

    /// Key distribution mode.
    #[serde(default)]
    pub distribution: Distribution,

    /// Run the key validator before dispatching.
    #[serde(default)]
    pub verify_key: bool,

    /// Seed for the key hasher.
    #[serde(default)]
    pub hash_seed: u64,
}

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Read/write timeout in milliseconds.
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

/// Wire protocol configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Capacity of the command and reply buffers.
    #[serde(default = "default_command_size")]
    pub command_size: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            command_size: default_command_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions

fn default_replicas() -> u32 {
    1
}

fn default_connect_timeout_ms() -> u64 {
    1_000
}

fn default_io_timeout_ms() -> u64 {
    1_000
}

fn default_command_size() -> usize {
    DEFAULT_COMMAND_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Config for the given servers with every other setting at its default.
    pub fn with_servers<I, S>(servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pool: PoolConfig {
                servers: servers.into_iter().map(Into::into).collect(),
                replicas: default_replicas(),
                distribution: Distribution::default(),
                verify_key: false,
                hash_seed: 0,
            },
            transport: TransportConfig::default(),
            protocol: ProtocolConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        if !overrides.servers.is_empty() {
            self.pool.servers = overrides.servers.clone();
        }
        if let Some(replicas) = overrides.replicas {
            self.pool.replicas = replicas;
        }
        if let Some(distribution) = overrides.distribution {
            self.pool.distribution = distribution;
        }
    }

    /// Parse the configured servers in pool order.
    pub fn hosts(&self) -> Result<Vec<Host>> {
        self.pool
            .servers
            .iter()
            .map(|s| Host::parse(s).with_context(|| format!("invalid server address: {}", s)))
            .collect()
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_pool()?;
        self.validate_transport()?;
        self.validate_protocol()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_pool(&self) -> Result<()> {
        if self.pool.servers.is_empty() {
            anyhow::bail!("pool.servers must list at least one server");
        }
        self.hosts()?;

        if self.pool.replicas == 0 {
            anyhow::bail!("pool.replicas must be > 0");
        }
        if self.pool.replicas > MAX_REPLICAS {
            anyhow::bail!(
                "pool.replicas must be at most {}, got: {}",
                MAX_REPLICAS,
                self.pool.replicas
            );
        }

        // Allowed, but extra attempts land on servers already tried.
        if self.pool.replicas as usize > self.pool.servers.len() {
            tracing::warn!(
                replicas = self.pool.replicas,
                servers = self.pool.servers.len(),
                "pool.replicas exceeds the number of servers"
            );
        }
        Ok(())
    }

    fn validate_transport(&self) -> Result<()> {
        if self.transport.connect_timeout_ms == 0 {
            anyhow::bail!("transport.connect_timeout_ms must be > 0");
        }
        if self.transport.io_timeout_ms == 0 {
            anyhow::bail!("transport.io_timeout_ms must be > 0");
        }
        Ok(())
    }

    fn validate_protocol(&self) -> Result<()> {
        let size = self.protocol.command_size;
        if !(16..=65_536).contains(&size) {
            anyhow::bail!(
                "protocol.command_size must be between 16 and 65536, got: {}",
                size
            );
        }
        Ok(())
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }
        Ok(())
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override log level.
    pub log_level: Option<String>,
    /// Replace the server list.
    pub servers: Vec<String>,
    /// Override the replica count.
    pub replicas: Option<u32>,
    /// Override the distribution mode.
    pub distribution: Option<Distribution>,
}
