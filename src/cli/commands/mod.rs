//! CLI command implementations.

mod arith;
mod config;
mod route;

pub use arith::{run_arith, ArithArgs};
pub use config::{run_config, ConfigArgs};
pub use route::{run_route, RouteArgs};

use crate::core::config::{Config, ConfigOverrides};
use anyhow::Result;
use std::path::Path;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "memshard.toml";

/// Resolve the configuration from a file, the default file or `--server` flags.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config> {
    load_config_with_default(path, Path::new(DEFAULT_CONFIG_PATH), overrides)
}

/// [`load_config`] with the fallback file at `default_path`.
pub fn load_config_with_default(
    path: Option<&Path>,
    default_path: &Path,
    overrides: &ConfigOverrides,
) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None if default_path.exists() => Config::from_file(default_path)?,
        None if !overrides.servers.is_empty() => Config::with_servers(overrides.servers.clone()),
        None => anyhow::bail!(
            "no configuration: pass --config <file> or at least one --server <host:port>"
        ),
    };
    config.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}

/// Initialize the tracing subscriber if the telemetry feature is enabled.
#[cfg(feature = "telemetry")]
pub fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[cfg(not(feature = "telemetry"))]
pub fn init_tracing(_level: &str) {}
