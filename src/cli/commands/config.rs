//! Config command implementation.

use crate::core::config::Config;
use anyhow::Result;
use clap::{Args, Subcommand};

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the resolved configuration.
    Validate,
    /// Print the resolved configuration with defaults filled in.
    Show {
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
}

/// Run the config command on an already resolved configuration.
pub fn run_config(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.command {
        ConfigCommand::Validate => validate_config(config),
        ConfigCommand::Show { format } => show_config(config, &format),
    }
}

fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;
    let hosts = config.hosts()?;
    println!("✓ Configuration is valid");
    println!("  servers:      {}", hosts.len());
    println!("  replicas:     {}", config.pool.replicas);
    println!("  distribution: {}", config.pool.distribution);
    if config.pool.replicas as usize > hosts.len() {
        println!("  ⚠ Warning: replicas exceeds the number of servers");
    }
    Ok(())
}

fn show_config(config: &Config, format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(config)?),
        _ => print!("{}", toml::to_string_pretty(config)?),
    }
    Ok(())
}
