//! Command-line interface.
//!
//! Thin front end over [`crate::Client`] for poking at a pool by hand.

pub mod commands;

use crate::core::config::ConfigOverrides;
use crate::routing::Distribution;
use clap::{Parser, Subcommand};

/// memshard - replicated incr/decr against a memcached pool.
#[derive(Parser, Debug)]
#[command(name = "memshard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Server as host[:port]; repeat to build a pool without a config file.
    #[arg(short, long = "server", global = true)]
    pub servers: Vec<String>,

    /// Attempts per command.
    #[arg(long, global = true)]
    pub replicas: Option<u32>,

    /// Key distribution (modula, consistent).
    #[arg(long, global = true)]
    pub distribution: Option<Distribution>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Config overrides from the global flags.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            log_level: self.log_level.clone(),
            servers: self.servers.clone(),
            replicas: self.replicas,
            distribution: self.distribution,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Increment a counter.
    Incr(commands::ArithArgs),
    /// Decrement a counter.
    Decr(commands::ArithArgs),
    /// Show which server a key routes to.
    Route(commands::RouteArgs),
    /// Configuration operations.
    Config(commands::ConfigArgs),
}
