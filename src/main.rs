//! memshard - CLI entrypoint.
//!
//! Usage:
//!   memshard --server 127.0.0.1:11211 incr page:views
//!   memshard --config memshard.toml decr stock:42 5
//!   memshard --config memshard.toml route user:1 user:2
//!   memshard --config memshard.toml config show --format json

use anyhow::Result;
use clap::Parser;
use memshard::cli::commands::{init_tracing, load_config, run_arith, run_config, run_route};
use memshard::cli::{Cli, Commands};
use memshard::protocol::Verb;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = cli.overrides();
    let config = load_config(cli.config.as_deref().map(Path::new), &overrides)?;
    init_tracing(&config.telemetry.log_level);

    match cli.command {
        Commands::Incr(args) => run_arith(Verb::Incr, args, &config),
        Commands::Decr(args) => run_arith(Verb::Decr, args, &config),
        Commands::Route(args) => run_route(args, &config),
        Commands::Config(args) => run_config(args, &config),
    }
}
