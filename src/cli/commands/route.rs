//! Route command implementation.

use crate::core::config::Config;
use crate::routing::{Pool, PoolView};
use anyhow::Result;
use clap::Args;
use serde_json::json;

/// Show which server a key routes to.
#[derive(Args, Debug)]
pub struct RouteArgs {
    /// Keys to route.
    #[arg(required = true)]
    pub keys: Vec<String>,

    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Run the route command.
pub fn run_route(args: RouteArgs, config: &Config) -> Result<()> {
    let pool = Pool::from_config(config)?;

    let routes: Vec<(String, usize, String)> = args
        .keys
        .iter()
        .map(|key| {
            let index = pool.server_for_key(key.as_bytes());
            let host = pool
                .host(index)
                .map(|h| h.to_string())
                .unwrap_or_default();
            (key.clone(), index, host)
        })
        .collect();

    match args.format.as_str() {
        "json" => {
            let body: Vec<_> = routes
                .iter()
                .map(|(key, index, host)| json!({ "key": key, "index": index, "server": host }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            println!(
                "distribution: {}  replicas: {}",
                pool.distribution(),
                pool.replica_count()
            );
            for (key, index, host) in &routes {
                println!("  {} -> [{}] {}", key, index, host);
            }
        }
    }
    Ok(())
}
