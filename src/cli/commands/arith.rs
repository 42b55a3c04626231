//! incr / decr command implementation.

use crate::client::Client;
use crate::core::config::Config;
use crate::protocol::Verb;
use anyhow::Result;
use clap::Args;
use serde_json::json;

/// Arguments for `incr` and `decr`.
#[derive(Args, Debug)]
pub struct ArithArgs {
    /// Counter key.
    pub key: String,

    /// Amount to add or subtract.
    #[arg(default_value_t = 1)]
    pub offset: u32,

    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Print dispatch counters after the command.
    #[arg(long)]
    pub stats: bool,
}

/// Run an arithmetic command against the configured pool.
pub fn run_arith(verb: Verb, args: ArithArgs, config: &Config) -> Result<()> {
    let client = Client::from_config(config)?;
    let server = client.server_for_key(&args.key).map(|h| h.to_string());

    let result = match verb {
        Verb::Incr => client.increment(&args.key, args.offset),
        Verb::Decr => client.decrement(&args.key, args.offset),
    };

    match args.format.as_str() {
        "json" => {
            let body = match &result {
                Ok(value) => json!({
                    "verb": verb.as_str(),
                    "key": args.key,
                    "server": server,
                    "code": "SUCCESS",
                    "value": value,
                }),
                Err(e) => json!({
                    "verb": verb.as_str(),
                    "key": args.key,
                    "server": server,
                    "code": e.code().as_str(),
                    "error": e.to_string(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            if let Ok(value) = &result {
                println!("{}", value);
            }
        }
    }

    if args.stats {
        for (name, value) in client.stats().as_pairs() {
            eprintln!("{} {}", name, value);
        }
    }

    result
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!("{} failed ({}): {}", verb, e.code(), e))
}
