//! memshard - replica-aware request dispatch for sharded memcached clients.
//!
//! memshard sends single-key arithmetic commands (`incr`, `decr`) to a pool of
//! independent memcached servers speaking the ASCII protocol. It picks the
//! server for a key, frames the command into a bounded buffer, reads and
//! classifies the reply, and when replicas are configured retries across
//! servers and decides overall success.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Client / CLI                             │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Command Dispatcher                        │
//! │  validate → frame → (send → receive → classify)* → aggregate │
//! └──────────────────────────────────────────────────────────────┘
//!        │                  │                      │
//! ┌──────────────┐  ┌───────────────┐  ┌──────────────────────────┐
//! │ Key validator│  │ Pool + hasher │  │ Transport (TCP or other) │
//! └──────────────┘  └───────────────┘  └──────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::error`] - Error types and return codes
//! - [`routing`] - Hashing, continuum and the server pool
//! - [`protocol`] - ASCII command framing and reply classification
//! - [`net`] - Transport trait and the blocking TCP transport
//! - [`dispatch`] - Fail-over loop and result aggregation
//! - [`ops::stats`] - Dispatch counters
//! - [`cli`] - CLI command implementations
//!
//! # Example
//!
//! ```no_run
//! use memshard::{Client, Config};
//!
//! let config = Config::with_servers(["127.0.0.1:11211"]);
//! let client = Client::from_config(&config)?;
//! let views = client.increment("page:views", 1)?;
//! println!("{}", views);
//! # Ok::<(), anyhow::Error>(())
//! ```

// Core infrastructure
pub mod core;

// Key routing
pub mod routing;

// Wire protocol
pub mod protocol;

// Networking
pub mod net;

// Dispatch core
pub mod dispatch;

// Client handle
pub mod client;

// Operations and observability
pub mod ops;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, error};
pub use client::Client;
pub use config::Config;
pub use dispatch::{Dispatcher, KeyValidator};
pub use error::{ClientError, ClientResult, ReturnCode, TransportError};
pub use net::Transport;
pub use protocol::Verb;
pub use routing::{Distribution, Host, Pool, PoolView};
