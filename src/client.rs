//! Client handle.
//!
//! Bundles a pool snapshot with a dispatcher behind a mutex so one handle can
//! be shared between threads. The dispatcher itself never locks.

use crate::core::config::Config;
use crate::core::error::ClientResult;
use crate::dispatch::Dispatcher;
use crate::net::{TcpTransport, Transport};
use crate::ops::stats::StatsSnapshot;
use crate::routing::{Host, Pool, PoolView};
use anyhow::Result;
use parking_lot::Mutex;

/// Shared client for arithmetic commands.
pub struct Client<T = TcpTransport> {
    pool: Pool,
    dispatcher: Mutex<Dispatcher<T>>,
}

impl Client<TcpTransport> {
    /// Build a TCP client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pool = Pool::from_config(config)?;
        let transport = TcpTransport::from_config(config)?;
        tracing::info!(
            servers = pool.host_count(),
            replicas = pool.replica_count(),
            distribution = %pool.distribution(),
            "client configured"
        );
        Ok(Self::with_transport(
            pool,
            transport,
            config.protocol.command_size,
        ))
    }
}

impl<T: Transport> Client<T> {
    /// Build a client over any transport.
    pub fn with_transport(pool: Pool, transport: T, command_size: usize) -> Self {
        Self {
            pool,
            dispatcher: Mutex::new(Dispatcher::with_command_size(transport, command_size)),
        }
    }

    /// Increment `key` by `offset`; returns the new value.
    pub fn increment(&self, key: impl AsRef<[u8]>, offset: u32) -> ClientResult<u64> {
        self.dispatcher
            .lock()
            .increment(&self.pool, key.as_ref(), offset)
    }

    /// Decrement `key` by `offset`; returns the new value.
    pub fn decrement(&self, key: impl AsRef<[u8]>, offset: u32) -> ClientResult<u64> {
        self.dispatcher
            .lock()
            .decrement(&self.pool, key.as_ref(), offset)
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Server a key is first sent to, or `None` for an empty pool.
    pub fn server_for_key(&self, key: impl AsRef<[u8]>) -> Option<&Host> {
        if self.pool.host_count() == 0 {
            return None;
        }
        self.pool.host(self.pool.server_for_key(key.as_ref()))
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.dispatcher.lock().stats().snapshot()
    }
}
