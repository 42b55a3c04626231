//! Key routing: hashing, the consistent continuum and the server pool.
//!
//! A key is routed to a server index in one of two ways:
//!
//! - **Modula**: `server = hash(key) % host_count`
//! - **Consistent**: `server = continuum.lookup(hash(key))`, where the
//!   continuum holds a fixed number of hashed points per host
//!
//! The dispatcher never sees hosts directly, only the index returned here.

pub mod continuum;
pub mod hash;
pub mod pool;

pub use continuum::Continuum;
pub use hash::{KeyHasher, XxHasher};
pub use pool::{Distribution, Host, HostParseError, Pool, PoolView, DEFAULT_PORT};
