//! Operations and observability.
//!
//! - [`stats`] - Dispatch counters

pub mod stats;

pub use stats::{DispatchStats, StatsSnapshot};
