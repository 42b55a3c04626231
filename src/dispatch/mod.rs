//! Command dispatch.
//!
//! A dispatch call runs a fixed sequence with no state carried between calls:
//!
//! ```text
//! VALIDATE → FRAME → (maybe ADVANCE → SEND → RECEIVE → CLASSIFY)* → AGGREGATE
//! ```
//!
//! # Fail-over
//!
//! The command is attempted once per replica, at most [`MAX_REPLICAS`] times.
//! Every attempt records its outcome; transport failures, `ERROR` and
//! `NOT_FOUND` do not stop the loop.
//! Under the consistent distribution every attempt whose zero-based index is
//! greater than 1 first moves one server along the ring (with wrap-around), so
//! a three-replica call visits `[h, h, h + 1]`. The modula distribution never
//! moves off the hashed server.
//!
//! # Aggregation
//!
//! The most recent attempt that returned a value wins. When no attempt did,
//! the first attempt's outcome is reported.

pub mod validate;

pub use validate::{AsciiKeyValidator, KeyValidator};

use crate::core::config::{DEFAULT_COMMAND_SIZE, MAX_REPLICAS};
use crate::core::error::{ClientError, ClientResult, TransportError};
use crate::net::Transport;
use crate::ops::stats::DispatchStats;
use crate::protocol::{classify_reply, CommandFrame, Reply, ReplyLine, Verb};
use crate::routing::{Distribution, PoolView};
use std::sync::Arc;

/// Outcome of one replica attempt.
#[derive(Debug)]
pub enum ReplyOutcome {
    /// The server returned a value.
    Stored(u64),
    /// `NOT_FOUND`.
    NotFound,
    /// `ERROR`.
    ProtocolError,
    /// The send or the receive failed.
    Transport(TransportError),
}

impl ReplyOutcome {
    /// Value confirmed by the server, if any.
    pub fn stored_value(&self) -> Option<u64> {
        match self {
            ReplyOutcome::Stored(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert into the caller-facing result.
    pub fn into_result(self) -> ClientResult<u64> {
        match self {
            ReplyOutcome::Stored(v) => Ok(v),
            ReplyOutcome::NotFound => Err(ClientError::NotFound),
            ReplyOutcome::ProtocolError => Err(ClientError::ProtocolError),
            ReplyOutcome::Transport(e) => Err(ClientError::Transport(e)),
        }
    }
}

impl From<Reply> for ReplyOutcome {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::ProtocolError => ReplyOutcome::ProtocolError,
            Reply::NotFound => ReplyOutcome::NotFound,
            Reply::Value(v) => ReplyOutcome::Stored(v),
        }
    }
}

/// One replica attempt.
#[derive(Debug)]
pub struct Attempt {
    pub server_index: usize,
    pub outcome: ReplyOutcome,
}

/// Next server on the ring, wrapping from the last to the first.
pub fn next_server(index: usize, host_count: usize) -> usize {
    if index + 1 >= host_count {
        0
    } else {
        index + 1
    }
}

/// Running reduction of replica outcomes.
///
/// Keeps the first outcome and the most recent stored value; nothing else is
/// needed to pick the call's result.
#[derive(Debug, Default)]
pub struct Outcomes {
    first: Option<ReplyOutcome>,
    latest_value: Option<u64>,
    count: usize,
}

impl Outcomes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the next attempt's outcome.
    pub fn record(&mut self, outcome: ReplyOutcome) {
        self.count += 1;
        if let Some(value) = outcome.stored_value() {
            self.latest_value = Some(value);
        }
        if self.first.is_none() {
            self.first = Some(outcome);
        }
    }

    /// Number of outcomes recorded.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The latest stored value, else the first outcome.
    pub fn finish(self) -> ClientResult<u64> {
        if let Some(value) = self.latest_value {
            return Ok(value);
        }
        match self.first {
            Some(first) => first.into_result(),
            // Only reachable with zero attempts, which the loop never produces.
            None => Err(ClientError::NoServers),
        }
    }
}

/// Reduce recorded attempts to one result.
///
/// The newest stored value wins; otherwise the first attempt is reported.
pub fn aggregate(attempts: impl IntoIterator<Item = Attempt>) -> ClientResult<u64> {
    let mut outcomes = Outcomes::new();
    for attempt in attempts {
        outcomes.record(attempt.outcome);
    }
    outcomes.finish()
}

/// Dispatches arithmetic commands across a replicated pool.
///
/// Holds the transport, the key validator and the bounded command and reply
/// buffers; calls take `&mut self` so each call has exclusive use of them.
pub struct Dispatcher<T, V = AsciiKeyValidator> {
    transport: T,
    validator: V,
    frame: CommandFrame,
    reply: ReplyLine,
    stats: Arc<DispatchStats>,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher with the default command size and validator.
    pub fn new(transport: T) -> Self {
        Self::with_command_size(transport, DEFAULT_COMMAND_SIZE)
    }

    /// Create a dispatcher whose command and reply buffers hold `command_size` bytes.
    pub fn with_command_size(transport: T, command_size: usize) -> Self {
        Self {
            transport,
            validator: AsciiKeyValidator,
            frame: CommandFrame::with_capacity(command_size),
            reply: ReplyLine::with_capacity(command_size),
            stats: Arc::new(DispatchStats::new()),
        }
    }
}

impl<T: Transport, V: KeyValidator> Dispatcher<T, V> {
    /// Replace the key validator.
    pub fn with_validator<W: KeyValidator>(self, validator: W) -> Dispatcher<T, W> {
        Dispatcher {
            transport: self.transport,
            validator,
            frame: self.frame,
            reply: self.reply,
            stats: self.stats,
        }
    }

    /// Share an existing stats block.
    pub fn with_stats(mut self, stats: Arc<DispatchStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn stats(&self) -> &Arc<DispatchStats> {
        &self.stats
    }

    /// `incr <key> <offset>`; returns the new value.
    pub fn increment<P: PoolView + ?Sized>(
        &mut self,
        pool: &P,
        key: &[u8],
        offset: u32,
    ) -> ClientResult<u64> {
        self.dispatch(pool, Verb::Incr, key, offset)
    }

    /// `decr <key> <offset>`; returns the new value.
    pub fn decrement<P: PoolView + ?Sized>(
        &mut self,
        pool: &P,
        key: &[u8],
        offset: u32,
    ) -> ClientResult<u64> {
        self.dispatch(pool, Verb::Decr, key, offset)
    }

    /// Run one arithmetic command against the pool.
    pub fn dispatch<P: PoolView + ?Sized>(
        &mut self,
        pool: &P,
        verb: Verb,
        key: &[u8],
        offset: u32,
    ) -> ClientResult<u64> {
        let span = match verb {
            Verb::Incr => tracing::debug_span!("memshard.incr", key_len = key.len(), offset),
            Verb::Decr => tracing::debug_span!("memshard.decr", key_len = key.len(), offset),
        };
        let _enter = span.enter();

        self.stats.record_request();
        let result = self.run(pool, verb, key, offset);

        match &result {
            Ok(value) => {
                self.stats.record_success();
                tracing::debug!(value, "dispatch succeeded");
            }
            Err(e) if e.is_input_error() => {
                self.stats.record_rejected();
                tracing::debug!(code = %e.code(), "dispatch rejected");
            }
            Err(e) => {
                tracing::debug!(code = %e.code(), error = %e, "dispatch failed");
            }
        }
        result
    }

    fn run<P: PoolView + ?Sized>(
        &mut self,
        pool: &P,
        verb: Verb,
        key: &[u8],
        offset: u32,
    ) -> ClientResult<u64> {
        self.check_preconditions(pool, key)?;
        self.frame.encode_arithmetic(verb, key, offset)?;

        let start = pool.server_for_key(key);
        self.attempt_replicas(pool, start).finish()
    }

    fn check_preconditions<P: PoolView + ?Sized>(&self, pool: &P, key: &[u8]) -> ClientResult<()> {
        if key.is_empty() {
            return Err(ClientError::NoKeyProvided);
        }
        if pool.host_count() == 0 {
            return Err(ClientError::NoServers);
        }
        if pool.verify_key() && !self.validator.check(key) {
            return Err(ClientError::BadKeyProvided);
        }
        Ok(())
    }

    fn attempt_replicas<P: PoolView + ?Sized>(&mut self, pool: &P, start: usize) -> Outcomes {
        let replicas = pool.replica_count().clamp(1, MAX_REPLICAS);
        let host_count = pool.host_count();
        let walk_ring = pool.distribution() == Distribution::Consistent;

        let mut server_index = start;
        let mut outcomes = Outcomes::new();
        for attempt in 0..replicas {
            if attempt > 1 && walk_ring {
                let next = next_server(server_index, host_count);
                tracing::trace!(from = server_index, to = next, "advancing on ring");
                self.stats.record_ring_advance();
                server_index = next;
            }

            let outcome = self.attempt_once(server_index);
            tracing::debug!(attempt, server_index, outcome = ?outcome, "replica attempt");
            self.stats.record_attempt(&outcome);
            outcomes.record(outcome);
        }
        outcomes
    }

    fn attempt_once(&mut self, server_index: usize) -> ReplyOutcome {
        if let Err(e) = self.transport.send(server_index, self.frame.as_bytes()) {
            tracing::warn!(server_index, error = %e, "send failed");
            return ReplyOutcome::Transport(e);
        }

        self.reply.clear();
        if let Err(e) = self.transport.receive(server_index, &mut self.reply) {
            tracing::warn!(server_index, error = %e, "receive failed");
            return ReplyOutcome::Transport(e);
        }

        classify_reply(self.reply.as_bytes()).into()
    }
}

impl<T: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for Dispatcher<T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("transport", &self.transport)
            .field("validator", &self.validator)
            .field("command_size", &self.frame.capacity())
            .finish()
    }
}
