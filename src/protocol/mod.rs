//! Memcached ASCII wire protocol, client side.
//!
//! Commands are framed into a bounded [`CommandFrame`] and replies are read
//! into a separate bounded [`ReplyLine`], so the outbound and inbound phases
//! never share storage.

pub mod ascii;

pub use ascii::{classify_reply, parse_decimal, CommandFrame, Reply, ReplyLine, Verb};
