//! Memcached ASCII arithmetic commands and their replies.
//!
//! # Command Format
//!
//! `<verb> <key> <offset>\r\n`, where `<verb>` is `incr` or `decr`, the key is
//! copied verbatim and the offset is an unsigned base-10 integer.
//!
//! # Reply Format
//!
//! - `<value>\r\n`: the new counter value
//! - `NOT_FOUND\r\n`: the key does not exist
//! - `ERROR\r\n`: the server rejected the command
//!
//! Numbers and keywords share the same lexical space, so the keyword lines are
//! matched literally before anything is parsed as a number.

use crate::core::error::FrameError;
use bytes::BytesMut;

const ERROR_LINE: &[u8] = b"ERROR\r\n";
const NOT_FOUND_LINE: &[u8] = b"NOT_FOUND\r\n";

/// Arithmetic command verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `incr`
    Incr,
    /// `decr`
    Decr,
}

impl Verb {
    /// Wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Incr => "incr",
            Verb::Decr => "decr",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incr" => Ok(Verb::Incr),
            "decr" => Ok(Verb::Decr),
            other => Err(format!("unsupported verb: {}", other)),
        }
    }
}

/// Bounded buffer holding one outbound command line.
#[derive(Debug)]
pub struct CommandFrame {
    buf: BytesMut,
    capacity: usize,
}

impl CommandFrame {
    /// Create an empty frame of the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Encode `<verb> <key> <offset>\r\n`, replacing any previous contents.
    ///
    /// The encoded line must be strictly shorter than the capacity. On error
    /// the frame is left empty.
    pub fn encode_arithmetic(
        &mut self,
        verb: Verb,
        key: &[u8],
        offset: u32,
    ) -> Result<usize, FrameError> {
        self.buf.clear();

        let verb = verb.as_str().as_bytes();
        let offset = offset.to_string();
        let needed = verb.len() + 1 + key.len() + 1 + offset.len() + 2;
        if needed >= self.capacity {
            return Err(FrameError {
                needed,
                capacity: self.capacity,
            });
        }

        self.buf.extend_from_slice(verb);
        self.buf.extend_from_slice(b" ");
        self.buf.extend_from_slice(key);
        self.buf.extend_from_slice(b" ");
        self.buf.extend_from_slice(offset.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        Ok(needed)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Bounded buffer receiving one reply line.
#[derive(Debug)]
pub struct ReplyLine {
    buf: BytesMut,
    capacity: usize,
}

impl ReplyLine {
    /// Create an empty reply buffer of the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Append received bytes. Fails without appending if they would overflow.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<(), FrameError> {
        let needed = self.buf.len() + data.len();
        if needed > self.capacity {
            return Err(FrameError {
                needed,
                capacity: self.capacity,
            });
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Whether the buffer ends with `\r\n`.
    pub fn is_complete(&self) -> bool {
        self.buf.ends_with(b"\r\n")
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes that can still be appended.
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }
}

/// Classified arithmetic reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// `ERROR`
    ProtocolError,
    /// `NOT_FOUND`
    NotFound,
    /// Anything else, read as a number.
    Value(u64),
}

impl Reply {
    /// Numeric value carried by the reply; keyword replies carry 0.
    pub fn value(&self) -> u64 {
        match self {
            Reply::Value(v) => *v,
            Reply::ProtocolError | Reply::NotFound => 0,
        }
    }
}

/// Classify a reply line.
///
/// Keyword lines are matched by literal prefix first; everything else is read
/// as a best-effort decimal number.
pub fn classify_reply(line: &[u8]) -> Reply {
    if line.starts_with(ERROR_LINE) {
        Reply::ProtocolError
    } else if line.starts_with(NOT_FOUND_LINE) {
        Reply::NotFound
    } else {
        Reply::Value(parse_decimal(line))
    }
}

/// Read a leading unsigned decimal number.
///
/// Leading whitespace and a `+` sign are skipped; parsing stops at the first
/// non-digit. No digits yields 0. Values past `u64::MAX` saturate.
pub fn parse_decimal(line: &[u8]) -> u64 {
    let mut rest = line;
    while let Some((first, tail)) = rest.split_first() {
        if !first.is_ascii_whitespace() {
            break;
        }
        rest = tail;
    }
    if let Some(tail) = rest.strip_prefix(b"+") {
        rest = tail;
    }

    rest.iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u64, |acc, b| {
            acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
        })
}
