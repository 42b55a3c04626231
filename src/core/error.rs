//! Error types and return codes.
//!
//! Every dispatch produces exactly one outcome for the caller: either the
//! numeric value the server returned, or a [`ClientError`]. Each error maps to
//! a stable [`ReturnCode`] whose string identifier is part of the API contract.

use thiserror::Error;

/// Stable result codes surfaced by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    /// A replica confirmed the operation.
    Success,
    /// The key was empty.
    NoKeyProvided,
    /// The pool has no servers.
    NoServers,
    /// The key validator rejected the key.
    BadKeyProvided,
    /// The command could not be framed or written.
    WriteFailure,
    /// The reply could not be read.
    ReadFailure,
    /// No connection could be established to the server.
    ConnectionFailure,
    /// The server did not answer in time.
    Timeout,
    /// The reply was malformed at the transport level.
    UnknownReadFailure,
    /// The server answered `ERROR`.
    ProtocolError,
    /// The server answered `NOT_FOUND`.
    NotFound,
}

impl ReturnCode {
    /// Stable string identifier for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::NoKeyProvided => "NO_KEY_PROVIDED",
            Self::NoServers => "NO_SERVERS",
            Self::BadKeyProvided => "BAD_KEY_PROVIDED",
            Self::WriteFailure => "WRITE_FAILURE",
            Self::ReadFailure => "READ_FAILURE",
            Self::ConnectionFailure => "CONNECTION_FAILURE",
            Self::Timeout => "TIMEOUT",
            Self::UnknownReadFailure => "UNKNOWN_READ_FAILURE",
            Self::ProtocolError => "PROTOCOL_ERROR",
            Self::NotFound => "NOTFOUND",
        }
    }

    /// Whether the code describes a network-level failure.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ReadFailure | Self::ConnectionFailure | Self::Timeout | Self::UnknownReadFailure
        )
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-level failure reported for a single attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The pool has no host at this index.
    #[error("no host at index {index}")]
    UnknownHost { index: usize },

    /// Connecting to the host failed.
    #[error("connection to {host} failed: {source}")]
    ConnectionFailure {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the command failed.
    #[error("write to {host} failed: {source}")]
    WriteFailure {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the reply failed.
    #[error("read from {host} failed: {source}")]
    ReadFailure {
        host: String,
        #[source]
        source: std::io::Error,
    },

    /// The host did not answer before the I/O timeout.
    #[error("timed out talking to {host}")]
    Timeout { host: String },

    /// The host closed the connection before a full line arrived.
    #[error("connection to {host} closed mid-reply")]
    ConnectionClosed { host: String },

    /// The reply line did not fit the reply buffer.
    #[error("reply exceeds {capacity} bytes")]
    ReplyTooLong { capacity: usize },
}

impl TransportError {
    /// Map to the return code surfaced to callers.
    pub fn code(&self) -> ReturnCode {
        match self {
            Self::UnknownHost { .. } | Self::ConnectionFailure { .. } => {
                ReturnCode::ConnectionFailure
            }
            Self::WriteFailure { .. } => ReturnCode::WriteFailure,
            Self::ReadFailure { .. } => ReturnCode::ReadFailure,
            Self::Timeout { .. } => ReturnCode::Timeout,
            Self::ConnectionClosed { .. } | Self::ReplyTooLong { .. } => {
                ReturnCode::UnknownReadFailure
            }
        }
    }

    /// Classify an I/O error from a read or write.
    pub fn from_io(host: impl Into<String>, reading: bool, source: std::io::Error) -> Self {
        let host = host.into();
        match source.kind() {
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                Self::Timeout { host }
            }
            std::io::ErrorKind::UnexpectedEof => Self::ConnectionClosed { host },
            _ if reading => Self::ReadFailure { host, source },
            _ => Self::WriteFailure { host, source },
        }
    }
}

/// Framing failure on a bounded protocol buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{needed} bytes do not fit a {capacity} byte buffer")]
pub struct FrameError {
    pub needed: usize,
    pub capacity: usize,
}

/// Errors returned by a dispatch call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Empty key.
    #[error("no key provided")]
    NoKeyProvided,

    /// The pool is empty.
    #[error("no servers defined")]
    NoServers,

    /// The key failed validation.
    #[error("key failed validation")]
    BadKeyProvided,

    /// The formatted command does not fit the command buffer.
    #[error("command does not fit: {0}")]
    CommandTooLong(#[from] FrameError),

    /// Every replica answered `ERROR`, or the first one did and none succeeded.
    #[error("server rejected the command")]
    ProtocolError,

    /// The key does not exist on the server.
    #[error("key not found")]
    NotFound,

    /// Transport failure on the first attempt and no replica succeeded.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Return code for this error.
    pub fn code(&self) -> ReturnCode {
        match self {
            Self::NoKeyProvided => ReturnCode::NoKeyProvided,
            Self::NoServers => ReturnCode::NoServers,
            Self::BadKeyProvided => ReturnCode::BadKeyProvided,
            Self::CommandTooLong(_) => ReturnCode::WriteFailure,
            Self::ProtocolError => ReturnCode::ProtocolError,
            Self::NotFound => ReturnCode::NotFound,
            Self::Transport(e) => e.code(),
        }
    }

    /// Whether the call was rejected before any I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::NoKeyProvided | Self::NoServers | Self::BadKeyProvided | Self::CommandTooLong(_)
        )
    }
}

/// Result type using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
