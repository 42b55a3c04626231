//! Networking.
//!
//! The dispatcher talks to servers only through [`Transport`]: send a framed
//! command to server `index`, then read one reply line from it. Timeouts,
//! connection setup and reconnection are the transport's business.

pub mod tcp;

pub use tcp::TcpTransport;

use crate::core::error::TransportError;
use crate::protocol::ReplyLine;

/// Command transport, addressed by server index.
pub trait Transport {
    /// Send a complete command line to server `index`.
    fn send(&mut self, index: usize, frame: &[u8]) -> Result<(), TransportError>;

    /// Read one `\r\n`-terminated reply line from server `index` into `line`.
    ///
    /// `line` is empty on entry.
    fn receive(&mut self, index: usize, line: &mut ReplyLine) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, index: usize, frame: &[u8]) -> Result<(), TransportError> {
        (**self).send(index, frame)
    }

    fn receive(&mut self, index: usize, line: &mut ReplyLine) -> Result<(), TransportError> {
        (**self).receive(index, line)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, index: usize, frame: &[u8]) -> Result<(), TransportError> {
        (**self).send(index, frame)
    }

    fn receive(&mut self, index: usize, line: &mut ReplyLine) -> Result<(), TransportError> {
        (**self).receive(index, line)
    }
}
