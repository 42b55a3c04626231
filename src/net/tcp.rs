//! Blocking TCP transport.
//!
//! One connection per host, opened on first use. Any I/O error drops the
//! connection; the next command to that host reconnects.

use super::Transport;
use crate::core::config::{Config, TransportConfig};
use crate::core::error::TransportError;
use crate::protocol::ReplyLine;
use crate::routing::Host;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// An open connection to one host.
struct TcpConnection {
    reader: BufReader<TcpStream>,
}

impl TcpConnection {
    fn open(host: &Host, connect_timeout: Duration, io_timeout: Duration) -> std::io::Result<Self> {
        let addrs = (host.hostname.as_str(), host.port).to_socket_addrs()?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(Some(io_timeout))?;
                    stream.set_write_timeout(Some(io_timeout))?;
                    return Ok(Self {
                        reader: BufReader::new(stream),
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
        }))
    }

    fn write_all(&mut self, frame: &[u8]) -> std::io::Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(frame)?;
        stream.flush()
    }
}

/// Why a line read stopped early.
enum LineError {
    Io(std::io::Error),
    Closed,
    TooLong(usize),
}

/// Transport over plain TCP, one lazily opened connection per host.
pub struct TcpTransport {
    hosts: Vec<Host>,
    connections: Vec<Option<TcpConnection>>,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl TcpTransport {
    /// Create a transport for hosts in pool order.
    pub fn new(hosts: Vec<Host>, config: &TransportConfig) -> Self {
        let connections = hosts.iter().map(|_| None).collect();
        Self {
            hosts,
            connections,
            connect_timeout: config.connect_timeout(),
            io_timeout: config.io_timeout(),
        }
    }

    /// Create a transport for the servers in a config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(config.hosts()?, &config.transport))
    }

    /// Whether a connection to `index` is currently open.
    pub fn is_connected(&self, index: usize) -> bool {
        matches!(self.connections.get(index), Some(Some(_)))
    }

    /// Close every open connection.
    pub fn disconnect_all(&mut self) {
        for conn in &mut self.connections {
            *conn = None;
        }
    }

    fn host_label(&self, index: usize) -> String {
        self.hosts
            .get(index)
            .map(|h| h.to_string())
            .unwrap_or_else(|| format!("#{}", index))
    }

    fn connection(&mut self, index: usize) -> Result<&mut TcpConnection, TransportError> {
        let host = self
            .hosts
            .get(index)
            .ok_or(TransportError::UnknownHost { index })?;
        let slot = &mut self.connections[index];

        if slot.is_none() {
            let conn = TcpConnection::open(host, self.connect_timeout, self.io_timeout).map_err(
                |source| TransportError::ConnectionFailure {
                    host: host.to_string(),
                    source,
                },
            )?;
            tracing::debug!(host = %host, "connected");
            *slot = Some(conn);
        }

        slot.as_mut().ok_or(TransportError::UnknownHost { index })
    }

    fn read_line(conn: &mut TcpConnection, line: &mut ReplyLine) -> Result<(), LineError> {
        loop {
            let available = conn.reader.fill_buf().map_err(LineError::Io)?;
            if available.is_empty() {
                return Err(LineError::Closed);
            }

            let newline = available.iter().position(|b| *b == b'\n');
            let take = newline.map(|pos| pos + 1).unwrap_or(available.len());
            line.extend_from_slice(&available[..take])
                .map_err(|e| LineError::TooLong(e.capacity))?;
            conn.reader.consume(take);

            if newline.is_some() {
                return Ok(());
            }
        }
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, index: usize, frame: &[u8]) -> Result<(), TransportError> {
        let result = self.connection(index)?.write_all(frame);
        if let Err(source) = result {
            self.connections[index] = None;
            return Err(TransportError::from_io(self.host_label(index), false, source));
        }
        Ok(())
    }

    fn receive(&mut self, index: usize, line: &mut ReplyLine) -> Result<(), TransportError> {
        let host = self.host_label(index);
        let conn = match self.connections.get_mut(index) {
            Some(Some(conn)) => conn,
            Some(None) => return Err(TransportError::ConnectionClosed { host }),
            None => return Err(TransportError::UnknownHost { index }),
        };

        match Self::read_line(conn, line) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.connections[index] = None;
                Err(match e {
                    LineError::Io(source) => TransportError::from_io(host, true, source),
                    LineError::Closed => TransportError::ConnectionClosed { host },
                    LineError::TooLong(capacity) => TransportError::ReplyTooLong { capacity },
                })
            }
        }
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("hosts", &self.hosts)
            .field(
                "connected",
                &(0..self.hosts.len())
                    .filter(|i| self.is_connected(*i))
                    .collect::<Vec<_>>(),
            )
            .field("connect_timeout", &self.connect_timeout)
            .field("io_timeout", &self.io_timeout)
            .finish()
    }
}
