//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use memshard::protocol::ReplyLine;
use memshard::routing::{Distribution, PoolView};
use memshard::{Transport, TransportError};
use std::cell::Cell;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread::JoinHandle;
use tempfile::NamedTempFile;

/// What the scripted transport does for one attempt.
#[derive(Debug, Clone)]
pub enum Step {
    /// Accept the send and answer with this line.
    Reply(&'static [u8]),
    /// Fail the send.
    SendFails,
    /// Accept the send, then time out on the read.
    ReadTimeout,
}

/// Transport that plays back a fixed script and records every call.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: VecDeque<Step>,
    pending: Option<Step>,
    /// `(server_index, frame)` for every send.
    pub sends: Vec<(usize, Vec<u8>)>,
    /// `server_index` for every receive.
    pub receives: Vec<usize>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Answer every attempt with the same line.
    pub fn replying(line: &'static [u8], times: usize) -> Self {
        Self::new(std::iter::repeat(Step::Reply(line)).take(times))
    }

    /// Server indices in send order.
    pub fn visited(&self) -> Vec<usize> {
        self.sends.iter().map(|(index, _)| *index).collect()
    }

    pub fn call_count(&self) -> usize {
        self.sends.len() + self.receives.len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, index: usize, frame: &[u8]) -> Result<(), TransportError> {
        self.sends.push((index, frame.to_vec()));
        match self.script.pop_front() {
            Some(Step::SendFails) => Err(TransportError::WriteFailure {
                host: format!("#{}", index),
                source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
            }),
            Some(step) => {
                self.pending = Some(step);
                Ok(())
            }
            None => Err(TransportError::UnknownHost { index }),
        }
    }

    fn receive(&mut self, index: usize, line: &mut ReplyLine) -> Result<(), TransportError> {
        self.receives.push(index);
        match self.pending.take() {
            Some(Step::Reply(bytes)) => line
                .extend_from_slice(bytes)
                .map_err(|e| TransportError::ReplyTooLong {
                    capacity: e.capacity,
                }),
            Some(Step::ReadTimeout) => Err(TransportError::Timeout {
                host: format!("#{}", index),
            }),
            _ => Err(TransportError::ConnectionClosed {
                host: format!("#{}", index),
            }),
        }
    }
}

/// Pool view with a fixed initial server that counts hasher calls.
#[derive(Debug)]
pub struct FixedPool {
    pub hosts: usize,
    pub start: usize,
    pub replicas: u32,
    pub distribution: Distribution,
    pub verify_key: bool,
    pub hash_calls: Cell<usize>,
}

impl FixedPool {
    pub fn new(hosts: usize, start: usize, replicas: u32, distribution: Distribution) -> Self {
        Self {
            hosts,
            start,
            replicas,
            distribution,
            verify_key: false,
            hash_calls: Cell::new(0),
        }
    }

    pub fn with_verify_key(mut self) -> Self {
        self.verify_key = true;
        self
    }
}

impl PoolView for FixedPool {
    fn host_count(&self) -> usize {
        self.hosts
    }

    fn distribution(&self) -> Distribution {
        self.distribution
    }

    fn replica_count(&self) -> u32 {
        self.replicas
    }

    fn verify_key(&self) -> bool {
        self.verify_key
    }

    fn server_for_key(&self, _key: &[u8]) -> usize {
        self.hash_calls.set(self.hash_calls.get() + 1);
        self.start
    }
}

/// Write a config file to a temp path.
pub fn create_config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

/// Minimal memcached stand-in.
///
/// Accepts one connection, reads one command line per scripted reply and
/// answers it. Returns the command lines it received.
pub fn spawn_fake_server(replies: Vec<&'static [u8]>) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read address");

    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().expect("Failed to accept");
        let mut writer = stream.try_clone().expect("Failed to clone stream");
        let mut reader = BufReader::new(stream);
        let mut received = Vec::new();

        for reply in replies {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            received.push(line);
            writer.write_all(reply).expect("Failed to write reply");
        }
        received
    });

    (addr, handle)
}

/// Assert that a result is Ok and return the value.
#[track_caller]
pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("Expected Ok, got Err: {:?}", e),
    }
}

/// Assert that a result is Err.
#[track_caller]
pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
        Err(e) => e,
    }
}
