//! TCP Transport
//!
//! Default [`Connector`] implementation over blocking TCP sockets.
//!
//! Socket timeouts bound a single syscall, not a whole frame, so every read
//! and write is re-armed with the time left before the request deadline.
//! A peer that trickles its reply cannot keep a call alive past it.

use std::io::{self, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use super::{Connector, Transport};
use crate::config::Host;
use crate::error::{ClientError, Result};
use crate::protocol::{read_frame, write_frame};

/// Opens TCP connections to store endpoints
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, host: &Host, timeout: Duration) -> Result<Box<dyn Transport>> {
        let addrs = (host.name.as_str(), host.port)
            .to_socket_addrs()
            .map_err(|e| ClientError::Connection(format!("cannot resolve {}: {}", host, e)))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(Box::new(TcpTransport::new(stream, host)?)),
                Err(e) => last_err = Some(e),
            }
        }

        Err(ClientError::Connection(match last_err {
            Some(e) => format!("cannot connect to {}: {}", host, e),
            None => format!("no addresses for {}", host),
        }))
    }
}

/// A single TCP connection with buffered reads
pub struct TcpTransport {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// Write half; frames are written whole, so no buffering
    writer: TcpStream,

    /// Peer address for logging
    peer_addr: String,
}

impl TcpTransport {
    /// Wrap a connected stream
    pub fn new(stream: TcpStream, host: &Host) -> Result<Self> {
        // Disable Nagle's algorithm for low latency
        stream
            .set_nodelay(true)
            .map_err(|e| ClientError::Connection(format!("{}: {}", host, e)))?;

        let read_stream = stream
            .try_clone()
            .map_err(|e| ClientError::Connection(format!("{}: {}", host, e)))?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: stream,
            peer_addr: host.to_string(),
        })
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    fn exchange(&mut self, request: &[u8], deadline: Instant) -> Result<Vec<u8>> {
        let mut writer = DeadlineWriter {
            stream: &self.writer,
            deadline,
        };
        write_frame(&mut writer, request)?;

        let mut reader = DeadlineReader {
            reader: &mut self.reader,
            deadline,
        };
        read_frame(&mut reader)
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, request: &[u8], deadline: Instant) -> Result<Vec<u8>> {
        let response = match self.exchange(request, deadline) {
            Ok(response) => response,
            Err(ClientError::Timeout(msg)) => {
                return Err(ClientError::Timeout(format!("{} talking to {}", msg, self.peer_addr)))
            }
            Err(e) => return Err(e),
        };

        tracing::trace!(
            "Exchanged {}B/{}B with {}",
            request.len(),
            response.len(),
            self.peer_addr
        );
        Ok(response)
    }
}

// =============================================================================
// Deadline-bound I/O
// =============================================================================

/// Time left before `deadline`; `TimedOut` once it has passed
fn time_left(deadline: Instant) -> io::Result<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        return Err(io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"));
    }
    Ok(left)
}

struct DeadlineReader<'a> {
    reader: &'a mut BufReader<TcpStream>,
    deadline: Instant,
}

impl Read for DeadlineReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let left = time_left(self.deadline)?;
        self.reader.get_ref().set_read_timeout(Some(left))?;
        self.reader.read(buf)
    }
}

struct DeadlineWriter<'a> {
    stream: &'a TcpStream,
    deadline: Instant,
}

impl Write for DeadlineWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let left = time_left(self.deadline)?;
        self.stream.set_write_timeout(Some(left))?;
        let mut stream = self.stream;
        stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut stream = self.stream;
        stream.flush()
    }
}
