//! Connection Handler
//!
//! Wraps a TCP stream with buffered framed I/O. Used on both sides: servers
//! run the request/response loop via [`Connection::serve`], clients use the
//! send/receive pairs directly.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::{Result, ShardKvError};
use crate::protocol::{read_request, read_response, write_request, write_response};
use crate::protocol::{Request, Response};

use super::Handler;

/// A single client-server connection.
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,

    /// Whether a read timeout ends the session (operator-configured idle
    /// deadline) rather than merely waking the serve loop
    idle_deadline: bool,
}

impl Connection {
    /// Wrap an accepted stream.
    ///
    /// Sets up buffered I/O and disables Nagle's algorithm.
    pub fn new(stream: TcpStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            peer_addr,
            idle_deadline: false,
        })
    }

    /// Open a connection to a remote endpoint.
    pub fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| ShardKvError::Network(format!("connect to {addr} failed: {e}")))?;
        Self::new(stream)
    }

    /// Configure connection timeouts. Zero disables a timeout.
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
            self.idle_deadline = true;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Arm a periodic read timeout so [`Connection::serve`] can observe
    /// shutdown while the client sits idle. No-op when an idle deadline is
    /// already configured; timing out on the poll does not end the session.
    pub fn arm_shutdown_poll(&mut self, interval: Duration) -> Result<()> {
        if !self.idle_deadline {
            self.reader.get_ref().set_read_timeout(Some(interval))?;
        }
        Ok(())
    }

    /// Get the peer address string.
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    // =========================================================================
    // Client side
    // =========================================================================

    /// Send a request to the remote server.
    pub fn send_request(&mut self, request: &Request) -> Result<()> {
        write_request(&mut self.writer, request)
    }

    /// Receive the response to a previously sent request.
    pub fn recv_response(&mut self) -> Result<Response> {
        read_response(&mut self.reader)
    }

    /// One request-response round trip.
    pub fn round_trip(&mut self, request: &Request) -> Result<Response> {
        self.send_request(request)?;
        self.recv_response()
    }

    // =========================================================================
    // Server side
    // =========================================================================

    /// Serve the connection until the client disconnects or `shutdown` is
    /// set (blocking).
    ///
    /// Reads requests in a loop, dispatches each through `handler`, and
    /// writes the response back. Returns when the client disconnects, the
    /// server shuts down, or an unrecoverable error occurs. Shutdown is only
    /// observed between reads, so callers that want it noticed on an idle
    /// connection must arm [`Connection::arm_shutdown_poll`].
    pub fn serve(&mut self, handler: &dyn Handler, shutdown: &AtomicBool) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::debug!("Shutting down, closing connection to {}", self.peer_addr);
                return Ok(());
            }

            let request = match read_request(&mut self.reader) {
                Ok(req) => req,
                Err(ShardKvError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(ShardKvError::Io(ref e)) if is_timeout(e.kind()) => {
                    if self.idle_deadline {
                        tracing::debug!("Read timeout for client {}", self.peer_addr);
                        return Ok(());
                    }
                    // Poll tick on an idle client; re-check the shutdown flag
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Send error response if possible
                    let _ = self.send_response(&Response::error(e.to_string()));
                    return Err(e);
                }
            };

            tracing::trace!("Received {} request from {}", request.kind(), self.peer_addr);

            let response = handler.handle(request);

            if let Err(e) = self.send_response(&response) {
                // If the client disconnected before the response went out,
                // log and exit gracefully rather than treating it as a
                // server error.
                if let ShardKvError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Send a response to the client.
    pub fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.writer, response)
    }

    /// Receive a request from the client.
    pub fn recv_request(&mut self) -> Result<Request> {
        read_request(&mut self.reader)
    }
}

fn is_disconnect(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
    )
}

fn is_timeout(kind: std::io::ErrorKind) -> bool {
    // Windows reports TimedOut where Unix reports WouldBlock
    matches!(
        kind,
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}
