//! TCP Server
//!
//! Accepts connections and spawns one worker thread per client. The same
//! server runs either endpoint: the storage engine and the shard controller
//! both implement [`Handler`].

use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{Request, Response};

use super::Connection;

/// Poll interval for the non-blocking accept loop.
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Read-timeout interval workers use to re-check the shutdown flag when no
/// idle deadline is configured.
const SHUTDOWN_POLL: Duration = Duration::from_millis(500);

/// Request dispatcher: turns one decoded request into one response.
///
/// Implementations must be total over [`Request`]; requests the endpoint
/// does not serve come back as [`Response::Error`].
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: Request) -> Response;
}

/// TCP server with a thread-per-connection model.
pub struct Server {
    config: Config,
    listener: TcpListener,
    handler: Arc<dyn Handler>,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind to the configured listen address.
    ///
    /// Binding is separate from running so callers (and tests) can learn the
    /// actual address when the config asks for an ephemeral port.
    pub fn bind(config: Config, handler: Arc<dyn Handler>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        Ok(Self {
            config,
            listener,
            handler,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The address the server is actually listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// A flag that stops the accept loop when set.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the accept loop (blocking).
    ///
    /// Accepts clients until the shutdown flag is set, spawning one worker
    /// thread per connection. On shutdown, stops accepting and joins the
    /// remaining connection threads so teardown is deterministic.
    pub fn run(&self) -> Result<()> {
        self.listener.set_nonblocking(true)?;
        tracing::info!("Listening on {}", self.listener.local_addr()?);

        let active = Arc::new(AtomicUsize::new(0));
        let mut workers: Vec<thread::JoinHandle<()>> = Vec::new();

        while !self.shutdown.load(Ordering::Relaxed) {
            // Reap finished workers so the handle list stays bounded
            workers.retain(|handle| !handle.is_finished());

            let (stream, addr) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if active.load(Ordering::Relaxed) >= self.config.max_connections {
                tracing::warn!("Connection limit reached, rejecting {}", addr);
                // Tell the client why before hanging up
                stream.set_nonblocking(false)?;
                if let Ok(mut conn) = Connection::new(stream) {
                    let _ = conn.send_response(&Response::error("Connection limit reached"));
                }
                continue;
            }

            tracing::debug!("Accepted connection from {}", addr);
            // Accepted streams inherit the listener's non-blocking mode
            stream.set_nonblocking(false)?;

            let handler = Arc::clone(&self.handler);
            let active = Arc::clone(&active);
            let shutdown = Arc::clone(&self.shutdown);
            let read_ms = self.config.read_timeout_ms;
            let write_ms = self.config.write_timeout_ms;

            active.fetch_add(1, Ordering::Relaxed);
            workers.push(thread::spawn(move || {
                let result = Connection::new(stream).and_then(|mut conn| {
                    conn.set_timeouts(read_ms, write_ms)?;
                    conn.arm_shutdown_poll(SHUTDOWN_POLL)?;
                    conn.serve(handler.as_ref(), &shutdown)
                });
                if let Err(e) = result {
                    tracing::warn!("Connection from {} ended with error: {}", addr, e);
                }
                active.fetch_sub(1, Ordering::Relaxed);
            }));
        }

        tracing::info!("Shutting down, joining {} connection worker(s)", workers.len());
        for handle in workers {
            let _ = handle.join();
        }
        Ok(())
    }
}
