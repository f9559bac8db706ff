//! Connection Worker
//!
//! This module handles individual client connections. Each client gets its
//! own worker task that runs in a loop, reading frames, dispatching them to
//! handlers and letting the handlers write replies.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Read until '\n'         │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Parse "CMD: data"       │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │  ┌─────────────────────────┐ │
//!    │  │ Look up + run handler   │ │
//!    │  └───────────┬─────────────┘ │
//!    │              │               │
//!    │              ▼               │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. EOF, I/O error, bad frame, unknown command or shutdown
//!        │
//!        ▼
//! 5. Socket shut down, worker task ends
//! ```
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut` buffer. TCP is a stream, so a
//! read may carry half a line or several lines at once. Complete lines are
//! split off the front of the buffer one at a time, and each is fully
//! handled before the next is looked at.
//!
//! Nothing is ever written back on error: a malformed frame or an unknown
//! command simply drops the connection.

use crate::commands::HandlerRegistry;
use crate::connection::response::{Response, SharedWriter};
use crate::protocol::{find_frame, parse_request, ParseError, Request};
use crate::server::{ServerConfig, Shutdown};
use bytes::{Bytes, BytesMut};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, error, info, trace, warn};

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Connections closed on accept because the server was full
    pub connections_rejected: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total requests handed to a handler
    pub requests_dispatched: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_dispatched(&self) {
        self.requests_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Counts a connection as active for as long as it is alive.
///
/// Decrements on drop, so a worker that unwinds out of a panicking handler
/// is still accounted for.
struct ActiveConnection(Arc<ConnectionStats>);

impl ActiveConnection {
    fn new(stats: Arc<ConnectionStats>) -> Self {
        stats.connection_opened();
        Self(stats)
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        self.0.connection_closed();
    }
}

/// Everything a connection worker shares with the server.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// Routing table, read-only while serving
    pub registry: Arc<HandlerRegistry>,
    /// Server-wide shutdown signal
    pub shutdown: Shutdown,
    /// Line length cap and idle deadline
    pub config: Arc<ServerConfig>,
    /// Connection statistics (shared)
    pub stats: Arc<ConnectionStats>,
}

/// Handles a single client connection.
///
/// Owns both halves of the socket for the lifetime of the connection. The
/// write half is lent to each [`Response`] while its handler runs.
pub struct ConnectionHandler {
    /// Read half of the TCP stream
    reader: OwnedReadHalf,

    /// Write half of the TCP stream
    writer: SharedWriter,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    registry: Arc<HandlerRegistry>,

    shutdown: Shutdown,

    max_line_length: usize,

    idle_timeout: Option<Duration>,

    stats: Arc<ConnectionStats>,

    _active: ActiveConnection,
}

impl ConnectionHandler {
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The TCP stream for this connection
    /// * `addr` - The client's socket address
    /// * `ctx` - Registry, shutdown signal, limits and stats shared with the server
    pub fn new(stream: TcpStream, addr: SocketAddr, ctx: ConnectionContext) -> Self {
        let active = ActiveConnection::new(Arc::clone(&ctx.stats));

        let (reader, writer) = stream.into_split();
        Self {
            reader,
            writer: Arc::new(Mutex::new(writer)),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            registry: ctx.registry,
            shutdown: ctx.shutdown,
            max_line_length: ctx.config.max_line_length,
            idle_timeout: ctx.config.idle_timeout,
            stats: ctx.stats,
            _active: active,
        }
    }

    /// Runs the main connection loop.
    ///
    /// Reads frames and dispatches them until the client disconnects, an
    /// error occurs or shutdown is requested. The socket is shut down on
    /// every exit path; if a handler panics, dropping the halves closes it.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Connection closed for shutdown"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    debug!(client = %self.addr, "Client disconnected")
                }
                ConnectionError::IoError(io_err)
                    if io_err.kind() == io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                ConnectionError::IdleTimeout => {
                    debug!(client = %self.addr, "Closing idle connection")
                }
                _ => warn!(client = %self.addr, error = %e, "Connection error"),
            },
        }

        self.close().await;
        result
    }

    /// The main read-parse-dispatch loop.
    ///
    /// Returns `Ok(())` only when shutdown was requested.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(frame) = self.next_frame()? {
                let request = parse_request(frame)?;
                self.dispatch(request).await?;
            }

            if self.shutdown.is_triggered() {
                return Ok(());
            }

            if !self.read_more_data().await? {
                return Ok(());
            }
        }
    }

    /// Splits the next complete frame off the front of the buffer.
    fn next_frame(&mut self) -> Result<Option<Bytes>, ConnectionError> {
        match find_frame(&self.buffer) {
            Some(end) if end < self.max_line_length => {
                let frame = self.buffer.split_to(end + 1).freeze();
                trace!(
                    client = %self.addr,
                    consumed = frame.len(),
                    remaining = self.buffer.len(),
                    "Read frame"
                );
                Ok(Some(frame))
            }
            Some(_) => Err(self.line_too_long()),
            None if self.buffer.len() >= self.max_line_length => Err(self.line_too_long()),
            None => {
                if !self.buffer.is_empty() {
                    trace!(
                        client = %self.addr,
                        buffered = self.buffer.len(),
                        "Incomplete frame, need more data"
                    );
                }
                Ok(None)
            }
        }
    }

    fn line_too_long(&self) -> ConnectionError {
        error!(
            client = %self.addr,
            size = self.buffer.len(),
            max = self.max_line_length,
            "Request line exceeds size limit"
        );
        ConnectionError::LineTooLong
    }

    /// Looks up the handler for `request` and runs it to completion.
    async fn dispatch(&self, request: Request) -> Result<(), ConnectionError> {
        let handler = self
            .registry
            .lookup(request.command())
            .ok_or_else(|| ConnectionError::UnknownCommand(request.command().to_string()))?;

        trace!(client = %self.addr, command = request.command(), "Dispatching request");

        let response = Response::new(
            Arc::clone(&self.writer),
            request.clone(),
            self.addr,
            Arc::clone(&self.stats),
        );
        handler.serve(response, request).await?;
        self.stats.request_dispatched();
        Ok(())
    }

    /// Reads more data from the socket into the buffer.
    ///
    /// Returns `Ok(false)` if shutdown was requested while waiting.
    async fn read_more_data(&mut self) -> Result<bool, ConnectionError> {
        // Ensure we have some capacity
        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(INITIAL_BUFFER_SIZE);
        }

        let n = tokio::select! {
            n = read_with_deadline(self.reader.read_buf(&mut self.buffer), self.idle_timeout) => n?,
            _ = self.shutdown.wait() => {
                debug!(client = %self.addr, "Shutdown requested while waiting for data");
                return Ok(false);
            }
        };

        if n == 0 {
            // Connection closed by client
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                // Partial line in buffer
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(true)
    }

    /// Shuts down the write half so the peer sees EOF.
    async fn close(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            trace!(client = %self.addr, error = %e, "Socket shutdown failed");
        }
    }
}

async fn read_with_deadline<F>(
    read: F,
    deadline: Option<Duration>,
) -> Result<usize, ConnectionError>
where
    F: Future<Output = io::Result<usize>>,
{
    match deadline {
        Some(limit) => match tokio::time::timeout(limit, read).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ConnectionError::IdleTimeout),
        },
        None => Ok(read.await?),
    }
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue, or a handler failing to write)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Malformed request line
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    /// No handler is registered for the command token
    #[error("No handler registered for command {0:?}")]
    UnknownCommand(String),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial line)
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// A request line exceeded the configured maximum length
    #[error("Request line too long")]
    LineTooLong,

    /// No data arrived within the idle timeout
    #[error("Idle timeout")]
    IdleTimeout,
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion.
///
/// # Arguments
///
/// * `stream` - The TCP stream for this connection
/// * `addr` - The client's socket address
/// * `ctx` - State shared with the server
pub async fn handle_connection(stream: TcpStream, addr: SocketAddr, ctx: ConnectionContext) {
    let handler = ConnectionHandler::new(stream, addr, ctx);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handler_fn;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    fn test_registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry
            .register(
                "F1:",
                Arc::new(handler_fn(|resp: Response, _req: Request| async move {
                    resp.write(b"f1\n").await
                })),
            )
            .unwrap();
        registry
            .register(
                "Q1:",
                Arc::new(handler_fn(|resp: Response, req: Request| async move {
                    resp.write(format!("{}\n", req.data())).await
                })),
            )
            .unwrap();
        registry
            .register(
                "RAW:",
                Arc::new(handler_fn(|resp: Response, req: Request| async move {
                    let payload = req.payload().clone();
                    resp.write(&payload).await
                })),
            )
            .unwrap();
        registry
            .register(
                "WHO:",
                Arc::new(handler_fn(|resp: Response, _req: Request| async move {
                    let request = resp.request();
                    let line = format!(
                        "{} {} {}\n",
                        request.command(),
                        request.data(),
                        resp.peer_addr()
                    );
                    resp.write(line).await
                })),
            )
            .unwrap();
        registry
            .register(
                "BOOM:",
                Arc::new(handler_fn(|_resp: Response, req: Request| async move {
                    if req.data() == "now" {
                        panic!("handler failed");
                    }
                    Ok::<(), io::Error>(())
                })),
            )
            .unwrap();
        registry
            .register(
                "SILENT:",
                Arc::new(handler_fn(|_resp: Response, _req: Request| async move {
                    Ok::<(), io::Error>(())
                })),
            )
            .unwrap();
        registry
    }

    async fn create_test_server(
        config: ServerConfig,
    ) -> (SocketAddr, Shutdown, Arc<ConnectionStats>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let ctx = ConnectionContext {
            registry: Arc::new(test_registry()),
            shutdown: Shutdown::new(),
            config: Arc::new(config),
            stats: Arc::new(ConnectionStats::new()),
        };
        let shutdown = ctx.shutdown.clone();
        let stats = Arc::clone(&ctx.stats);

        tokio::spawn(async move {
            while let Ok((stream, client_addr)) = listener.accept().await {
                tokio::spawn(handle_connection(stream, client_addr, ctx.clone()));
            }
        });

        (addr, shutdown, stats)
    }

    /// Reads until the server closes the connection.
    async fn read_to_close(client: &mut TcpStream) -> Vec<u8> {
        let mut received = Vec::new();
        tokio::time::timeout(Duration::from_secs(2), client.read_to_end(&mut received))
            .await
            .expect("server did not close the connection")
            .unwrap();
        received
    }

    #[tokio::test]
    async fn test_request_response() {
        let (addr, _, _) = create_test_server(ServerConfig::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"F1: TEST\n").await.unwrap();

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "f1\n");
    }

    #[tokio::test]
    async fn test_data_keeps_extra_separators() {
        let (addr, _, _) = create_test_server(ServerConfig::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"Q1: hello: world\n").await.unwrap();

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "hello: world\n");
    }

    #[tokio::test]
    async fn test_handler_sees_raw_payload() {
        let (addr, _, _) = create_test_server(ServerConfig::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"RAW: a b c\n").await.unwrap();

        let mut buf = [0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"RAW: a b c\n");
    }

    #[tokio::test]
    async fn test_binary_data_is_dispatched() {
        let (addr, _, stats) = create_test_server(ServerConfig::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"RAW: \xff\xfe\n").await.unwrap();

        let mut buf = [0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"RAW: \xff\xfe\n");

        // The connection stays usable afterwards
        client.write_all(b"F1: TEST\n").await.unwrap();
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"f1\n");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.requests_dispatched.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_response_knows_request_and_peer() {
        let (addr, _, _) = create_test_server(ServerConfig::default()).await;
        let client = TcpStream::connect(addr).await.unwrap();
        let local = client.local_addr().unwrap();

        let mut reader = BufReader::new(client);
        reader.get_mut().write_all(b"WHO: me\n").await.unwrap();

        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, format!("WHO: me {}\n", local));
    }

    #[tokio::test]
    async fn test_panicking_handler_releases_connection() {
        let (addr, _, stats) = create_test_server(ServerConfig::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 1);

        client.write_all(b"BOOM: now\n").await.unwrap();
        assert!(read_to_close(&mut client).await.is_empty());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
        assert_eq!(stats.requests_dispatched.load(Ordering::Relaxed), 0);

        // The server keeps serving other clients
        let mut other = TcpStream::connect(addr).await.unwrap();
        other.write_all(b"F1: TEST\n").await.unwrap();
        let mut buf = [0u8; 16];
        let n = other.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"f1\n");
    }

    #[tokio::test]
    async fn test_bad_line_closes_connection() {
        let (addr, _, stats) = create_test_server(ServerConfig::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"BADLINE\n").await.unwrap();

        assert!(read_to_close(&mut client).await.is_empty());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.requests_dispatched.load(Ordering::Relaxed), 0);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_unknown_command_closes_connection() {
        let (addr, _, _) = create_test_server(ServerConfig::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"NOPE: x\n").await.unwrap();
        assert!(read_to_close(&mut client).await.is_empty());

        // Other clients are unaffected
        let mut other = TcpStream::connect(addr).await.unwrap();
        other.write_all(b"F1: TEST\n").await.unwrap();
        let mut buf = [0u8; 16];
        let n = other.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"f1\n");
    }

    #[tokio::test]
    async fn test_sequential_requests_in_order() {
        let (addr, _, _) = create_test_server(ServerConfig::default()).await;
        let client = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = client.into_split();

        // Several frames in a single write
        write_half
            .write_all(b"Q1: first\nQ1: second\nF1: x\nQ1: third\n")
            .await
            .unwrap();

        let mut reader = BufReader::new(read_half);
        let mut lines = Vec::new();
        for _ in 0..4 {
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            lines.push(line);
        }
        assert_eq!(lines, vec!["first\n", "second\n", "f1\n", "third\n"]);
    }

    #[tokio::test]
    async fn test_frame_split_across_writes() {
        let (addr, _, _) = create_test_server(ServerConfig::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"Q1: hel").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.write_all(b"lo\n").await.unwrap();

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "hello\n");
    }

    #[tokio::test]
    async fn test_silent_handler_keeps_connection_open() {
        let (addr, _, stats) = create_test_server(ServerConfig::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"SILENT: x\nF1: y\n").await.unwrap();

        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"f1\n");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.requests_dispatched.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_line_too_long_closes_connection() {
        let config = ServerConfig {
            max_line_length: 16,
            ..ServerConfig::default()
        };
        let (addr, _, _) = create_test_server(config).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"Q1: this line is far too long\n").await.unwrap();
        assert!(read_to_close(&mut client).await.is_empty());
    }

    #[tokio::test]
    async fn test_idle_timeout_closes_connection() {
        let config = ServerConfig {
            idle_timeout: Some(Duration::from_millis(100)),
            ..ServerConfig::default()
        };
        let (addr, _, stats) = create_test_server(config).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        assert!(read_to_close(&mut client).await.is_empty());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_connection() {
        let (addr, shutdown, _) = create_test_server(ServerConfig::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        client.write_all(b"F1: TEST\n").await.unwrap();
        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"f1\n");

        shutdown.trigger();
        assert!(read_to_close(&mut client).await.is_empty());
    }

    #[tokio::test]
    async fn test_connection_stats() {
        let (addr, _, stats) = create_test_server(ServerConfig::default()).await;

        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);

        let mut client = TcpStream::connect(addr).await.unwrap();

        // Give the server time to accept the connection
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(stats.connections_accepted.load(Ordering::Relaxed), 1);
        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 1);

        client.write_all(b"F1: TEST\n").await.unwrap();
        let mut buf = [0u8; 16];
        let _ = client.read(&mut buf).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(stats.requests_dispatched.load(Ordering::Relaxed), 1);
        assert_eq!(stats.bytes_read.load(Ordering::Relaxed), 9);
        assert_eq!(stats.bytes_written.load(Ordering::Relaxed), 3);

        // Close connection
        drop(client);

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(stats.active_connections.load(Ordering::Relaxed), 0);
    }
}
