//! # tcpline - A Line-Oriented TCP Request Dispatcher
//!
//! tcpline accepts TCP connections, reads newline-terminated requests of the
//! form `COMMAND: data`, and routes each one to the handler registered for
//! its command token.
//!
//! ## Features
//!
//! - **Simple Wire Format**: One request per line, `<TOKEN>: <DATA>\n`
//! - **Checked Routing**: Patterns are validated and deduplicated at registration
//! - **Async I/O**: Built on Tokio, one task per connection
//! - **Graceful Shutdown**: A shared signal stops the accept loop and idle connections
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              tcpline                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ Accept Loop │───>│ Connection  │───>│  Handler    │                  │
//! │  │  (Server)   │    │  Handler    │    │  Registry   │                  │
//! │  └──────┬──────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │         │                  │                  │                         │
//! │         │                  ▼                  ▼                         │
//! │         │           ┌─────────────┐    ┌─────────────┐                  │
//! │         │           │    Line     │    │  Handler    │──> Response      │
//! │         │           │   Parser    │    │  (yours)    │                  │
//! │         │           └─────────────┘    └─────────────┘                  │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   Shutdown (watch channel)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use tcpline::{Server, ServerError};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = Server::new();
//!     server.handle_fn("F1:", |resp, _req| async move {
//!         resp.write(b"f1\n").await
//!     })?;
//!
//!     match server.listen_and_serve("127.0.0.1:8000").await {
//!         Err(ServerError::Closed) | Ok(()) => Ok(()),
//!         Err(e) => Err(e.into()),
//!     }
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: Request type and line parser
//! - [`commands`]: Handler trait and registry
//! - [`connection`]: Per-connection worker and response writer
//! - [`server`]: Accept loop, configuration and shutdown signal
//!
//! ## Design Highlights
//!
//! ### Registration Before Serving
//!
//! Handlers are registered on a `&mut Server`. Serving consumes the server and
//! moves the registry behind an `Arc`, so it is read-only while any
//! connection is live.
//!
//! ### Fail the Connection, Not the Server
//!
//! A malformed line, an unknown command or a failed write closes the
//! offending connection. Nothing is written back and other clients carry on.

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod server;

// Re-export commonly used types for convenience
pub use commands::{handler_fn, Handler, HandlerRegistry, RegistryError};
pub use connection::{ConnectionStats, Response};
pub use protocol::{ParseError, Request};
pub use server::{Server, ServerConfig, ServerError, Shutdown};

/// The default port tcpline listens on
pub const DEFAULT_PORT: u16 = 8000;

/// The default host tcpline binds to
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Address bound by `listen_and_serve` when given an empty string
pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";

/// Version of tcpline
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
