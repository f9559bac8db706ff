//! Server Module
//!
//! The [`Server`] owns the handler registry and the accept loop. It is set up
//! in two phases:
//!
//! 1. **Registration**: handlers are added with [`Server::handle`] or
//!    [`Server::handle_fn`]. Bad or duplicate patterns are reported here.
//! 2. **Serving**: [`Server::serve`] (or [`Server::listen_and_serve`]) takes
//!    the server by value, freezes the registry and accepts connections until
//!    the listener fails or shutdown is requested.
//!
//! Since serving consumes the server, the registry cannot change while
//! connections are being handled.
//!
//! ## Shutdown
//!
//! Grab a [`Shutdown`] handle with [`Server::shutdown_handle`] before serving.
//! Triggering it makes `serve` stop accepting and return
//! [`ServerError::Closed`]. Connections waiting for their next line are
//! closed; handlers already running are allowed to finish within
//! [`ServerConfig::shutdown_grace`].

pub mod config;
pub mod shutdown;

pub use config::ServerConfig;
pub use shutdown::Shutdown;

use crate::commands::{handler_fn, Handler, HandlerRegistry, RegistryError};
use crate::connection::{handle_connection, ConnectionContext, ConnectionStats, Response};
use crate::protocol::Request;
use crate::DEFAULT_ADDR;
use std::future::Future;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Errors that end a call to [`Server::serve`].
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Accepting a connection failed while no shutdown was requested
    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// The server stopped because shutdown was requested
    #[error("server closed")]
    Closed,
}

/// A line-oriented TCP request dispatcher.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    registry: HandlerRegistry,
    shutdown: Shutdown,
    stats: Arc<ConnectionStats>,
}

impl Server {
    /// Creates a server with the default configuration and no handlers.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Creates a server with the given configuration and no handlers.
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
            shutdown: Shutdown::new(),
            stats: Arc::new(ConnectionStats::new()),
        }
    }

    /// Registers `handler` for `pattern`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// server.handle("F1:", handler_fn(|resp, _req| async move {
    ///     resp.write(b"f1\n").await
    /// }))?;
    /// ```
    pub fn handle<H: Handler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RegistryError> {
        self.registry.register(pattern, Arc::new(handler))?;
        Ok(self)
    }

    /// Registers an async closure as the handler for `pattern`.
    pub fn handle_fn<F, Fut>(&mut self, pattern: &str, f: F) -> Result<&mut Self, RegistryError>
    where
        F: Fn(Response, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = io::Result<()>> + Send + 'static,
    {
        self.handle(pattern, handler_fn(f))
    }

    /// The handlers registered so far.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Returns a handle that stops this server when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Connection statistics, live while the server runs.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Binds `addr` and serves connections on it.
    ///
    /// An empty `addr` binds [`DEFAULT_ADDR`].
    pub async fn listen_and_serve(self, addr: &str) -> Result<(), ServerError> {
        let addr = if addr.is_empty() { DEFAULT_ADDR } else { addr };
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Listening on {}", addr);

        self.serve(listener).await
    }

    /// Accepts connections on `listener` until shutdown or an accept failure.
    ///
    /// Each connection is handled on its own task. This never returns
    /// `Ok`: a requested shutdown yields [`ServerError::Closed`] and any other
    /// accept failure yields [`ServerError::Accept`].
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let Server {
            config,
            registry,
            shutdown,
            stats,
        } = self;

        info!(handlers = ?registry.patterns(), "Server ready to accept connections");

        let config = Arc::new(config);
        let permits = config
            .max_connections
            .map(|max| Arc::new(Semaphore::new(max)));
        let ctx = ConnectionContext {
            registry: Arc::new(registry),
            shutdown: shutdown.clone(),
            config: Arc::clone(&config),
            stats: Arc::clone(&stats),
        };
        let mut workers = JoinSet::new();

        let outcome = loop {
            tokio::select! {
                biased;

                _ = shutdown.wait() => {
                    info!("Shutdown requested, no longer accepting connections");
                    break ServerError::Closed;
                }

                res = listener.accept() => match res {
                    Ok((stream, addr)) => {
                        let permit = match &permits {
                            Some(permits) => match Arc::clone(permits).try_acquire_owned() {
                                Ok(permit) => Some(permit),
                                Err(_) => {
                                    warn!(
                                        client = %addr,
                                        "Connection limit reached, rejecting client"
                                    );
                                    stats.connection_rejected();
                                    drop(stream);
                                    continue;
                                }
                            },
                            None => None,
                        };

                        let ctx = ctx.clone();
                        workers.spawn(async move {
                            handle_connection(stream, addr, ctx).await;
                            drop(permit);
                        });
                    }
                    Err(e) => {
                        if shutdown.is_triggered() {
                            break ServerError::Closed;
                        }
                        error!("Failed to accept connection: {}", e);
                        break ServerError::Accept(e);
                    }
                },

                Some(res) = workers.join_next(), if !workers.is_empty() => {
                    if let Err(e) = res {
                        if e.is_panic() {
                            error!("A connection worker panicked: {e:?}");
                        }
                    }
                }
            }
        };

        drop(listener);

        match outcome {
            ServerError::Closed => {
                drain_workers(&mut workers, &config).await;
                info!("Server closed");
            }
            _ => {
                // Live connections outlive a failed listener
                workers.detach_all();
            }
        }

        Err(outcome)
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for live connections to finish, aborting them after the grace period.
async fn drain_workers(workers: &mut JoinSet<()>, config: &ServerConfig) {
    if workers.is_empty() {
        return;
    }

    info!(connections = workers.len(), "Waiting for connections to close");
    let drained = tokio::time::timeout(config.shutdown_grace, async {
        while workers.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(
            connections = workers.len(),
            "Shutdown grace period elapsed, aborting connections"
        );
        workers.shutdown().await;
    }
}
