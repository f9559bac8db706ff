//! Server Configuration

use std::time::Duration;

/// Default maximum length of a single request line (64 KB)
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Tunables for a [`Server`](crate::server::Server).
///
/// The defaults reproduce the plain dispatcher behaviour: unbounded
/// connections and no idle deadline. Only the line length is capped.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Longest accepted request line, newline included (default: 64 KB)
    pub max_line_length: usize,

    /// Maximum number of live connections; extra ones are closed on accept
    /// (default: unbounded)
    pub max_connections: Option<usize>,

    /// Close a connection after this long without receiving any bytes
    /// (default: never)
    pub idle_timeout: Option<Duration>,

    /// How long `serve` waits for live connections to wind down after
    /// shutdown before aborting them (default: 5s)
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_connections: None,
            idle_timeout: None,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}
