//! Response Writer
//!
//! A [`Response`] binds the write half of a client connection to the request
//! that triggered it. Handlers use it to send bytes back.
//!
//! Writes are unbuffered from the handler's point of view: `write` returns
//! only after every byte has been handed to the socket and flushed. The
//! protocol imposes no framing on replies, so line-oriented clients expect
//! handlers to end each reply with `\n`.

use crate::connection::handler::ConnectionStats;
use crate::protocol::Request;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tracing::trace;

/// Write half of a connection, shared between its worker and the
/// response handed to the current handler.
pub(crate) type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

/// The reply channel for a single request.
pub struct Response {
    writer: SharedWriter,
    request: Request,
    peer: SocketAddr,
    stats: Arc<ConnectionStats>,
}

impl Response {
    pub(crate) fn new(
        writer: SharedWriter,
        request: Request,
        peer: SocketAddr,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        Self {
            writer,
            request,
            peer,
            stats,
        }
    }

    /// Writes all of `bytes` to the client and flushes.
    ///
    /// An error here usually means the peer went away; returning it from the
    /// handler closes the connection.
    pub async fn write(&self, bytes: impl AsRef<[u8]>) -> io::Result<()> {
        let bytes = bytes.as_ref();
        let mut writer = self.writer.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await?;

        self.stats.bytes_written(bytes.len());
        trace!(client = %self.peer, bytes = bytes.len(), "Sent response");
        Ok(())
    }

    /// The request this response answers.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Address of the connected client.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("peer", &self.peer)
            .field("request", &self.request)
            .finish()
    }
}
