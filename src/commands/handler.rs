//! Request Handlers
//!
//! A handler is the code a server runs for one command token. It receives
//! the [`Response`] bound to the client's connection and the parsed
//! [`Request`], and writes zero or more bytes back.
//!
//! Handlers are async: the connection worker awaits the returned future to
//! completion before it reads the next frame, so requests on one connection
//! are always handled in arrival order.
//!
//! ## Example
//!
//! ```ignore
//! use tcpline::commands::handler_fn;
//!
//! let echo = handler_fn(|resp, req| async move {
//!     resp.write(format!("{}\n", req.data())).await
//! });
//! ```

use crate::connection::Response;
use crate::protocol::Request;
use std::future::Future;
use std::io;
use std::pin::Pin;

/// The future returned by a [`Handler`].
///
/// An `Err` closes the connection the request arrived on.
pub type HandlerFuture = Pin<Box<dyn Future<Output = io::Result<()>> + Send + 'static>>;

/// Serves requests for a registered command pattern.
pub trait Handler: Send + Sync + 'static {
    /// Handles one request, writing any reply through `resp`.
    fn serve(&self, resp: Response, req: Request) -> HandlerFuture;
}

/// Adapter that turns an async closure into a [`Handler`].
///
/// Built with [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Response, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = io::Result<()>> + Send + 'static,
{
    fn serve(&self, resp: Response, req: Request) -> HandlerFuture {
        Box::pin((self.f)(resp, req))
    }
}

/// Wraps a closure returning a future as a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Response, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = io::Result<()>> + Send + 'static,
{
    HandlerFn { f }
}
