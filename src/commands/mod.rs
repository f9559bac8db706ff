//! Command Routing Module
//!
//! This module implements the routing layer for tcpline. It holds the
//! handlers registered by the hosting application and resolves the command
//! token of each parsed request to one of them.
//!
//! ## Architecture
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────────┐
//! │  Line Parser    │  (protocol module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ HandlerRegistry │  (this module)
//! │                 │
//! │  - Validate     │
//! │  - Lookup       │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Handler      │  (application code)
//! └─────────────────┘
//! ```
//!
//! ## Patterns
//!
//! Patterns are uppercase letters, optional digits and a trailing colon:
//! `F1:`, `PUT:`, `GET12:`. Anything else is rejected at registration.

pub mod handler;
pub mod registry;

// Re-export the routing types
pub use handler::{handler_fn, Handler, HandlerFn, HandlerFuture};
pub use registry::{is_valid_pattern, HandlerRegistry, RegistryError};
