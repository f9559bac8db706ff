//! Line Protocol Implementation
//!
//! This module provides the newline-delimited request protocol spoken by
//! tcpline clients.
//!
//! ## Overview
//!
//! Every request is one line: an uppercase ASCII command token, a
//! colon and a space, then free-form data bytes. Responses carry no framing of
//! their own; handlers decide what bytes to send back.
//!
//! ## Modules
//!
//! - `types`: Defines the `Request` value
//! - `parser`: Frame detection and request parsing
//!
//! ## Example
//!
//! ```
//! use tcpline::protocol::{find_frame, parse_request};
//! use bytes::Bytes;
//!
//! let buf = b"ECHO: hello\nPING: ";
//! let end = find_frame(buf).unwrap();
//! let req = parse_request(Bytes::copy_from_slice(&buf[..=end])).unwrap();
//! assert_eq!(req.command(), "ECHO:");
//! assert_eq!(req.data(), "hello");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{find_frame, parse_request, ParseError, ParseResult};
pub use types::Request;
