//! Line Protocol Data Types
//!
//! This module defines the request value produced for every frame read off
//! a connection.
//!
//! ## Protocol Format
//!
//! Each frame is a single line terminated by `\n`:
//!
//! ```text
//! <COMMAND-TOKEN>: <DATA>\n
//! ```
//!
//! - `COMMAND-TOKEN` is one or more uppercase letters followed by optional digits
//! - The separator is a colon followed by a single space
//! - `DATA` is everything after the first separator; any bytes are allowed
//!
//! ## Examples
//!
//! Simple request: `PING: hello\n`
//! Data containing the separator: `Q1: hello: world\n` (data is `hello: world`)

use bytes::Bytes;
use std::fmt;

/// The frame terminator used by the line protocol
pub const NEWLINE: u8 = b'\n';

/// Separator between the command token and the data
pub const SEPARATOR: &str = ": ";

/// A single parsed request.
///
/// Requests are immutable and cheap to clone: the raw payload is a
/// reference-counted [`Bytes`] and the command token is short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The original raw bytes of the frame, newline included
    payload: Bytes,

    /// The command token including its trailing colon, e.g. `GET1:`
    command: String,

    /// Everything after the first separator
    data: String,
}

impl Request {
    /// Creates a new request from its parts.
    ///
    /// # Example
    /// ```
    /// use tcpline::protocol::Request;
    /// use bytes::Bytes;
    ///
    /// let req = Request::new(Bytes::from("F1: TEST\n"), "F1:", "TEST");
    /// assert_eq!(req.command(), "F1:");
    /// ```
    pub fn new(
        payload: impl Into<Bytes>,
        command: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            payload: payload.into(),
            command: command.into(),
            data: data.into(),
        }
    }

    /// The unparsed frame as it arrived on the wire.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The command token, trailing colon included.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// The data following the first separator.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD; use [`payload`](Self::payload)
    /// for the exact bytes.
    pub fn data(&self) -> &str {
        &self.data
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.command, self.data)
    }
}
