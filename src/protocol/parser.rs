//! Line Protocol Parser
//!
//! This module turns raw frames into [`Request`] values.
//!
//! ## How the Parser Works
//!
//! Parsing happens in two steps:
//!
//! 1. [`find_frame`] scans the connection's read buffer for the first `\n`.
//!    `None` means the frame is incomplete and more data must be read.
//! 2. [`parse_request`] takes the complete frame, strips the trailing newline
//!    and splits it on the first `": "` into command and data.
//!
//! Only the first separator splits. Everything after it stays in the data,
//! so `Q1: hello: world` yields the data `hello: world`.
//!
//! Splitting works on raw bytes. The command token must be ASCII; the data
//! may hold any bytes and is decoded lossily, while the payload keeps the
//! line exactly as it arrived.
//!
//! Any error returned here is fatal to the connection that produced the
//! frame, never to the server.

use crate::protocol::types::{Request, NEWLINE, SEPARATOR};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while parsing a frame.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// The frame has no `": "` separator
    #[error("invalid request format: expected \"<COMMAND>: <DATA>\"")]
    InvalidFormat,

    /// The command token holds non-ASCII bytes
    #[error("invalid command token: expected ASCII")]
    InvalidToken,
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Finds the end of the first complete frame in the buffer.
///
/// Returns the index of the terminating `\n`, or `None` if the buffer does
/// not yet hold a whole line.
#[inline]
pub fn find_frame(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == NEWLINE)
}

/// Parses one frame into a [`Request`].
///
/// The frame should still carry its trailing newline; it is kept in the
/// request payload and stripped before splitting.
///
/// # Example
///
/// ```
/// use tcpline::protocol::parse_request;
/// use bytes::Bytes;
///
/// let req = parse_request(Bytes::from("F1: TEST\n")).unwrap();
/// assert_eq!(req.command(), "F1:");
/// assert_eq!(req.data(), "TEST");
/// ```
pub fn parse_request(frame: Bytes) -> ParseResult<Request> {
    let mut end = frame.len();
    while end > 0 && frame[end - 1] == NEWLINE {
        end -= 1;
    }
    let line = &frame[..end];

    let split = find_separator(line).ok_or(ParseError::InvalidFormat)?;
    let token = &line[..split];
    if !token.is_ascii() {
        return Err(ParseError::InvalidToken);
    }

    let mut command = String::with_capacity(token.len() + 1);
    command.extend(token.iter().map(|&b| char::from(b)));
    command.push(':');

    let data = String::from_utf8_lossy(&line[split + SEPARATOR.len()..]).into_owned();
    Ok(Request::new(frame, command, data))
}

/// Index of the first `": "` in `line`.
fn find_separator(line: &[u8]) -> Option<usize> {
    let sep = SEPARATOR.as_bytes();
    line.windows(sep.len()).position(|w| w == sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> ParseResult<Request> {
        parse_request(Bytes::from(input.to_string()))
    }

    #[test]
    fn test_parse_simple_request() {
        let req = parse("F1: TEST\n").unwrap();
        assert_eq!(req.command(), "F1:");
        assert_eq!(req.data(), "TEST");
        assert_eq!(req.payload(), &Bytes::from("F1: TEST\n"));
    }

    #[test]
    fn test_parse_letters_and_digits() {
        let req = parse("GET12: some key\n").unwrap();
        assert_eq!(req.command(), "GET12:");
        assert_eq!(req.data(), "some key");
    }

    #[test]
    fn test_parse_only_first_separator_splits() {
        let req = parse("Q1: hello: world\n").unwrap();
        assert_eq!(req.command(), "Q1:");
        assert_eq!(req.data(), "hello: world");
    }

    #[test]
    fn test_parse_empty_data() {
        let req = parse("PING: \n").unwrap();
        assert_eq!(req.command(), "PING:");
        assert_eq!(req.data(), "");
    }

    #[test]
    fn test_parse_without_newline() {
        let req = parse("PUT: value").unwrap();
        assert_eq!(req.command(), "PUT:");
        assert_eq!(req.data(), "value");
    }

    #[test]
    fn test_parse_strips_all_trailing_newlines() {
        let req = parse("PUT: value\n\n").unwrap();
        assert_eq!(req.data(), "value");
    }

    #[test]
    fn test_parse_keeps_carriage_return_in_data() {
        let req = parse("PUT: value\r\n").unwrap();
        assert_eq!(req.data(), "value\r");
    }

    #[test]
    fn test_parse_missing_separator() {
        assert_eq!(parse("FOO\n"), Err(ParseError::InvalidFormat));
        assert_eq!(parse("BADLINE\n"), Err(ParseError::InvalidFormat));
    }

    #[test]
    fn test_parse_colon_without_space() {
        assert_eq!(parse("FOO:bar\n"), Err(ParseError::InvalidFormat));
    }

    #[test]
    fn test_parse_empty_line() {
        assert_eq!(parse("\n"), Err(ParseError::InvalidFormat));
    }

    #[test]
    fn test_parse_binary_data() {
        let frame = Bytes::from_static(b"CMD: \xff\xfe\n");
        let req = parse_request(frame.clone()).unwrap();
        assert_eq!(req.command(), "CMD:");
        assert_eq!(req.data(), "\u{FFFD}\u{FFFD}");
        assert_eq!(req.payload(), &frame);
    }

    #[test]
    fn test_parse_binary_data_with_separator() {
        let req = parse_request(Bytes::from_static(b"CMD: \x80: \x00\n")).unwrap();
        assert_eq!(req.command(), "CMD:");
        assert_eq!(req.data(), "\u{FFFD}: \0");
    }

    #[test]
    fn test_parse_non_ascii_token() {
        let frame = Bytes::from_static(b"C\xc3\xa9: x\n");
        assert_eq!(parse_request(frame), Err(ParseError::InvalidToken));
    }

    #[test]
    fn test_find_frame() {
        assert_eq!(find_frame(b"F1: TEST\n"), Some(8));
        assert_eq!(find_frame(b"A: 1\nB: 2\n"), Some(4));
        assert_eq!(find_frame(b"F1: TE"), None);
        assert_eq!(find_frame(b""), None);
    }
}
