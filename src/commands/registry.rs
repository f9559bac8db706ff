//! Handler Registry
//!
//! Maps command patterns such as `GET1:` or `PUT:` to their handlers.
//!
//! A pattern must be one or more uppercase ASCII letters, optionally
//! followed by digits, and end with a colon. Registration checks this up
//! front so a typo fails at startup instead of leaving requests unroutable
//! once the server is live.
//!
//! Lookups are exact: the command token parsed from a frame, colon
//! included, must equal the registered pattern.

use crate::commands::handler::Handler;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

static PATTERN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]+[0-9]*:$").expect("pattern regex is valid"));

/// Errors raised while registering a handler.
///
/// These are configuration errors: the server should not start serving
/// after one of them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The pattern is the empty string
    #[error("empty pattern")]
    EmptyPattern,

    /// The pattern does not match `[A-Z]+[0-9]*:`
    #[error(
        "invalid pattern {0:?}: expected uppercase letters, optional digits and a trailing colon"
    )]
    InvalidPattern(String),

    /// A handler is already registered for the pattern
    #[error("multiple registrations for pattern {0:?}")]
    DuplicatePattern(String),
}

/// Returns `true` if `pattern` is a well-formed command pattern.
pub fn is_valid_pattern(pattern: &str) -> bool {
    PATTERN_RE.is_match(pattern)
}

/// Maps command patterns to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `pattern`.
    ///
    /// Fails if the pattern is empty, malformed or already taken. The
    /// registry is left unchanged on failure.
    pub fn register(
        &mut self,
        pattern: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<(), RegistryError> {
        if pattern.is_empty() {
            return Err(RegistryError::EmptyPattern);
        }
        if !is_valid_pattern(pattern) {
            return Err(RegistryError::InvalidPattern(pattern.to_string()));
        }
        if self.entries.contains_key(pattern) {
            return Err(RegistryError::DuplicatePattern(pattern.to_string()));
        }

        self.entries.insert(pattern.to_string(), handler);
        Ok(())
    }

    /// Returns the handler registered for exactly `command`.
    pub fn lookup(&self, command: &str) -> Option<&Arc<dyn Handler>> {
        self.entries.get(command)
    }

    /// Returns the registered patterns in sorted order.
    pub fn patterns(&self) -> Vec<&str> {
        let mut patterns: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        patterns.sort_unstable();
        patterns
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("patterns", &self.patterns())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::handler::handler_fn;
    use crate::connection::Response;
    use crate::protocol::Request;

    fn noop() -> Arc<dyn Handler> {
        Arc::new(handler_fn(|_resp: Response, _req: Request| async {
            Ok::<(), std::io::Error>(())
        }))
    }

    #[test]
    fn test_valid_patterns() {
        for pattern in ["F1:", "PUT:", "GET1:", "A:", "ABC123:"] {
            assert!(is_valid_pattern(pattern), "{pattern} should be valid");
        }
    }

    #[test]
    fn test_invalid_patterns() {
        for pattern in ["", "PUT", "put:", "Put:", "1A:", ":", "A1B:", "A::", "A :", " A:", "A:x"] {
            assert!(!is_valid_pattern(pattern), "{pattern:?} should be invalid");
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = HandlerRegistry::new();
        let handler = noop();
        registry.register("F1:", Arc::clone(&handler)).unwrap();

        let found = registry.lookup("F1:").unwrap();
        assert!(Arc::ptr_eq(found, &handler));
        assert!(registry.lookup("F2:").is_none());
        assert!(registry.lookup("F1").is_none());
        assert!(registry.lookup("f1:").is_none());
    }

    #[test]
    fn test_register_empty_pattern() {
        let mut registry = HandlerRegistry::new();
        assert_eq!(registry.register("", noop()), Err(RegistryError::EmptyPattern));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_missing_colon() {
        let mut registry = HandlerRegistry::new();
        assert_eq!(
            registry.register("PUT", noop()),
            Err(RegistryError::InvalidPattern("PUT".to_string()))
        );
    }

    #[test]
    fn test_register_lowercase() {
        let mut registry = HandlerRegistry::new();
        assert_eq!(
            registry.register("get:", noop()),
            Err(RegistryError::InvalidPattern("get:".to_string()))
        );
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = HandlerRegistry::new();
        let first = noop();
        registry.register("PUT:", Arc::clone(&first)).unwrap();

        assert_eq!(
            registry.register("PUT:", noop()),
            Err(RegistryError::DuplicatePattern("PUT:".to_string()))
        );
        // The original registration survives
        assert!(Arc::ptr_eq(registry.lookup("PUT:").unwrap(), &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_patterns_sorted() {
        let mut registry = HandlerRegistry::new();
        registry.register("PUT:", noop()).unwrap();
        registry.register("GET1:", noop()).unwrap();
        registry.register("DEL:", noop()).unwrap();

        assert_eq!(registry.patterns(), vec!["DEL:", "GET1:", "PUT:"]);
        assert_eq!(
            format!("{registry:?}"),
            r#"HandlerRegistry { patterns: ["DEL:", "GET1:", "PUT:"] }"#
        );
    }
}
