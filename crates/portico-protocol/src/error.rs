//! Errors raised while tokenizing inbound device lines.

use thiserror::Error;

/// A line that does not match the inbound event grammar.
///
/// Parse errors are always recoverable: the offending line is discarded
/// and the reader moves on to the next one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Line was empty after trimming the terminator.
    #[error("Empty line")]
    Empty,

    /// Line did not contain exactly the expected number of fields.
    #[error("Expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// A field was not of the form `key=value`.
    #[error("Malformed field at position {position}: {field:?}")]
    MalformedField { position: usize, field: String },

    /// A field carried the wrong key for its position.
    #[error("Expected key {expected:?} at position {position}, found {found:?}")]
    UnexpectedKey {
        position: usize,
        expected: &'static str,
        found: String,
    },

    /// A field value was outside its allowed set.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
