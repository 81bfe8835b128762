//! Error types for decoding and key-order extraction.
//!
//! Every error carries the byte position it was raised at, and optionally a
//! short preview of the input around that position to help debug malformed
//! payloads.

use std::fmt;
use thiserror::Error;

/// The main error type for PHP serialized data inspection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct PhpDeserializeError {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// The byte position where the error occurred.
    pub position: usize,
    /// Optional context about what was being parsed.
    pub context: Option<String>,
    /// Preview of input around error position for debugging.
    pub input_preview: Option<String>,
}

impl fmt::Display for PhpDeserializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.kind, self.position)?;
        if let Some(ref ctx) = self.context {
            write!(f, " ({})", ctx)?;
        }
        if let Some(ref preview) = self.input_preview {
            write!(f, "\n{}", preview)?;
        }
        Ok(())
    }
}

/// Specific kinds of errors.
///
/// The first group is raised by the key-order scan, the second by the value
/// decoder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No `{ ... }` pair delimiting a top-level container.
    #[error("malformed container: no matching '{{' and '}}'")]
    MalformedContainer,

    /// The declared length of a key is not a non-negative integer.
    #[error("invalid key length: {0:?}")]
    InvalidLength(String),

    /// A key's length separator is not followed by an opening quote.
    #[error("malformed key: expected '\"' after length")]
    MalformedKey,

    /// A key declares more bytes than remain in the container.
    #[error("truncated key: declared {expected} bytes, {found} available")]
    TruncatedKey {
        /// The declared key length in bytes.
        expected: usize,
        /// The number of bytes actually available.
        found: usize,
    },

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Expected a specific character but found something else.
    #[error("expected '{expected}', found '{found}'")]
    UnexpectedChar {
        /// The character that was expected.
        expected: char,
        /// The character that was found.
        found: char,
    },

    /// Unknown type marker.
    #[error("unknown type marker '{0}'")]
    UnknownMarker(char),

    /// An integer, float, length or count literal that does not parse.
    #[error("invalid numeric literal: {0:?}")]
    InvalidNumericLiteral(String),

    /// Invalid boolean value.
    #[error("invalid boolean value: {0}")]
    InvalidBoolean(String),

    /// String payload length differs from its declared length.
    #[error("string length mismatch: expected {expected}, found {found}")]
    TextLengthMismatch {
        /// The declared string length in bytes.
        expected: usize,
        /// The payload length actually observed.
        found: usize,
    },

    /// Array holds a different number of pairs than it declares.
    #[error("array entry count mismatch: expected {expected}, found {found}")]
    EntryCountMismatch {
        /// The declared entry count.
        expected: usize,
        /// The number of pairs present.
        found: usize,
    },

    /// Invalid array key type.
    #[error("invalid array key type: expected string or integer")]
    InvalidArrayKey,

    /// Nesting depth exceeded.
    #[error("maximum nesting depth ({0}) exceeded")]
    DepthExceeded(usize),
}

impl PhpDeserializeError {
    /// Create a new error with the given kind and position.
    #[inline]
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        Self {
            kind,
            position,
            context: None,
            input_preview: None,
        }
    }

    /// Add context to the error.
    #[inline]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add input preview around the error position for debugging.
    ///
    /// Shows up to 20 bytes before and after the error position.
    #[cold]
    pub fn with_input_preview(mut self, data: &[u8], error_pos: usize) -> Self {
        let start = error_pos.saturating_sub(20).min(data.len());
        let end = (error_pos + 20).min(data.len());

        if start < end {
            let preview = String::from_utf8_lossy(&data[start..end]);

            // Mark the error position with a caret
            let relative_pos = error_pos.saturating_sub(start);
            let mut result = String::with_capacity(preview.len() + relative_pos + 2);
            result.push_str(&preview);
            result.push('\n');
            result.push_str(&" ".repeat(relative_pos));
            result.push('^');

            self.input_preview = Some(result);
        }
        self
    }

    /// Whether the error came from the key-order scan rather than the decoder.
    pub fn is_key_order_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::MalformedContainer
                | ErrorKind::InvalidLength(_)
                | ErrorKind::MalformedKey
                | ErrorKind::TruncatedKey { .. }
        )
    }
}

/// Result type alias for PHP serialized data inspection.
pub type Result<T> = std::result::Result<T, PhpDeserializeError>;
