//! Zero-copy PHP serialize decoder.
//!
//! A recursive-descent parser over a borrowed byte buffer. Strings borrow
//! from the input, delimiter search goes through `memchr`, and every length
//! and count declared by the input is checked against what is actually
//! present. There is no lenient recovery: any grammar violation aborts the
//! decode and no partial value is returned.
//!
//! # Grammar
//!
//! | Marker | Form |
//! |--------|------|
//! | `N` | `N;` |
//! | `b` | `b:0;` or `b:1;` |
//! | `i` | `i:<signed decimal>;` |
//! | `d` | `d:<float literal>;` (also `INF`, `-INF`, `NAN`) |
//! | `s` | `s:<len>:"<len bytes>";` |
//! | `a` | `a:<count>:{<key><value>...}` with integer or string keys |
//!
//! # Tracing Support
//!
//! Enable the `tracing` feature for parsing instrumentation:
//!
//! ```toml
//! php-inspect-core = { version = "0.1", features = ["tracing"] }
//! ```

use std::borrow::Cow;

use memchr::{memchr, memmem, memrchr};

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, trace, warn};

use crate::error::{ErrorKind, PhpDeserializeError, Result};
use crate::types::{ArrayKey, PhpValue};

/// Maximum nesting depth to prevent stack overflow.
///
/// Also the ceiling for [`ParserConfig::max_depth`]; larger settings are
/// clamped to it.
pub const MAX_DEPTH: usize = 512;

/// Parser configuration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum number of arrays that may be nested inside each other.
    ///
    /// Values above [`MAX_DEPTH`] are treated as [`MAX_DEPTH`].
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
        }
    }
}

/// A zero-copy PHP serialize parser.
pub struct Parser<'a> {
    /// Input data.
    data: &'a [u8],
    /// Current position in the input.
    pos: usize,
    /// Parser configuration.
    config: ParserConfig,
    /// Current nesting depth.
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser with default configuration.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, ParserConfig::default())
    }

    /// Create a new parser with custom configuration.
    pub fn with_config(data: &'a [u8], config: ParserConfig) -> Self {
        Self {
            data,
            pos: 0,
            config: ParserConfig {
                max_depth: config.max_depth.min(MAX_DEPTH),
            },
            depth: 0,
        }
    }

    /// Byte offset just past the last consumed input.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Parse one value from the input.
    ///
    /// Bytes following the first complete value are ignored, matching PHP's
    /// own `unserialize`.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(data_len = self.data.len())))]
    pub fn parse(&mut self) -> Result<PhpValue<'a>> {
        #[cfg(feature = "tracing")]
        debug!(data_len = self.data.len(), "Starting PHP deserialize");

        let result = self.parse_value();

        #[cfg(feature = "tracing")]
        match &result {
            Ok(value) => {
                if self.pos < self.data.len() {
                    trace!(trailing = self.data.len() - self.pos, "Ignoring trailing bytes");
                }
                debug!(value_type = value.type_name(), "Parse completed successfully");
            }
            Err(e) => warn!(error = %e, "Parse failed"),
        }

        result
    }

    /// Parse a single value at the current position.
    #[cfg_attr(feature = "tracing", instrument(skip(self), level = "trace", fields(pos = self.pos, depth = self.depth)))]
    fn parse_value(&mut self) -> Result<PhpValue<'a>> {
        let type_byte = self.peek_byte()?;

        #[cfg(feature = "tracing")]
        trace!(type_marker = %char::from(type_byte), pos = self.pos, "Parsing value");

        match type_byte {
            b'N' => self.parse_null(),
            b'b' => self.parse_bool(),
            b'i' => self.parse_int().map(PhpValue::Int),
            b'd' => self.parse_float(),
            b's' => self.parse_string().map(PhpValue::String),
            b'a' => self.parse_array(),
            b'O' | b'C' | b'E' | b'R' | b'r' => Err(self
                .unknown_marker_error(type_byte)
                .with_context("objects, enums and references are not supported")),
            _ => Err(self.unknown_marker_error(type_byte)),
        }
    }

    /// Parse a null value: `N;`
    fn parse_null(&mut self) -> Result<PhpValue<'a>> {
        self.expect_byte(b'N')?;
        self.expect_byte(b';')?;
        Ok(PhpValue::Null)
    }

    /// Parse a boolean value: `b:0;` or `b:1;`
    fn parse_bool(&mut self) -> Result<PhpValue<'a>> {
        self.expect_byte(b'b')?;
        self.expect_byte(b':')?;
        let value_pos = self.pos;
        let value_byte = self.read_byte()?;

        let value = match value_byte {
            b'0' => false,
            b'1' => true,
            _ => {
                return Err(PhpDeserializeError::new(
                    ErrorKind::InvalidBoolean(char::from(value_byte).to_string()),
                    value_pos,
                ))
            }
        };

        self.expect_byte(b';')?;
        Ok(PhpValue::Bool(value))
    }

    /// Parse an integer value: `i:<value>;`
    fn parse_int(&mut self) -> Result<i64> {
        self.expect_byte(b'i')?;
        self.expect_byte(b':')?;

        let start = self.pos;
        let literal = self.read_literal(b';')?;
        let value = literal
            .parse()
            .map_err(|_| numeric_error(literal, start).with_context("integer"))?;

        self.expect_byte(b';')?;
        Ok(value)
    }

    /// Parse a float/double value: `d:<value>;`
    fn parse_float(&mut self) -> Result<PhpValue<'a>> {
        self.expect_byte(b'd')?;
        self.expect_byte(b':')?;

        let start = self.pos;
        let literal = self.read_literal(b';')?;

        // PHP spells the special values in upper case; `f64::from_str` would
        // also take `inf`, `infinity` and `nan` in any case
        let value: f64 = match literal {
            "INF" => f64::INFINITY,
            "-INF" => f64::NEG_INFINITY,
            "NAN" => f64::NAN,
            _ if literal
                .bytes()
                .any(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E')) =>
            {
                return Err(numeric_error(literal, start).with_context("float"));
            }
            _ => literal
                .parse()
                .map_err(|_| numeric_error(literal, start).with_context("float"))?,
        };

        self.expect_byte(b';')?;
        Ok(PhpValue::Float(value))
    }

    /// Parse a string value: `s:<len>:"<data>";`
    ///
    /// The payload must be exactly `len` bytes followed by `";`.
    fn parse_string(&mut self) -> Result<Cow<'a, [u8]>> {
        self.expect_byte(b's')?;
        self.expect_byte(b':')?;
        let len = self.read_declared_size(b':')?;
        self.expect_byte(b':')?;
        self.expect_byte(b'"')?;

        let start = self.pos;
        let end = start.saturating_add(len);

        if self.data.get(end) == Some(&b'"') && self.data.get(end + 1) == Some(&b';') {
            self.pos = end + 2;
            return Ok(Cow::Borrowed(&self.data[start..end]));
        }

        let found = observed_payload_len(&self.data[start..]);
        if found == len {
            // Payload has the declared length, so the terminator is what's wrong
            self.pos = end;
            self.expect_byte(b'"')?;
            self.expect_byte(b';')?;
            return Ok(Cow::Borrowed(&self.data[start..end]));
        }

        #[cfg(feature = "tracing")]
        warn!(pos = start, declared_len = len, found, "String length mismatch");

        Err(PhpDeserializeError::new(
            ErrorKind::TextLengthMismatch {
                expected: len,
                found,
            },
            start,
        )
        .with_input_preview(self.data, start))
    }

    /// Parse an array value: `a:<count>:{<key><value>...}`
    ///
    /// Pairs are read until the closing brace so that a wrong declared count
    /// is reported as such rather than as a stray character.
    fn parse_array(&mut self) -> Result<PhpValue<'a>> {
        let array_start = self.pos;
        self.expect_byte(b'a')?;
        self.expect_byte(b':')?;
        let count = self.read_declared_size(b':')?;
        self.expect_byte(b':')?;
        self.expect_byte(b'{')?;

        if self.depth >= self.config.max_depth {
            #[cfg(feature = "tracing")]
            warn!(depth = self.depth, max_depth = self.config.max_depth, "Max depth exceeded");
            return Err(PhpDeserializeError::new(
                ErrorKind::DepthExceeded(self.config.max_depth),
                array_start,
            ));
        }

        self.depth += 1;
        // Cap the initial allocation, the count is untrusted
        let mut items = Vec::with_capacity(count.min(1024));

        while self.peek_byte()? != b'}' {
            let key = self.parse_key()?;
            let value = self.parse_value()?;
            items.push((key, value));
        }
        self.depth -= 1;

        if items.len() != count {
            return Err(PhpDeserializeError::new(
                ErrorKind::EntryCountMismatch {
                    expected: count,
                    found: items.len(),
                },
                array_start,
            )
            .with_input_preview(self.data, array_start));
        }

        self.expect_byte(b'}')?;
        Ok(PhpValue::Array(items))
    }

    /// Parse an array key, which must be an integer or a string.
    fn parse_key(&mut self) -> Result<ArrayKey<'a>> {
        match self.peek_byte()? {
            b'i' => self.parse_int().map(ArrayKey::Int),
            b's' => self.parse_string().map(ArrayKey::String),
            b'N' | b'b' | b'd' | b'a' => Err(PhpDeserializeError::new(
                ErrorKind::InvalidArrayKey,
                self.pos,
            )
            .with_input_preview(self.data, self.pos)),
            other => Err(self.unknown_marker_error(other)),
        }
    }

    // Helper methods - marked #[inline] for performance on hot paths

    /// Peek at the current byte without consuming it.
    #[inline(always)]
    fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| PhpDeserializeError::new(ErrorKind::UnexpectedEof, self.pos))
    }

    /// Read and consume the current byte.
    #[inline(always)]
    fn read_byte(&mut self) -> Result<u8> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Expect a specific byte, returning an error if it doesn't match.
    #[inline]
    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        let byte = self.read_byte()?;
        if byte != expected {
            return Err(self.make_unexpected_char_error(expected, byte));
        }
        Ok(())
    }

    /// Read a declared string length or array count up to `delimiter`.
    fn read_declared_size(&mut self, delimiter: u8) -> Result<usize> {
        let start = self.pos;
        let literal = self.read_literal(delimiter)?;
        // `usize::from_str` accepts a leading '+', PHP never writes one
        if literal.starts_with('+') {
            return Err(numeric_error(literal, start));
        }
        literal.parse().map_err(|_| numeric_error(literal, start))
    }

    /// Read an ASCII literal up to (not including) `delimiter`.
    #[inline]
    fn read_literal(&mut self, delimiter: u8) -> Result<&'a str> {
        let start = self.pos;
        let bytes = self.read_until(delimiter)?;
        std::str::from_utf8(bytes).map_err(|_| {
            PhpDeserializeError::new(
                ErrorKind::InvalidNumericLiteral(String::from_utf8_lossy(bytes).into_owned()),
                start,
            )
        })
    }

    /// Read bytes until the delimiter, using SIMD-accelerated search.
    #[inline]
    fn read_until(&mut self, delimiter: u8) -> Result<&'a [u8]> {
        let start = self.pos;
        match memchr(delimiter, &self.data[start..]) {
            Some(offset) => {
                let result = &self.data[start..start + offset];
                self.pos = start + offset;
                Ok(result)
            }
            None => Err(self.make_delimiter_not_found_error(delimiter)),
        }
    }

    /// Create an unexpected character error with proper context.
    #[cold]
    #[inline(never)]
    fn make_unexpected_char_error(&self, expected: u8, found: u8) -> PhpDeserializeError {
        PhpDeserializeError::new(
            ErrorKind::UnexpectedChar {
                expected: char::from(expected),
                found: char::from(found),
            },
            self.pos - 1,
        )
        .with_input_preview(self.data, self.pos.saturating_sub(1))
    }

    /// Create a delimiter not found error with proper context.
    #[cold]
    #[inline(never)]
    fn make_delimiter_not_found_error(&self, delimiter: u8) -> PhpDeserializeError {
        PhpDeserializeError::new(ErrorKind::UnexpectedEof, self.data.len())
            .with_context(format!("expected '{}'", char::from(delimiter)))
            .with_input_preview(self.data, self.pos)
    }

    #[cold]
    #[inline(never)]
    fn unknown_marker_error(&self, marker: u8) -> PhpDeserializeError {
        #[cfg(feature = "tracing")]
        warn!(type_byte = %char::from(marker), pos = self.pos, "Unknown type marker");

        PhpDeserializeError::new(ErrorKind::UnknownMarker(char::from(marker)), self.pos)
            .with_input_preview(self.data, self.pos)
    }
}

#[cold]
fn numeric_error(literal: &str, position: usize) -> PhpDeserializeError {
    PhpDeserializeError::new(ErrorKind::InvalidNumericLiteral(literal.to_string()), position)
}

/// Length of the string payload actually present at the start of `rest`.
///
/// The payload ends at the first `";`, or failing that at the last quote;
/// with neither, everything up to the end of the input counts.
fn observed_payload_len(rest: &[u8]) -> usize {
    memmem::find(rest, b"\";")
        .or_else(|| memrchr(b'"', rest))
        .unwrap_or(rest.len())
}

/// Parse PHP serialized data from bytes.
///
/// This is the primary API for decoding PHP serialized data.
///
/// # Example
///
/// ```rust
/// use php_inspect_core::from_bytes;
///
/// let value = from_bytes(b"i:42;").unwrap();
/// assert_eq!(value.as_int(), Some(42));
/// ```
#[inline]
pub fn from_bytes(data: &[u8]) -> Result<PhpValue<'_>> {
    #[cfg(feature = "tracing")]
    trace!(data_len = data.len(), "from_bytes called");

    let mut parser = Parser::new(data);
    parser.parse()
}

/// Parse PHP serialized data from bytes with custom configuration.
///
/// # Example
///
/// ```rust
/// use php_inspect_core::{from_bytes_with_config, ErrorKind, ParserConfig};
///
/// let config = ParserConfig { max_depth: 1 };
/// let err = from_bytes_with_config(b"a:1:{i:0;a:0:{}}", config).unwrap_err();
/// assert_eq!(err.kind, ErrorKind::DepthExceeded(1));
/// ```
#[inline]
pub fn from_bytes_with_config(data: &[u8], config: ParserConfig) -> Result<PhpValue<'_>> {
    #[cfg(feature = "tracing")]
    trace!(data_len = data.len(), ?config, "from_bytes_with_config called");

    let mut parser = Parser::with_config(data, config);
    parser.parse()
}
