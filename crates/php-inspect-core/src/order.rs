//! Declaration-order recovery for the keys of the top-level array.
//!
//! A decoded array already keeps its pairs in order, but consumers that went
//! through an unordered map lose it. This module recovers the order directly
//! from the byte stream, without decoding values.
//!
//! The scan only looks between the first `{` and the last `}` of the input.
//! Two modes are available:
//!
//! - [`KeyScan::TopLevel`] walks the container entry by entry and skips each
//!   value by its declared lengths, so keys of nested arrays and string
//!   values are never recorded.
//! - [`KeyScan::Flat`] records every `s:` string it meets, values and nested
//!   keys included. Callers that resolve the recorded keys against the
//!   decoded top-level array simply miss on the extras.

use std::borrow::Cow;

use memchr::{memchr, memrchr};

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, warn};

use crate::error::{ErrorKind, PhpDeserializeError, Result};
use crate::types::{ArrayKey, KeyOrder};

/// How the top-level container is scanned for keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyScan {
    /// Record only the keys of the top-level entries.
    #[default]
    TopLevel,
    /// Record every string token between the container delimiters.
    Flat,
}

/// Extract the top-level key order with the default [`KeyScan::TopLevel`] scan.
///
/// # Example
///
/// ```rust
/// use php_inspect_core::{extract_key_order, ArrayKey};
///
/// let data = br#"a:2:{s:3:"foo";s:3:"bar";s:3:"baz";i:42;}"#;
/// let order = extract_key_order(data).unwrap();
/// assert_eq!(order.as_slice(), [ArrayKey::from("foo"), ArrayKey::from("baz")]);
/// ```
pub fn extract_key_order(data: &[u8]) -> Result<KeyOrder<'_>> {
    extract_key_order_with(data, KeyScan::default())
}

/// Extract the top-level key order using the given scan mode.
#[cfg_attr(feature = "tracing", instrument(skip(data), fields(data_len = data.len())))]
pub fn extract_key_order_with(data: &[u8], scan: KeyScan) -> Result<KeyOrder<'_>> {
    let (open, close) = container_bounds(data)?;
    let mut scanner = KeyScanner {
        data,
        pos: open + 1,
        end: close,
    };

    let result = match scan {
        KeyScan::TopLevel => scanner.scan_entries(),
        KeyScan::Flat => scanner.scan_flat(),
    };

    #[cfg(feature = "tracing")]
    match &result {
        Ok(order) => debug!(keys = order.len(), "Extracted key order"),
        Err(e) => warn!(error = %e, "Key order extraction failed"),
    }

    result
}

/// Locate the first `{` and the last `}`.
fn container_bounds(data: &[u8]) -> Result<(usize, usize)> {
    match (memchr(b'{', data), memrchr(b'}', data)) {
        (Some(open), Some(close)) if close > open => Ok((open, close)),
        _ => Err(PhpDeserializeError::new(ErrorKind::MalformedContainer, 0)),
    }
}

/// Cursor over the bytes strictly between the container delimiters.
struct KeyScanner<'a> {
    data: &'a [u8],
    pos: usize,
    /// Index of the closing delimiter; never read.
    end: usize,
}

impl<'a> KeyScanner<'a> {
    fn scan_flat(&mut self) -> Result<KeyOrder<'a>> {
        let mut order = KeyOrder::new();
        while self.pos < self.end {
            if !self.at_marker(b's') {
                self.pos += 1;
                continue;
            }
            match self.read_string()? {
                Some(key) => order.push(ArrayKey::String(Cow::Borrowed(key))),
                // No length separator left, nothing further can be a key
                None => break,
            }
        }
        Ok(order)
    }

    fn scan_entries(&mut self) -> Result<KeyOrder<'a>> {
        let mut order = KeyOrder::new();
        while self.pos < self.end {
            let key = if self.at_marker(b's') {
                let key = self
                    .read_string()?
                    .ok_or_else(|| self.error(ErrorKind::MalformedKey, self.pos))?;
                self.expect_terminator(self.pos - 2)?;
                ArrayKey::String(Cow::Borrowed(key))
            } else if self.at_marker(b'i') {
                ArrayKey::Int(self.read_int_key()?)
            } else {
                return Err(self
                    .error(ErrorKind::MalformedKey, self.pos)
                    .with_context("expected a string or integer key"));
            };
            order.push(key);
            self.skip_value()?;
        }
        Ok(order)
    }

    #[inline]
    fn byte(&self, at: usize) -> Option<u8> {
        if at < self.end {
            Some(self.data[at])
        } else {
            None
        }
    }

    #[inline]
    fn at_marker(&self, marker: u8) -> bool {
        self.byte(self.pos) == Some(marker) && self.byte(self.pos + 1) == Some(b':')
    }

    /// Read `s:<n>:"<n bytes>` and move past the two terminator bytes.
    ///
    /// Returns `None` when no `:` follows the length digits before the end of
    /// the container.
    fn read_string(&mut self) -> Result<Option<&'a [u8]>> {
        let len_start = self.pos + 2;
        let Some(colon) = self.find(b':', len_start) else {
            return Ok(None);
        };

        let digits = &self.data[len_start..colon];
        let len: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                self.error(
                    ErrorKind::InvalidLength(String::from_utf8_lossy(digits).into_owned()),
                    len_start,
                )
            })?;

        if self.byte(colon + 1) != Some(b'"') {
            return Err(self.error(ErrorKind::MalformedKey, colon + 1));
        }

        let payload_start = colon + 2;
        let available = self.end.saturating_sub(payload_start);
        if len > available {
            return Err(self.error(
                ErrorKind::TruncatedKey {
                    expected: len,
                    found: available,
                },
                payload_start,
            ));
        }

        let payload_end = payload_start + len;
        self.pos = payload_end + 2;
        Ok(Some(&self.data[payload_start..payload_end]))
    }

    /// Read `i:<n>;` as an integer key.
    fn read_int_key(&mut self) -> Result<i64> {
        let start = self.pos + 2;
        let semi = self
            .find(b';', start)
            .ok_or_else(|| self.error(ErrorKind::MalformedKey, start))?;
        let value = std::str::from_utf8(&self.data[start..semi])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                self.error(ErrorKind::MalformedKey, start)
                    .with_context("invalid integer key")
            })?;
        self.pos = semi + 1;
        Ok(value)
    }

    /// Check that a string payload ending at `at` is closed by `";`.
    fn expect_terminator(&self, at: usize) -> Result<()> {
        if self.byte(at) == Some(b'"') && self.byte(at + 1) == Some(b';') {
            Ok(())
        } else {
            Err(self
                .error(ErrorKind::MalformedKey, at)
                .with_context("string does not end where its length says"))
        }
    }

    /// Skip one complete value, nested arrays included.
    fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            let Some(marker) = self.byte(self.pos) else {
                return Err(self
                    .error(ErrorKind::MalformedContainer, self.pos)
                    .with_context("value runs past the end of the container"));
            };

            match marker {
                b's' if self.at_marker(b's') => {
                    if self.read_string()?.is_none() {
                        return Err(self
                            .error(ErrorKind::MalformedContainer, self.pos)
                            .with_context("unterminated string value"));
                    }
                    self.expect_terminator(self.pos - 2)?;
                }
                b'a' if self.at_marker(b'a') => {
                    let open = self.find(b'{', self.pos).ok_or_else(|| {
                        self.error(ErrorKind::MalformedContainer, self.pos)
                            .with_context("array value without '{'")
                    })?;
                    self.pos = open + 1;
                    depth += 1;
                }
                b'}' if depth > 0 => {
                    self.pos += 1;
                    depth -= 1;
                }
                b'N' | b'b' | b'i' | b'd' => {
                    let semi = self.find(b';', self.pos).ok_or_else(|| {
                        self.error(ErrorKind::MalformedContainer, self.pos)
                            .with_context("unterminated scalar value")
                    })?;
                    self.pos = semi + 1;
                }
                _ => {
                    return Err(self
                        .error(ErrorKind::MalformedContainer, self.pos)
                        .with_context("unexpected byte in value"))
                }
            }

            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Position of the next `needle` at or after `from`, before the end.
    fn find(&self, needle: u8, from: usize) -> Option<usize> {
        if from >= self.end {
            return None;
        }
        memchr(needle, &self.data[from..self.end]).map(|offset| from + offset)
    }

    #[cold]
    fn error(&self, kind: ErrorKind, at: usize) -> PhpDeserializeError {
        PhpDeserializeError::new(kind, at).with_input_preview(self.data, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(order: &KeyOrder<'_>) -> Vec<String> {
        order.iter().map(ToString::to_string).collect()
    }

    fn flat(data: &[u8]) -> Result<KeyOrder<'_>> {
        extract_key_order_with(data, KeyScan::Flat)
    }

    #[test]
    fn test_top_level_skips_values() {
        let data = br#"a:2:{s:3:"foo";s:3:"bar";s:3:"baz";i:42;}"#;
        assert_eq!(keys(&extract_key_order(data).unwrap()), ["foo", "baz"]);
    }

    #[test]
    fn test_flat_records_every_string() {
        let data = br#"a:2:{s:3:"foo";s:3:"bar";s:3:"baz";i:42;}"#;
        assert_eq!(keys(&flat(data).unwrap()), ["foo", "bar", "baz"]);
    }

    #[test]
    fn test_nested_keys() {
        let data = br#"a:2:{s:4:"user";a:2:{s:4:"name";s:5:"Alice";i:0;b:1;}s:2:"id";i:7;}"#;
        assert_eq!(keys(&extract_key_order(data).unwrap()), ["user", "id"]);
        assert_eq!(keys(&flat(data).unwrap()), ["user", "name", "Alice", "id"]);
    }

    #[test]
    fn test_deeply_nested_value() {
        let data = br#"a:2:{s:1:"a";a:1:{i:0;a:1:{i:0;a:0:{}}}s:1:"b";N;}"#;
        assert_eq!(keys(&extract_key_order(data).unwrap()), ["a", "b"]);
    }

    #[test]
    fn test_braces_inside_strings() {
        let data = br#"a:2:{s:3:"}{}";s:3:"{{{";s:1:"z";d:0.5;}"#;
        assert_eq!(keys(&extract_key_order(data).unwrap()), ["}{}", "z"]);
    }

    #[test]
    fn test_integer_keys() {
        let data = br#"a:3:{i:0;s:1:"x";s:1:"k";N;i:-4;b:0;}"#;
        let order = extract_key_order(data).unwrap();
        assert_eq!(
            order.as_slice(),
            [ArrayKey::Int(0), ArrayKey::from("k"), ArrayKey::Int(-4)]
        );
        assert_eq!(keys(&flat(data).unwrap()), ["x", "k"]);
    }

    #[test]
    fn test_empty_container() {
        assert!(extract_key_order(b"a:0:{}").unwrap().is_empty());
        assert!(flat(b"a:0:{}").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_container() {
        let inputs: [&[u8]; 5] = [b"", b"s:5:\"ab\"", b"i:1;", b"}{", b"a:1:{"];
        for data in inputs {
            for scan in [KeyScan::TopLevel, KeyScan::Flat] {
                let err = extract_key_order_with(data, scan).unwrap_err();
                assert_eq!(err.kind, ErrorKind::MalformedContainer, "{:?}", data);
            }
        }
    }

    #[test]
    fn test_invalid_length() {
        let data = br#"a:1:{s:x:"k";i:1;}"#;
        for scan in [KeyScan::TopLevel, KeyScan::Flat] {
            let err = extract_key_order_with(data, scan).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidLength("x".into()));
            assert_eq!(err.position, 7);
        }
    }

    #[test]
    fn test_malformed_key() {
        let data = br#"a:1:{s:1:k";i:1;}"#;
        for scan in [KeyScan::TopLevel, KeyScan::Flat] {
            let err = extract_key_order_with(data, scan).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MalformedKey);
        }
    }

    #[test]
    fn test_truncated_key() {
        let data = br#"a:1:{s:9:"k";}"#;
        for scan in [KeyScan::TopLevel, KeyScan::Flat] {
            let err = extract_key_order_with(data, scan).unwrap_err();
            assert_eq!(
                err.kind,
                ErrorKind::TruncatedKey {
                    expected: 9,
                    found: 3
                }
            );
        }
    }

    #[test]
    fn test_flat_stops_without_separator() {
        let data = br#"a:1:{s:1:"a";s:12}"#;
        assert_eq!(keys(&flat(data).unwrap()), ["a"]);
    }

    #[test]
    fn test_top_level_rejects_misaligned_string() {
        let data = br#"a:1:{s:2:"abc";i:1;}"#;
        let err = extract_key_order(data).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedKey);
        assert_eq!(keys(&flat(data).unwrap()), ["ab"]);
    }

    #[test]
    fn test_top_level_unterminated_nested_value() {
        let data = br#"a:1:{s:1:"a";a:1:{i:0;N;}"#;
        let err = extract_key_order(data).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedContainer);
    }

    #[test]
    fn test_top_level_unskippable_values() {
        let inputs: [(&[u8], &str); 3] = [
            (br#"a:1:{s:1:"k";x;}"#, "unexpected byte in value"),
            (br#"a:1:{s:1:"k";i:1}"#, "unterminated scalar value"),
            (br#"a:1:{s:1:"k";a:1}"#, "array value without '{'"),
        ];
        for (data, context) in inputs {
            let err = extract_key_order(data).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MalformedContainer, "{:?}", data);
            assert_eq!(err.context.as_deref(), Some(context));
        }
    }

    #[test]
    fn test_top_level_malformed_string_value() {
        let err = extract_key_order(br#"a:1:{s:1:"k";s:9:"v";}"#).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::TruncatedKey {
                expected: 9,
                found: 3
            }
        );
    }

    #[test]
    fn test_keys_borrow_input() {
        let data = br#"a:1:{s:3:"key";N;}"#;
        let order = extract_key_order(data).unwrap();
        match &order.as_slice()[0] {
            ArrayKey::String(Cow::Borrowed(k)) => assert_eq!(k.as_ptr(), data[10..].as_ptr()),
            other => panic!("Expected borrowed key, got {:?}", other),
        }
    }
}
