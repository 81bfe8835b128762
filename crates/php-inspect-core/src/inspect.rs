//! One-call inspection of a serialized buffer.
//!
//! Runs the key-order scan and the decoder over the same buffer and applies
//! the error policy between them. A failed key-order scan only costs the
//! ordering: the top level is then printed in pair order. A failed decode
//! leaves nothing to print, and callers fall back to the raw bytes.

#[cfg(feature = "tracing")]
use tracing::{debug, instrument, warn};

use crate::error::{PhpDeserializeError, Result};
use crate::order::{extract_key_order_with, KeyScan};
use crate::parser::{from_bytes_with_config, ParserConfig};
use crate::printer::{render_with_options, PrintOptions};
use crate::types::{KeyOrder, PhpValue};

/// Configuration for [`inspect`] and [`inspect_parallel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectConfig {
    /// Decoder options.
    pub parser: ParserConfig,
    /// Key-order scan mode.
    pub key_scan: KeyScan,
}

/// The outcome of inspecting one buffer.
#[derive(Debug, Clone)]
pub struct Inspection<'a> {
    /// The decoded value, or why decoding failed.
    pub value: Result<PhpValue<'a>>,
    /// Top-level key order; empty when extraction failed.
    pub key_order: KeyOrder<'a>,
    /// Why key-order extraction failed, if it did.
    pub key_order_error: Option<PhpDeserializeError>,
}

impl<'a> Inspection<'a> {
    fn assemble(value: Result<PhpValue<'a>>, order: Result<KeyOrder<'a>>) -> Self {
        let (key_order, key_order_error) = match order {
            Ok(order) => (order, None),
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %e, "Continuing without key order");
                (KeyOrder::new(), Some(e))
            }
        };

        #[cfg(feature = "tracing")]
        debug!(
            decoded = value.is_ok(),
            keys = key_order.len(),
            "Inspection finished"
        );

        Self {
            value,
            key_order,
            key_order_error,
        }
    }

    /// The decode error, if decoding failed.
    pub fn decode_error(&self) -> Option<&PhpDeserializeError> {
        self.value.as_ref().err()
    }

    /// Render the report, or `None` if decoding failed.
    pub fn render(&self) -> Option<String> {
        self.render_with_options(PrintOptions::default())
    }

    /// Render the report with custom options, or `None` if decoding failed.
    pub fn render_with_options(&self, options: PrintOptions) -> Option<String> {
        let value = self.value.as_ref().ok()?;
        Some(render_with_options(value, &self.key_order, options))
    }

    /// Render the report, falling back to the input as lossy UTF-8 text when
    /// decoding failed.
    pub fn render_or_raw(&self, data: &[u8]) -> String {
        self.render()
            .unwrap_or_else(|| String::from_utf8_lossy(data).into_owned())
    }
}

/// Decode `data` and extract its top-level key order, one after the other.
///
/// # Example
///
/// ```rust
/// use php_inspect_core::{inspect, InspectConfig};
///
/// let data = br#"a:2:{s:3:"foo";s:3:"bar";s:3:"baz";i:42;}"#;
/// let inspection = inspect(data, &InspectConfig::default());
/// assert_eq!(inspection.render().unwrap(), "foo: bar\nbaz: 42\n");
/// ```
#[cfg_attr(feature = "tracing", instrument(skip(data), fields(data_len = data.len())))]
pub fn inspect<'a>(data: &'a [u8], config: &InspectConfig) -> Inspection<'a> {
    let order = extract_key_order_with(data, config.key_scan);
    let value = from_bytes_with_config(data, config.parser);
    Inspection::assemble(value, order)
}

/// Like [`inspect`], with the key-order scan on a second thread.
///
/// Both passes only read `data`; the decode stays on the calling thread.
#[cfg_attr(feature = "tracing", instrument(skip(data), fields(data_len = data.len())))]
pub fn inspect_parallel<'a>(data: &'a [u8], config: &InspectConfig) -> Inspection<'a> {
    let key_scan = config.key_scan;
    let (value, order) = std::thread::scope(|scope| {
        let order = scope.spawn(move || extract_key_order_with(data, key_scan));
        let value = from_bytes_with_config(data, config.parser);
        let order = order
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        (value, order)
    });
    Inspection::assemble(value, order)
}
