//! Order-preserving inspector for PHP serialized data.
//!
//! This crate decodes the output of PHP's `serialize()` into a value tree and
//! renders it as an indented text report that lists the top-level keys in
//! the order they were declared in the byte stream.
//!
//! # Components
//!
//! - [`order`] - recovers the declaration order of the top-level keys with a
//!   single byte-level scan, without decoding values
//! - [`parser`] - zero-copy recursive-descent decoder with strict length and
//!   count checks and a bounded nesting depth
//! - [`printer`] - renders a decoded value using a recovered key order
//! - [`inspect`](mod@inspect) - runs all of the above over one buffer, optionally with
//!   the key scan on a second thread
//!
//! # Quick Start
//!
//! ```rust
//! use php_inspect_core::{inspect, InspectConfig};
//!
//! let data = br#"a:2:{s:4:"name";s:5:"Alice";s:3:"age";i:30;}"#;
//! let inspection = inspect(data, &InspectConfig::default());
//!
//! assert_eq!(inspection.render_or_raw(data), "name: Alice\nage: 30\n");
//! ```
//!
//! # Supported Types
//!
//! | PHP Type | Rust Type |
//! |----------|-----------|
//! | `null` | `PhpValue::Null` |
//! | `bool` | `PhpValue::Bool(bool)` |
//! | `int` | `PhpValue::Int(i64)` |
//! | `float` | `PhpValue::Float(f64)` |
//! | `string` | `PhpValue::String(Cow<[u8]>)` |
//! | `array` | `PhpValue::Array(Vec<(ArrayKey, PhpValue)>)` |
//!
//! Objects, enums and references are rejected with
//! [`ErrorKind::UnknownMarker`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::inline_always)]

pub mod error;
pub mod inspect;
pub mod order;
pub mod parser;
pub mod printer;
pub mod types;

#[cfg(feature = "serde")]
pub mod json;

pub use error::{ErrorKind, PhpDeserializeError, Result};
pub use inspect::{inspect, inspect_parallel, InspectConfig, Inspection};
pub use order::{extract_key_order, extract_key_order_with, KeyScan};
pub use parser::{from_bytes, from_bytes_with_config, Parser, ParserConfig, MAX_DEPTH};
pub use printer::{render, render_with_options, OrderedReport, PrintOptions};
pub use types::{ArrayKey, KeyOrder, PhpValue};

#[cfg(feature = "serde")]
pub use json::{to_json, to_json_ordered, JsonReport};
