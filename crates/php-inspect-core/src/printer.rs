//! Indented text rendering of a decoded value.
//!
//! The top-level array is printed in the order given by a [`KeyOrder`];
//! nested arrays are printed in their own pair order.
//!
//! ```text
//! name: Alice
//! tags:
//!   0: admin
//!   1: active
//! ```

use std::fmt;

use crate::types::{ArrayKey, KeyOrder, PhpValue};

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    /// Spaces added per nesting level.
    pub indent: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

/// A value paired with its top-level key order, ready to be displayed.
///
/// Keys listed in the order but missing from the array are skipped. Each
/// key is matched exactly first, then through its display form, so `"5"`
/// still finds an entry decoded with the integer key `5`. An empty order
/// prints the top level in pair order.
#[derive(Debug, Clone, Copy)]
pub struct OrderedReport<'r, 'a> {
    value: &'r PhpValue<'a>,
    order: &'r KeyOrder<'a>,
    options: PrintOptions,
}

impl<'r, 'a> OrderedReport<'r, 'a> {
    /// Pair a value with its key order.
    pub fn new(value: &'r PhpValue<'a>, order: &'r KeyOrder<'a>) -> Self {
        Self {
            value,
            order,
            options: PrintOptions::default(),
        }
    }

    /// Use custom rendering options.
    pub fn with_options(mut self, options: PrintOptions) -> Self {
        self.options = options;
        self
    }

    fn write_entry(
        &self,
        f: &mut fmt::Formatter<'_>,
        key: &ArrayKey<'_>,
        value: &PhpValue<'_>,
        depth: usize,
    ) -> fmt::Result {
        let pad = depth * self.options.indent;
        match value {
            PhpValue::Array(items) => {
                writeln!(f, "{:pad$}{}:", "", key, pad = pad)?;
                self.write_entries(f, items, depth + 1)
            }
            scalar => writeln!(f, "{:pad$}{}: {}", "", key, scalar, pad = pad),
        }
    }

    fn write_entries(
        &self,
        f: &mut fmt::Formatter<'_>,
        items: &[(ArrayKey<'_>, PhpValue<'_>)],
        depth: usize,
    ) -> fmt::Result {
        for (key, value) in items {
            self.write_entry(f, key, value, depth)?;
        }
        Ok(())
    }
}

impl fmt::Display for OrderedReport<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            PhpValue::Array(items) if self.order.is_empty() => self.write_entries(f, items, 0),
            PhpValue::Array(_) => {
                for key in self.order {
                    if let Some(value) = self.value.lookup(key) {
                        self.write_entry(f, key, value, 0)?;
                    }
                }
                Ok(())
            }
            scalar => writeln!(f, "{}", scalar),
        }
    }
}

/// Render a value with default options.
///
/// # Example
///
/// ```rust
/// use php_inspect_core::{extract_key_order, from_bytes, render};
///
/// let data = br#"a:2:{s:3:"foo";s:3:"bar";s:3:"baz";i:42;}"#;
/// let value = from_bytes(data).unwrap();
/// let order = extract_key_order(data).unwrap_or_default();
/// assert_eq!(render(&value, &order), "foo: bar\nbaz: 42\n");
/// ```
pub fn render(value: &PhpValue<'_>, order: &KeyOrder<'_>) -> String {
    render_with_options(value, order, PrintOptions::default())
}

/// Render a value with custom options.
pub fn render_with_options<'a>(
    value: &PhpValue<'a>,
    order: &KeyOrder<'a>,
    options: PrintOptions,
) -> String {
    OrderedReport::new(value, order)
        .with_options(options)
        .to_string()
}
