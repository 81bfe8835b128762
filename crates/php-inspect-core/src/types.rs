//! PHP value types.

use std::borrow::Cow;
use std::fmt;

use bstr::BStr;

/// A decoded PHP value.
///
/// Strings borrow from the input buffer when possible. An array owns its
/// entries, so a decoded value is a plain tree with no sharing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PhpValue<'a> {
    /// PHP null value.
    #[default]
    Null,

    /// PHP boolean value.
    Bool(bool),

    /// PHP integer value.
    Int(i64),

    /// PHP float/double value.
    Float(f64),

    /// PHP string value (may contain non-UTF8 bytes).
    ///
    /// The payload length always equals the length declared in the input.
    String(Cow<'a, [u8]>),

    /// PHP array value: key/value pairs in the order they were declared.
    ///
    /// Lists are not special-cased; they are arrays with consecutive integer
    /// keys.
    Array(Vec<(ArrayKey<'a>, PhpValue<'a>)>),
}

/// A PHP array key. PHP only permits integers and strings here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey<'a> {
    /// Integer key.
    Int(i64),
    /// String key (may contain non-UTF8 bytes).
    String(Cow<'a, [u8]>),
}

impl<'a> ArrayKey<'a> {
    /// Get the key as a byte slice if it is a string key.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ArrayKey::String(s) => Some(s.as_ref()),
            ArrayKey::Int(_) => None,
        }
    }

    /// The key in the other representation PHP would treat as equal, if any.
    ///
    /// `Int(5)` pairs with `String("5")` and the reverse; strings that are not
    /// canonical decimal integers (`"05"`, `"+5"`, `"a"`) have no counterpart.
    pub fn display_form(&self) -> Option<ArrayKey<'static>> {
        match self {
            ArrayKey::Int(i) => Some(ArrayKey::String(Cow::Owned(i.to_string().into_bytes()))),
            ArrayKey::String(s) => {
                let text = std::str::from_utf8(s).ok()?;
                let parsed: i64 = text.parse().ok()?;
                (parsed.to_string() == text).then_some(ArrayKey::Int(parsed))
            }
        }
    }

    /// Convert to an owned key that doesn't borrow from the input.
    pub fn into_owned(self) -> ArrayKey<'static> {
        match self {
            ArrayKey::Int(i) => ArrayKey::Int(i),
            ArrayKey::String(s) => ArrayKey::String(Cow::Owned(s.into_owned())),
        }
    }
}

impl fmt::Display for ArrayKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::String(s) => write!(f, "{}", BStr::new(s.as_ref())),
        }
    }
}

impl<'a> From<&'a str> for ArrayKey<'a> {
    fn from(s: &'a str) -> Self {
        ArrayKey::String(Cow::Borrowed(s.as_bytes()))
    }
}

impl From<i64> for ArrayKey<'_> {
    fn from(i: i64) -> Self {
        ArrayKey::Int(i)
    }
}

/// Declared keys of the top-level array, in declaration order.
///
/// Produced by [`crate::order::extract_key_order`]. Empty when the input has
/// no top-level array or when extraction failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyOrder<'a> {
    keys: Vec<ArrayKey<'a>>,
}

impl<'a> KeyOrder<'a> {
    /// An empty key order.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: ArrayKey<'a>) {
        self.keys.push(key);
    }

    /// Number of recorded keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys were recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over the keys in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ArrayKey<'a>> {
        self.keys.iter()
    }

    /// The keys as a slice.
    pub fn as_slice(&self) -> &[ArrayKey<'a>] {
        &self.keys
    }

    /// Convert to an owned key order that doesn't borrow from the input.
    pub fn into_owned(self) -> KeyOrder<'static> {
        KeyOrder {
            keys: self.keys.into_iter().map(ArrayKey::into_owned).collect(),
        }
    }
}

impl<'a> FromIterator<ArrayKey<'a>> for KeyOrder<'a> {
    fn from_iter<T: IntoIterator<Item = ArrayKey<'a>>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<'o, 'a> IntoIterator for &'o KeyOrder<'a> {
    type Item = &'o ArrayKey<'a>;
    type IntoIter = std::slice::Iter<'o, ArrayKey<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl<'a> PhpValue<'a> {
    /// Check if the value is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, PhpValue::Null)
    }

    /// Check if the value is a string.
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, PhpValue::String(_))
    }

    /// Check if the value is an array.
    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, PhpValue::Array(_))
    }

    /// Get the value as a boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PhpValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an integer.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PhpValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float.
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PhpValue::Float(f) => Some(*f),
            PhpValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the value as a byte slice.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PhpValue::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Get the value as a UTF-8 string.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PhpValue::String(s) => std::str::from_utf8(s.as_ref()).ok(),
            _ => None,
        }
    }

    /// Get the value as an array.
    #[inline]
    pub fn as_array(&self) -> Option<&[(ArrayKey<'a>, PhpValue<'a>)]> {
        match self {
            PhpValue::Array(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    /// Look up an array entry by exact key.
    ///
    /// When a key is declared more than once the last entry wins, as in PHP.
    pub fn get(&self, key: &ArrayKey<'_>) -> Option<&PhpValue<'a>> {
        self.as_array()?
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Look up an array entry by exact key, then by the key's display form.
    ///
    /// This resolves `"5"` against an integer key `5` and the reverse.
    pub fn lookup(&self, key: &ArrayKey<'_>) -> Option<&PhpValue<'a>> {
        self.get(key)
            .or_else(|| key.display_form().and_then(|alt| self.get(&alt)))
    }

    /// Convert to an owned value that doesn't borrow from the input.
    pub fn into_owned(self) -> PhpValue<'static> {
        match self {
            PhpValue::Null => PhpValue::Null,
            PhpValue::Bool(b) => PhpValue::Bool(b),
            PhpValue::Int(i) => PhpValue::Int(i),
            PhpValue::Float(f) => PhpValue::Float(f),
            PhpValue::String(s) => PhpValue::String(Cow::Owned(s.into_owned())),
            PhpValue::Array(arr) => PhpValue::Array(
                arr.into_iter()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect(),
            ),
        }
    }

    /// Get a type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PhpValue::Null => "null",
            PhpValue::Bool(_) => "boolean",
            PhpValue::Int(_) => "integer",
            PhpValue::Float(_) => "float",
            PhpValue::String(_) => "string",
            PhpValue::Array(_) => "array",
        }
    }
}

impl fmt::Display for PhpValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhpValue::Null => write!(f, "null"),
            PhpValue::Bool(b) => write!(f, "{}", b),
            PhpValue::Int(i) => write!(f, "{}", i),
            PhpValue::Float(fl) => write!(f, "{}", fl),
            PhpValue::String(s) => write!(f, "{}", BStr::new(s.as_ref())),
            PhpValue::Array(arr) => {
                write!(f, "[")?;
                for (i, (k, v)) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} => {}", k, v)?;
                }
                write!(f, "]")
            }
        }
    }
}
