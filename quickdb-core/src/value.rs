//! The typed value model.
//!
//! [`FieldValue`] is a closed, recursive tagged union able to hold any value
//! that can be stored in a document. The active variant *is* the value's kind,
//! so the kind and the payload can never disagree. [`FieldType`] names the
//! kind without its payload.
//!
//! ```rust
//! use quickdb_core::{FieldType, FieldValue};
//!
//! let tags = FieldValue::of(&vec!["a", "b"]);
//! assert_eq!(tags.field_type(), FieldType::Array);
//! assert_eq!(tags.extract::<Vec<String>>(), vec!["a".to_string(), "b".to_string()]);
//!
//! // Mismatched reads degrade to the zero value instead of failing.
//! assert_eq!(FieldValue::of("x").extract::<i32>(), 0);
//! ```

use std::fmt;

use bson::oid::ObjectId;
use bson::{Decimal128, Timestamp};
use indexmap::IndexMap;

use crate::binding::{FromValue, ToValue};

/// A mapping from field name to value.
///
/// Keys are unique. Insertion order is kept so encoded documents are
/// deterministic, but equality ignores it.
pub type Fields = IndexMap<String, FieldValue>;

/// The kind of a [`FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    /// Ordered sequence of values.
    Array,
    /// Raw bytes.
    Binary,
    /// Boolean.
    Boolean,
    /// JavaScript code.
    Code,
    /// Milliseconds since the Unix epoch.
    Date,
    /// 128-bit decimal.
    Decimal128,
    /// 64-bit float.
    Double,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Compares greater than every other value.
    MaxKey,
    /// Compares less than every other value.
    MinKey,
    /// Null marker.
    Null,
    /// Embedded document.
    Object,
    /// 12-byte unique identifier.
    ObjectId,
    /// Regular expression.
    Regex,
    /// UTF-8 string.
    String,
    /// Deprecated symbol type.
    Symbol,
    /// Seconds plus ordinal increment.
    Timestamp,
    /// Deprecated undefined type.
    Undefined,
}

impl FieldType {
    /// The server-side type alias, as accepted by the `$type` query operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Binary => "binData",
            Self::Boolean => "bool",
            Self::Code => "javascript",
            Self::Date => "date",
            Self::Decimal128 => "decimal",
            Self::Double => "double",
            Self::Int32 => "int",
            Self::Int64 => "long",
            Self::MaxKey => "maxKey",
            Self::MinKey => "minKey",
            Self::Null => "null",
            Self::Object => "object",
            Self::ObjectId => "objectId",
            Self::Regex => "regex",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Timestamp => "timestamp",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A storable value.
///
/// Child values of [`FieldValue::Array`] and [`FieldValue::Object`] are owned
/// by their parent; trees have no sharing and no cycles.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Ordered sequence of values.
    Array(Vec<FieldValue>),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// Boolean.
    Boolean(bool),
    /// JavaScript code.
    Code(String),
    /// A point in time with millisecond precision.
    Date(bson::DateTime),
    /// 128-bit decimal.
    Decimal128(Decimal128),
    /// 64-bit float.
    Double(f64),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// Compares greater than every other value.
    MaxKey,
    /// Compares less than every other value.
    MinKey,
    /// Null marker.
    #[default]
    Null,
    /// Embedded document.
    Object(Fields),
    /// 12-byte unique identifier.
    ObjectId(ObjectId),
    /// Regular expression with its option flags.
    Regex {
        /// The pattern.
        pattern: String,
        /// Option flags such as `i` or `m`.
        options: String,
    },
    /// UTF-8 string.
    String(String),
    /// Deprecated symbol type.
    Symbol(String),
    /// Seconds plus ordinal increment.
    Timestamp(Timestamp),
    /// Deprecated undefined type.
    Undefined,
}

impl FieldValue {
    /// Convert a host value into a `FieldValue`.
    pub fn of<T: ToValue + ?Sized>(value: &T) -> Self {
        value.to_value()
    }

    /// Build an object value from any iterator of `(key, value)` pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array value.
    pub fn array(items: impl IntoIterator<Item = FieldValue>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    /// The kind of this value.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Array(_) => FieldType::Array,
            Self::Binary(_) => FieldType::Binary,
            Self::Boolean(_) => FieldType::Boolean,
            Self::Code(_) => FieldType::Code,
            Self::Date(_) => FieldType::Date,
            Self::Decimal128(_) => FieldType::Decimal128,
            Self::Double(_) => FieldType::Double,
            Self::Int32(_) => FieldType::Int32,
            Self::Int64(_) => FieldType::Int64,
            Self::MaxKey => FieldType::MaxKey,
            Self::MinKey => FieldType::MinKey,
            Self::Null => FieldType::Null,
            Self::Object(_) => FieldType::Object,
            Self::ObjectId(_) => FieldType::ObjectId,
            Self::Regex { .. } => FieldType::Regex,
            Self::String(_) => FieldType::String,
            Self::Symbol(_) => FieldType::Symbol,
            Self::Timestamp(_) => FieldType::Timestamp,
            Self::Undefined => FieldType::Undefined,
        }
    }

    /// Extract a host value, returning the type's zero value on mismatch.
    ///
    /// This never fails. A value of the wrong kind (for instance a stored
    /// document with an unexpected shape) silently yields the zero value of
    /// `T`, so callers cannot tell "stored zero" from "wrong type". Use
    /// [`FieldValue::try_extract`] when that distinction matters.
    pub fn extract<T: FromValue>(&self) -> T {
        T::from_value(self)
    }

    /// Extract a host value, returning `None` on any kind mismatch.
    pub fn try_extract<T: FromValue>(&self) -> Option<T> {
        T::try_from_value(self)
    }

    /// Check if this is the null marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the fields of an object value.
    pub fn as_object(&self) -> Option<&Fields> {
        match self {
            Self::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Mutably borrow the fields of an object value.
    pub fn as_object_mut(&mut self) -> Option<&mut Fields> {
        match self {
            Self::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Borrow the elements of an array value.
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the contents of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render as relaxed Extended JSON.
    pub fn to_json(&self) -> serde_json::Value {
        crate::codec::to_json(self)
    }
}

/// `{}` renders on one line; `{:#}` renders indented over several lines.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = if f.alternate() { Some(0) } else { None };
        write_value(f, self, indent)
    }
}

fn write_indent(f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
    write!(f, "{:width$}", "", width = level * 2)
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &FieldValue, indent: Option<usize>) -> fmt::Result {
    match value {
        FieldValue::Object(fields) => {
            if fields.is_empty() {
                return f.write_str("{}");
            }
            f.write_str("{")?;
            for (i, (key, child)) in fields.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                match indent {
                    Some(level) => {
                        f.write_str("\n")?;
                        write_indent(f, level + 1)?;
                        write!(f, "{:?}: ", key)?;
                        write_value(f, child, Some(level + 1))?;
                    }
                    None => {
                        write!(f, " {:?}: ", key)?;
                        write_value(f, child, None)?;
                    }
                }
            }
            match indent {
                Some(level) => {
                    f.write_str("\n")?;
                    write_indent(f, level)?;
                    f.write_str("}")
                }
                None => f.write_str(" }"),
            }
        }
        FieldValue::Array(items) => {
            if items.is_empty() {
                return f.write_str("[]");
            }
            f.write_str("[")?;
            for (i, child) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                match indent {
                    Some(level) => {
                        f.write_str("\n")?;
                        write_indent(f, level + 1)?;
                        write_value(f, child, Some(level + 1))?;
                    }
                    None => {
                        if i > 0 {
                            f.write_str(" ")?;
                        }
                        write_value(f, child, None)?;
                    }
                }
            }
            if let Some(level) = indent {
                f.write_str("\n")?;
                write_indent(f, level)?;
            }
            f.write_str("]")
        }
        FieldValue::Binary(bytes) => write!(f, "Binary({} bytes)", bytes.len()),
        FieldValue::Boolean(b) => write!(f, "{}", b),
        FieldValue::Code(code) => write!(f, "Code({:?})", code),
        FieldValue::Date(date) => match date.try_to_rfc3339_string() {
            Ok(s) => write!(f, "Date({:?})", s),
            Err(_) => write!(f, "Date({})", date.timestamp_millis()),
        },
        FieldValue::Decimal128(d) => write!(f, "{:?}", d),
        FieldValue::Double(d) => write!(f, "{}", d),
        FieldValue::Int32(i) => write!(f, "{}", i),
        FieldValue::Int64(i) => write!(f, "{}", i),
        FieldValue::MaxKey => f.write_str("MaxKey"),
        FieldValue::MinKey => f.write_str("MinKey"),
        FieldValue::Null => f.write_str("null"),
        FieldValue::ObjectId(oid) => write!(f, "ObjectId({:?})", oid.to_hex()),
        FieldValue::Regex { pattern, options } => write!(f, "/{}/{}", pattern, options),
        FieldValue::String(s) => write!(f, "{:?}", s),
        FieldValue::Symbol(s) => write!(f, "Symbol({:?})", s),
        FieldValue::Timestamp(ts) => write!(f, "Timestamp({}, {})", ts.time, ts.increment),
        FieldValue::Undefined => f.write_str("undefined"),
    }
}
