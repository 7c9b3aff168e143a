//! Conversions between host types and [`FieldValue`].
//!
//! [`ToValue`] picks the kind for a host type at compile time; [`FromValue`]
//! reads it back. Reading is lenient by default: [`FromValue::from_value`]
//! returns [`FromValue::zero`] whenever the stored kind does not match, and
//! only [`FromValue::try_from_value`] reports the mismatch.
//!
//! | Host type                                   | Kind         |
//! |---------------------------------------------|--------------|
//! | `bool`                                      | `Boolean`    |
//! | `i32`                                       | `Int32`      |
//! | `i64`                                       | `Int64`      |
//! | `f64`, `f32`                                | `Double`     |
//! | `String`, `&str`                            | `String`     |
//! | `ObjectId`                                  | `ObjectId`   |
//! | `bson::DateTime`, `DateTime<Utc>`, `SystemTime` | `Date`   |
//! | `bson::Timestamp`                           | `Timestamp`  |
//! | `bson::Decimal128`                          | `Decimal128` |
//! | `bson::Regex`                               | `Regex`      |
//! | `Vec<u8>`                                   | `Binary`     |
//! | `Vec<T>`                                    | `Array`      |
//! | `HashMap<String, T>`, `IndexMap<String, T>` | `Object`     |
//! | `Option<T>`                                 | `T` or `Null`|
//!
//! Documents and field enums get their impls from `#[derive(Document)]` and
//! `#[derive(FieldEnum)]`.

use std::collections::HashMap;
use std::time::SystemTime;

use bson::oid::ObjectId;
use bson::{Decimal128, Timestamp};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::trace;

use crate::value::FieldValue;

/// Convert a host value into a [`FieldValue`].
pub trait ToValue {
    /// Produce the stored representation of `self`.
    fn to_value(&self) -> FieldValue;
}

/// Read a host value back out of a [`FieldValue`].
pub trait FromValue: Sized {
    /// Strict extraction: `None` if the kind does not match.
    fn try_from_value(value: &FieldValue) -> Option<Self>;

    /// The value produced when extraction fails.
    fn zero() -> Self;

    /// Lenient extraction: the zero value if the kind does not match.
    fn from_value(value: &FieldValue) -> Self {
        match Self::try_from_value(value) {
            Some(v) => v,
            None => {
                trace!(
                    found = %value.field_type(),
                    expected = std::any::type_name::<Self>(),
                    "type mismatch on read, using zero value"
                );
                Self::zero()
            }
        }
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> FieldValue {
        (**self).to_value()
    }
}

impl ToValue for FieldValue {
    fn to_value(&self) -> FieldValue {
        self.clone()
    }
}

impl FromValue for FieldValue {
    fn try_from_value(value: &FieldValue) -> Option<Self> {
        Some(value.clone())
    }

    fn zero() -> Self {
        FieldValue::Null
    }
}

/// Scalars whose kind maps one-to-one onto a variant holding the same type.
macro_rules! scalar_binding {
    ($($ty:ty => $variant:ident, $zero:expr;)+) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> FieldValue {
                FieldValue::$variant(self.clone())
            }
        }

        impl FromValue for $ty {
            fn try_from_value(value: &FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            fn zero() -> Self {
                $zero
            }
        }
    )+};
}

scalar_binding! {
    bool => Boolean, false;
    i32 => Int32, 0;
    i64 => Int64, 0;
    f64 => Double, 0.0;
    String => String, String::new();
    ObjectId => ObjectId, ObjectId::from_bytes([0; 12]);
    bson::DateTime => Date, bson::DateTime::from_millis(0);
    Timestamp => Timestamp, Timestamp { time: 0, increment: 0 };
    Decimal128 => Decimal128, Decimal128::from_bytes([0; 16]);
}

impl ToValue for str {
    fn to_value(&self) -> FieldValue {
        FieldValue::String(self.to_owned())
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> FieldValue {
        FieldValue::Double(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn try_from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Double(d) => Some(*d as f32),
            _ => None,
        }
    }

    fn zero() -> Self {
        0.0
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> FieldValue {
        FieldValue::Date(bson::DateTime::from_chrono(*self))
    }
}

impl FromValue for DateTime<Utc> {
    fn try_from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Date(d) => Some(d.to_chrono()),
            _ => None,
        }
    }

    fn zero() -> Self {
        DateTime::<Utc>::default()
    }
}

impl ToValue for SystemTime {
    fn to_value(&self) -> FieldValue {
        FieldValue::Date(bson::DateTime::from_system_time(*self))
    }
}

impl FromValue for SystemTime {
    fn try_from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Date(d) => Some(d.to_system_time()),
            _ => None,
        }
    }

    fn zero() -> Self {
        SystemTime::UNIX_EPOCH
    }
}

impl ToValue for bson::Regex {
    fn to_value(&self) -> FieldValue {
        FieldValue::Regex {
            pattern: self.pattern.clone(),
            options: self.options.clone(),
        }
    }
}

impl FromValue for bson::Regex {
    fn try_from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Regex { pattern, options } => Some(bson::Regex {
                pattern: pattern.clone(),
                options: options.clone(),
            }),
            _ => None,
        }
    }

    fn zero() -> Self {
        bson::Regex {
            pattern: String::new(),
            options: String::new(),
        }
    }
}

// `u8` has no binding of its own, so this does not overlap with `Vec<T>`.
impl ToValue for Vec<u8> {
    fn to_value(&self) -> FieldValue {
        FieldValue::Binary(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn try_from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Binary(bytes) => Some(bytes.clone()),
            _ => None,
        }
    }

    fn zero() -> Self {
        Vec::new()
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> FieldValue {
        FieldValue::Array(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn try_from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Array(items) => items.iter().map(T::try_from_value).collect(),
            _ => None,
        }
    }

    fn zero() -> Self {
        Vec::new()
    }

    /// Elements are read leniently one by one, so the output always has the
    /// same length as a stored array.
    fn from_value(value: &FieldValue) -> Self {
        match value {
            FieldValue::Array(items) => items.iter().map(T::from_value).collect(),
            other => {
                trace!(found = %other.field_type(), "expected array, using empty sequence");
                Vec::new()
            }
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> FieldValue {
        match self {
            Some(v) => v.to_value(),
            None => FieldValue::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn try_from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Null => Some(None),
            other => T::try_from_value(other).map(Some),
        }
    }

    fn zero() -> Self {
        None
    }
}

impl<T: ToValue> ToValue for HashMap<String, T> {
    fn to_value(&self) -> FieldValue {
        FieldValue::Object(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn try_from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Object(fields) => fields
                .iter()
                .map(|(k, v)| T::try_from_value(v).map(|v| (k.clone(), v)))
                .collect(),
            _ => None,
        }
    }

    fn zero() -> Self {
        HashMap::new()
    }
}

impl<T: ToValue> ToValue for IndexMap<String, T> {
    fn to_value(&self) -> FieldValue {
        FieldValue::Object(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn try_from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Object(fields) => fields
                .iter()
                .map(|(k, v)| T::try_from_value(v).map(|v| (k.clone(), v)))
                .collect(),
            _ => None,
        }
    }

    fn zero() -> Self {
        IndexMap::new()
    }
}

/// Implement [`ToValue`] and [`FromValue`] for hand-written
/// [`Document`](crate::Document) types so they can nest inside other
/// documents and arrays.
///
/// `#[derive(Document)]` emits the same impls.
///
/// ```rust,ignore
/// impl Document for Address { /* ... */ }
/// quickdb_core::impl_field_value!(Address);
/// ```
#[macro_export]
macro_rules! impl_field_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::ToValue for $ty {
            fn to_value(&self) -> $crate::FieldValue {
                $crate::FieldValue::Object($crate::Document::to_fields(self))
            }
        }

        impl $crate::FromValue for $ty {
            fn try_from_value(value: &$crate::FieldValue) -> ::std::option::Option<Self> {
                $crate::document::document_from_value(value)
            }

            fn zero() -> Self {
                <$ty as ::std::default::Default>::default()
            }
        }
    )+};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_round_trip() {
        assert_eq!(FieldValue::of(&true).extract::<bool>(), true);
        assert_eq!(FieldValue::of(&42i32).extract::<i32>(), 42);
        assert_eq!(FieldValue::of(&(1i64 << 40)).extract::<i64>(), 1i64 << 40);
        assert_eq!(FieldValue::of(&2.5f64).extract::<f64>(), 2.5);
        assert_eq!(FieldValue::of("hi").extract::<String>(), "hi");
        assert_eq!(FieldValue::of(&1.5f32).extract::<f32>(), 1.5);

        let oid = ObjectId::new();
        assert_eq!(FieldValue::of(&oid).extract::<ObjectId>(), oid);
    }

    #[test]
    fn test_kind_selection() {
        assert_eq!(FieldValue::of(&1i32).field_type(), FieldType::Int32);
        assert_eq!(FieldValue::of(&1i64).field_type(), FieldType::Int64);
        assert_eq!(FieldValue::of(&1.0f32).field_type(), FieldType::Double);
        assert_eq!(FieldValue::of(&vec![1u8, 2]).field_type(), FieldType::Binary);
        assert_eq!(FieldValue::of(&vec![1i32, 2]).field_type(), FieldType::Array);
        assert_eq!(FieldValue::of(&Utc::now()).field_type(), FieldType::Date);
        assert_eq!(FieldValue::of(&None::<i32>).field_type(), FieldType::Null);
    }

    #[test]
    fn test_type_mismatch_defaults() {
        let v = FieldValue::of("x");
        assert_eq!(v.extract::<i32>(), 0);
        assert_eq!(v.extract::<i64>(), 0);
        assert_eq!(v.extract::<bool>(), false);
        assert_eq!(v.extract::<Vec<String>>(), Vec::<String>::new());
        assert_eq!(v.extract::<SystemTime>(), SystemTime::UNIX_EPOCH);
        assert_eq!(v.try_extract::<i32>(), None);
    }

    #[test]
    fn test_int_widths_are_distinct() {
        assert_eq!(FieldValue::Int64(7).extract::<i32>(), 0);
        assert_eq!(FieldValue::Int32(7).extract::<i64>(), 0);
        assert_eq!(FieldValue::Int32(7).extract::<f64>(), 0.0);
    }

    #[test]
    fn test_array_round_trip() {
        let empty: Vec<i32> = Vec::new();
        assert_eq!(FieldValue::of(&empty).extract::<Vec<i32>>(), empty);

        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(FieldValue::of(&names).extract::<Vec<String>>(), names);

        let nested = vec![vec![1i64, 2], vec![], vec![3]];
        assert_eq!(FieldValue::of(&nested).extract::<Vec<Vec<i64>>>(), nested);
    }

    #[test]
    fn test_array_lenient_elements() {
        let mixed = FieldValue::array([FieldValue::Int32(1), FieldValue::String("x".into())]);
        assert_eq!(mixed.extract::<Vec<i32>>(), vec![1, 0]);
        assert_eq!(mixed.try_extract::<Vec<i32>>(), None);
    }

    #[test]
    fn test_binary_round_trip() {
        let bytes = vec![0u8, 255, 7];
        assert_eq!(FieldValue::of(&bytes), FieldValue::Binary(bytes.clone()));
        assert_eq!(FieldValue::of(&bytes).extract::<Vec<u8>>(), bytes);
    }

    #[test]
    fn test_dates_truncate_to_millis() {
        let now = Utc::now();
        let back: DateTime<Utc> = FieldValue::of(&now).extract();
        assert_eq!(back.timestamp_millis(), now.timestamp_millis());

        let st = SystemTime::UNIX_EPOCH + std::time::Duration::from_millis(1_234);
        assert_eq!(FieldValue::of(&st).extract::<SystemTime>(), st);
    }

    #[test]
    fn test_option_binding() {
        assert_eq!(FieldValue::of(&Some(3i32)), FieldValue::Int32(3));
        assert_eq!(FieldValue::Null.extract::<Option<i32>>(), None);
        assert_eq!(FieldValue::Int32(3).extract::<Option<i32>>(), Some(3));
        assert_eq!(FieldValue::Boolean(true).extract::<Option<i32>>(), None);
    }

    #[test]
    fn test_map_binding() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), FieldValue::Int32(1));
        let v = FieldValue::of(&map);
        assert_eq!(v.field_type(), FieldType::Object);
        assert_eq!(v.extract::<HashMap<String, FieldValue>>(), map);

        let counts: IndexMap<String, i64> = [("x".to_string(), 1), ("y".to_string(), 2)]
            .into_iter()
            .collect();
        assert_eq!(FieldValue::of(&counts).extract::<IndexMap<String, i64>>(), counts);
    }

    #[test]
    fn test_identity_binding() {
        let v = FieldValue::object([("k", FieldValue::MinKey)]);
        assert_eq!(FieldValue::of(&v), v);
        assert_eq!(v.extract::<FieldValue>(), v);
    }

    #[test]
    fn test_regex_binding() {
        let re = bson::Regex {
            pattern: "^a".into(),
            options: "i".into(),
        };
        let v = FieldValue::of(&re);
        assert_eq!(
            v,
            FieldValue::Regex {
                pattern: "^a".into(),
                options: "i".into()
            }
        );
        assert_eq!(v.extract::<bson::Regex>(), re);
    }
}
