//! Update document building.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::binding::ToValue;
use crate::codec;
use crate::filter::value_array;
use crate::value::{FieldValue, Fields};

/// Bitwise operation for the `$bit` update operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitOp {
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
}

impl BitOp {
    /// The sub-operator name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        }
    }
}

impl fmt::Display for BitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BitOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "xor" => Ok(Self::Xor),
            _ => Err(()),
        }
    }
}

/// Builder for update documents.
///
/// The top level maps operator names to `field -> value` objects. Calling an
/// operator again adds to its object instead of replacing it; the same field
/// under the same operator keeps the last value.
///
/// ```rust
/// use quickdb_core::{FieldValue, UpdateBuilder};
///
/// let update = UpdateBuilder::new().set("a", 1).set("b", 2).inc("visits", 1);
/// assert_eq!(update.fields().len(), 2);
/// assert_eq!(
///     update.fields()["$set"],
///     FieldValue::object([("a", FieldValue::Int32(1)), ("b", FieldValue::Int32(2))])
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBuilder {
    fields: Fields,
}

impl UpdateBuilder {
    /// Create a new empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// `$set` a field.
    pub fn set(self, field: &str, value: impl ToValue) -> Self {
        self.operator("$set", field, value.to_value())
    }

    /// `$set` a field only when the update inserts a new document.
    pub fn set_on_insert(self, field: &str, value: impl ToValue) -> Self {
        self.operator("$setOnInsert", field, value.to_value())
    }

    /// `$unset` (remove) a field.
    pub fn unset(self, field: &str) -> Self {
        self.operator("$unset", field, FieldValue::String(String::new()))
    }

    /// `$inc` a numeric field.
    pub fn inc(self, field: &str, amount: impl ToValue) -> Self {
        self.operator("$inc", field, amount.to_value())
    }

    /// `$mul` a numeric field.
    pub fn mul(self, field: &str, factor: impl ToValue) -> Self {
        self.operator("$mul", field, factor.to_value())
    }

    /// `$min`: only update if `value` is less than the stored value.
    pub fn min(self, field: &str, value: impl ToValue) -> Self {
        self.operator("$min", field, value.to_value())
    }

    /// `$max`: only update if `value` is greater than the stored value.
    pub fn max(self, field: &str, value: impl ToValue) -> Self {
        self.operator("$max", field, value.to_value())
    }

    /// `$rename` a field.
    pub fn rename(self, old_name: &str, new_name: &str) -> Self {
        self.operator("$rename", old_name, FieldValue::String(new_name.to_string()))
    }

    /// `$currentDate`: set a field to the server's current date, or to a
    /// timestamp when `as_timestamp` is true.
    pub fn current_date(self, field: &str, as_timestamp: bool) -> Self {
        let spec = if as_timestamp {
            FieldValue::object([("$type", FieldValue::String("timestamp".into()))])
        } else {
            FieldValue::Boolean(true)
        };
        self.operator("$currentDate", field, spec)
    }

    /// `$push` one value onto an array.
    pub fn push(self, field: &str, value: impl ToValue) -> Self {
        self.operator("$push", field, value.to_value())
    }

    /// `$push` several values with the `$each` modifier.
    pub fn push_each<V: ToValue>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.operator("$push", field, each(values))
    }

    /// `$pull` all instances of a value from an array.
    pub fn pull(self, field: &str, value: impl ToValue) -> Self {
        self.operator("$pull", field, value.to_value())
    }

    /// `$pull` with the `$each` modifier.
    pub fn pull_each<V: ToValue>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.operator("$pull", field, each(values))
    }

    /// `$pullAll`: remove every instance of each value.
    pub fn pull_all<V: ToValue>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.operator("$pullAll", field, value_array(values))
    }

    /// `$addToSet` a value unless already present.
    pub fn add_to_set(self, field: &str, value: impl ToValue) -> Self {
        self.operator("$addToSet", field, value.to_value())
    }

    /// `$addToSet` several values with the `$each` modifier.
    pub fn add_to_set_each<V: ToValue>(
        self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.operator("$addToSet", field, each(values))
    }

    /// `$pop` the first (`-1`) or last (`1`) array element.
    pub fn pop(self, field: &str, direction: i32) -> Self {
        self.operator("$pop", field, FieldValue::Int32(direction))
    }

    /// `$bit` with a named sub-operation (`"and"`, `"or"` or `"xor"`).
    ///
    /// Any other name leaves the update unchanged.
    pub fn bit(self, field: &str, operation: &str, value: i32) -> Self {
        match operation.parse::<BitOp>() {
            Ok(op) => self.bit_op(field, op, value),
            Err(()) => {
                warn!(field, operation, "ignoring $bit with unknown operation");
                self
            }
        }
    }

    /// `$bit` with a typed sub-operation.
    pub fn bit_op(self, field: &str, op: BitOp, value: i32) -> Self {
        self.operator(
            "$bit",
            field,
            FieldValue::object([(op.as_str(), FieldValue::Int32(value))]),
        )
    }

    /// Check if no operator has been added.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The accumulated operators.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Consume the builder, returning its operators.
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Encode the update as a BSON document.
    pub fn to_document(&self) -> bson::Document {
        codec::encode_fields(&self.fields)
    }

    fn operator(mut self, op: &str, field: &str, value: FieldValue) -> Self {
        match self.fields.get_mut(op) {
            Some(FieldValue::Object(targets)) => {
                targets.insert(field.to_string(), value);
            }
            _ => {
                self.fields
                    .insert(op.to_string(), FieldValue::object([(field, value)]));
            }
        }
        self
    }
}

fn each<V: ToValue>(values: impl IntoIterator<Item = V>) -> FieldValue {
    FieldValue::object([("$each", value_array(values))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_merges_fields() {
        let update = UpdateBuilder::new().set("a", 1).set("b", 2);
        assert_eq!(update.fields().len(), 1);
        assert_eq!(update.to_document(), doc! { "$set": { "a": 1, "b": 2 } });
    }

    #[test]
    fn test_same_field_last_write_wins() {
        let update = UpdateBuilder::new().inc("x", 1).inc("x", 2);
        assert_eq!(update.to_document(), doc! { "$inc": { "x": 2 } });
    }

    #[test]
    fn test_operators_are_independent() {
        let update = UpdateBuilder::new()
            .set("name", "n")
            .inc("count", 1_i64)
            .set("active", true)
            .unset("legacy");
        assert_eq!(
            update.to_document(),
            doc! {
                "$set": { "name": "n", "active": true },
                "$inc": { "count": 1_i64 },
                "$unset": { "legacy": "" },
            }
        );
    }

    #[test]
    fn test_each_modifiers() {
        let update = UpdateBuilder::new()
            .push_each("tags", ["a", "b"])
            .pull_each("scores", [1, 2])
            .add_to_set_each("ids", [7_i64]);
        assert_eq!(
            update.to_document(),
            doc! {
                "$push": { "tags": { "$each": ["a", "b"] } },
                "$pull": { "scores": { "$each": [1, 2] } },
                "$addToSet": { "ids": { "$each": [7_i64] } },
            }
        );
    }

    #[test]
    fn test_array_operators() {
        let update = UpdateBuilder::new()
            .push("tags", "x")
            .push("names", "y")
            .pull_all("old", [3, 4])
            .add_to_set("set", "z")
            .pop("queue", -1);
        assert_eq!(
            update.to_document(),
            doc! {
                "$push": { "tags": "x", "names": "y" },
                "$pullAll": { "old": [3, 4] },
                "$addToSet": { "set": "z" },
                "$pop": { "queue": -1 },
            }
        );
    }

    #[test]
    fn test_numeric_and_rename_operators() {
        let update = UpdateBuilder::new()
            .mul("price", 1.5)
            .min("low", 0)
            .max("high", 10)
            .rename("nmae", "name")
            .set_on_insert("created", true);
        assert_eq!(
            update.to_document(),
            doc! {
                "$mul": { "price": 1.5 },
                "$min": { "low": 0 },
                "$max": { "high": 10 },
                "$rename": { "nmae": "name" },
                "$setOnInsert": { "created": true },
            }
        );
    }

    #[test]
    fn test_current_date() {
        let update = UpdateBuilder::new()
            .current_date("updated", false)
            .current_date("stamp", true);
        assert_eq!(
            update.to_document(),
            doc! { "$currentDate": { "updated": true, "stamp": { "$type": "timestamp" } } }
        );
    }

    #[test]
    fn test_bit_valid_operations() {
        let update = UpdateBuilder::new()
            .bit("flags", "and", 5)
            .bit_op("mask", BitOp::Xor, 1);
        assert_eq!(
            update.to_document(),
            doc! { "$bit": { "flags": { "and": 5 }, "mask": { "xor": 1 } } }
        );
    }

    #[test]
    fn test_bit_invalid_operation_is_noop() {
        let update = UpdateBuilder::new().bit("flags", "nand", 5);
        assert!(update.is_empty());

        let before = UpdateBuilder::new().set("a", 1);
        assert_eq!(before.clone().bit("flags", "shl", 1), before);
    }

    #[test]
    fn test_bit_op_parse() {
        assert_eq!("or".parse::<BitOp>(), Ok(BitOp::Or));
        assert!("OR".parse::<BitOp>().is_err());
        assert_eq!(BitOp::And.to_string(), "and");
    }
}
