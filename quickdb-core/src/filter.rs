//! Query filter building.

use bson::oid::ObjectId;

use crate::binding::ToValue;
use crate::codec;
use crate::document::{ID_FIELD, parse_object_id};
use crate::error::QuickResult;
use crate::value::{FieldType, FieldValue, Fields};

/// Builder for query filters.
///
/// Operator methods on a field that already carries operators add to the same
/// operator object, so ranges can be chained:
///
/// ```rust
/// use quickdb_core::{FieldValue, FilterBuilder};
///
/// let filter = FilterBuilder::new()
///     .eq("status", "active")
///     .gte("age", 18)
///     .lt("age", 65);
///
/// assert_eq!(
///     filter.fields()["age"],
///     FieldValue::object([("$gte", FieldValue::Int32(18)), ("$lt", FieldValue::Int32(65))])
/// );
/// ```
///
/// An equality condition and operator conditions on the same field are
/// mutually exclusive; whichever is added last replaces the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterBuilder {
    fields: Fields,
}

impl FilterBuilder {
    /// Create a new empty filter (matches all documents).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter builder from an existing field map.
    pub fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    /// Filter matching a single document by the hex form of its identifier.
    pub fn by_id(id: &str) -> QuickResult<Self> {
        Ok(Self::by_object_id(parse_object_id(id)?))
    }

    /// Filter matching a single document by identifier.
    pub fn by_object_id(id: ObjectId) -> Self {
        Self::new().eq(ID_FIELD, id)
    }

    /// `{"$or": [...]}` over the given filters, in order.
    pub fn or(filters: impl IntoIterator<Item = FilterBuilder>) -> Self {
        Self::logical("$or", filters)
    }

    /// `{"$and": [...]}` over the given filters, in order.
    pub fn and(filters: impl IntoIterator<Item = FilterBuilder>) -> Self {
        Self::logical("$and", filters)
    }

    /// `{"$nor": [...]}` over the given filters, in order.
    pub fn nor(filters: impl IntoIterator<Item = FilterBuilder>) -> Self {
        Self::logical("$nor", filters)
    }

    fn logical(op: &str, filters: impl IntoIterator<Item = FilterBuilder>) -> Self {
        let branches = filters
            .into_iter()
            .map(|f| FieldValue::Object(f.fields))
            .collect();
        let mut fields = Fields::new();
        fields.insert(op.to_string(), FieldValue::Array(branches));
        Self { fields }
    }

    /// Add an equality condition, replacing any condition on `field`.
    pub fn eq(mut self, field: &str, value: impl ToValue) -> Self {
        self.fields.insert(field.to_string(), value.to_value());
        self
    }

    /// Add a not-equal condition.
    pub fn ne(self, field: &str, value: impl ToValue) -> Self {
        self.operator(field, "$ne", value.to_value())
    }

    /// Add a greater-than condition.
    pub fn gt(self, field: &str, value: impl ToValue) -> Self {
        self.operator(field, "$gt", value.to_value())
    }

    /// Add a greater-than-or-equal condition.
    pub fn gte(self, field: &str, value: impl ToValue) -> Self {
        self.operator(field, "$gte", value.to_value())
    }

    /// Add a less-than condition.
    pub fn lt(self, field: &str, value: impl ToValue) -> Self {
        self.operator(field, "$lt", value.to_value())
    }

    /// Add a less-than-or-equal condition.
    pub fn lte(self, field: &str, value: impl ToValue) -> Self {
        self.operator(field, "$lte", value.to_value())
    }

    /// Add an "in" condition (value in array).
    pub fn in_array<V: ToValue>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.operator(field, "$in", value_array(values))
    }

    /// Add a "not in" condition.
    pub fn nin<V: ToValue>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.operator(field, "$nin", value_array(values))
    }

    /// Add an array "all" condition (array contains all values).
    pub fn all<V: ToValue>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.operator(field, "$all", value_array(values))
    }

    /// Add an exists condition.
    pub fn exists(self, field: &str, exists: bool) -> Self {
        self.operator(field, "$exists", FieldValue::Boolean(exists))
    }

    /// Match values where `value % divisor == remainder`.
    pub fn modulo(self, field: &str, divisor: i64, remainder: i64) -> Self {
        self.operator(
            field,
            "$mod",
            FieldValue::array([FieldValue::Int64(divisor), FieldValue::Int64(remainder)]),
        )
    }

    /// Add an elemMatch condition for array elements.
    pub fn elem_match(self, field: &str, query: FilterBuilder) -> Self {
        self.operator(field, "$elemMatch", FieldValue::Object(query.fields))
    }

    /// Add a regex condition.
    pub fn regex(self, field: &str, pattern: &str) -> Self {
        self.operator(field, "$regex", FieldValue::String(pattern.to_string()))
    }

    /// Add a regex condition with options such as `i` or `m`.
    pub fn regex_with_options(self, field: &str, pattern: &str, options: &str) -> Self {
        self.regex(field, pattern)
            .operator(field, "$options", FieldValue::String(options.to_string()))
    }

    /// Add a type check condition.
    pub fn type_is(self, field: &str, field_type: FieldType) -> Self {
        self.operator(field, "$type", FieldValue::String(field_type.as_str().to_string()))
    }

    /// Add an array size condition.
    pub fn size(self, field: &str, size: i32) -> Self {
        self.operator(field, "$size", FieldValue::Int32(size))
    }

    /// Negate an operator expression such as `{"$gt": 5}`.
    pub fn not(self, field: &str, condition: FieldValue) -> Self {
        self.operator(field, "$not", condition)
    }

    /// Add a text search condition. Requires a text index.
    pub fn text_search(mut self, search: &str) -> Self {
        self.fields.insert(
            "$text".to_string(),
            FieldValue::object([("$search", FieldValue::String(search.to_string()))]),
        );
        self
    }

    /// Merge another filter into this one; its conditions win on conflict.
    pub fn merge(mut self, other: FilterBuilder) -> Self {
        self.fields.extend(other.fields);
        self
    }

    /// Check if the filter is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The accumulated conditions.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Consume the builder, returning its conditions.
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Encode the filter as a BSON document.
    pub fn to_document(&self) -> bson::Document {
        codec::encode_fields(&self.fields)
    }

    fn operator(mut self, field: &str, op: &str, value: FieldValue) -> Self {
        match self.fields.get_mut(field) {
            // An embedded-document equality is not an operator object.
            Some(FieldValue::Object(ops)) if ops.keys().all(|k| k.starts_with('$')) => {
                ops.insert(op.to_string(), value);
            }
            _ => {
                self.fields
                    .insert(field.to_string(), FieldValue::object([(op, value)]));
            }
        }
        self
    }
}

pub(crate) fn value_array<V: ToValue>(values: impl IntoIterator<Item = V>) -> FieldValue {
    FieldValue::Array(values.into_iter().map(|v| v.to_value()).collect())
}
