//! Aggregation pipeline building.

use crate::binding::ToValue;
use crate::codec;
use crate::filter::FilterBuilder;
use crate::value::{FieldValue, Fields};

/// Small builder for the free-form documents used by `$group`, `$project`,
/// `$sort` and projections.
///
/// ```rust
/// use quickdb_core::DocumentBuilder;
///
/// let group = DocumentBuilder::with("_id", "$city")
///     .add_document("total", DocumentBuilder::with("$sum", 1));
/// assert_eq!(group.build(), quickdb_core::bson::doc! { "_id": "$city", "total": { "$sum": 1 } });
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentBuilder {
    fields: Fields,
}

impl DocumentBuilder {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document holding a single entry.
    pub fn with(key: &str, value: impl ToValue) -> Self {
        Self::new().add_field(key, value)
    }

    /// Add or replace an entry.
    pub fn add_field(mut self, key: &str, value: impl ToValue) -> Self {
        self.fields.insert(key.to_string(), value.to_value());
        self
    }

    /// Add or replace an entry holding a nested document.
    pub fn add_document(mut self, key: &str, document: DocumentBuilder) -> Self {
        self.fields
            .insert(key.to_string(), FieldValue::Object(document.fields));
        self
    }

    /// The accumulated entries.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Consume the builder, returning its entries.
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Encode as a BSON document.
    pub fn build(&self) -> bson::Document {
        codec::encode_fields(&self.fields)
    }
}

/// Builder for aggregation pipelines.
///
/// Stages are kept in call order; each is a single-key object naming the
/// stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineBuilder {
    stages: Vec<Fields>,
}

impl PipelineBuilder {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `$match` stage.
    pub fn match_stage(self, filter: FilterBuilder) -> Self {
        self.stage("$match", FieldValue::Object(filter.into_fields()))
    }

    /// Add a `$group` stage.
    pub fn group(self, group: DocumentBuilder) -> Self {
        self.stage("$group", FieldValue::Object(group.into_fields()))
    }

    /// Add a `$project` stage.
    pub fn project(self, projection: DocumentBuilder) -> Self {
        self.stage("$project", FieldValue::Object(projection.into_fields()))
    }

    /// Add a `$sort` stage.
    pub fn sort(self, sort: DocumentBuilder) -> Self {
        self.stage("$sort", FieldValue::Object(sort.into_fields()))
    }

    /// Add a `$limit` stage.
    pub fn limit(self, limit: i64) -> Self {
        self.stage("$limit", FieldValue::Int64(limit))
    }

    /// Add a `$skip` stage.
    pub fn skip(self, skip: i64) -> Self {
        self.stage("$skip", FieldValue::Int64(skip))
    }

    /// Add an `$unwind` stage. `path` is a field path such as `"$tags"`.
    pub fn unwind(self, path: &str) -> Self {
        self.stage(
            "$unwind",
            FieldValue::object([("path", FieldValue::String(path.to_string()))]),
        )
    }

    /// Add an `$unwind` stage with options.
    pub fn unwind_with_options(
        self,
        path: &str,
        preserve_null_and_empty: bool,
        include_array_index: Option<&str>,
    ) -> Self {
        let mut spec = Fields::new();
        spec.insert("path".into(), FieldValue::String(path.to_string()));
        spec.insert(
            "preserveNullAndEmptyArrays".into(),
            FieldValue::Boolean(preserve_null_and_empty),
        );
        if let Some(index_field) = include_array_index {
            spec.insert(
                "includeArrayIndex".into(),
                FieldValue::String(index_field.to_string()),
            );
        }
        self.stage("$unwind", FieldValue::Object(spec))
    }

    /// Add a `$lookup` stage (join).
    pub fn lookup(self, from: &str, local_field: &str, foreign_field: &str, as_field: &str) -> Self {
        let spec = FieldValue::object([
            ("from", FieldValue::String(from.to_string())),
            ("localField", FieldValue::String(local_field.to_string())),
            ("foreignField", FieldValue::String(foreign_field.to_string())),
            ("as", FieldValue::String(as_field.to_string())),
        ]);
        self.stage("$lookup", spec)
    }

    /// Add a `$count` stage writing the count to `output_field`.
    pub fn count(self, output_field: &str) -> Self {
        self.stage("$count", FieldValue::String(output_field.to_string()))
    }

    /// Add an `$addFields` stage.
    pub fn add_fields(self, fields: DocumentBuilder) -> Self {
        self.stage("$addFields", FieldValue::Object(fields.into_fields()))
    }

    /// Append a stage as-is.
    pub fn add_stage(mut self, stage: Fields) -> Self {
        self.stages.push(stage);
        self
    }

    /// The stages, in order.
    pub fn stages(&self) -> &[Fields] {
        &self.stages
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Encode every stage as a BSON document.
    pub fn to_pipeline(&self) -> Vec<bson::Document> {
        self.stages.iter().map(codec::encode_fields).collect()
    }

    fn stage(mut self, name: &str, body: FieldValue) -> Self {
        let mut stage = Fields::with_capacity(1);
        stage.insert(name.to_string(), body);
        self.stages.push(stage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stage_order_is_preserved() {
        let pipeline = PipelineBuilder::new()
            .match_stage(FilterBuilder::new().eq("active", true))
            .group(
                DocumentBuilder::with("_id", "$city")
                    .add_document("n", DocumentBuilder::with("$sum", 1)),
            )
            .sort(DocumentBuilder::with("n", -1));

        let names: Vec<&str> = pipeline
            .stages()
            .iter()
            .map(|s| {
                assert_eq!(s.len(), 1);
                s.keys().next().map(String::as_str).unwrap_or_default()
            })
            .collect();
        assert_eq!(names, vec!["$match", "$group", "$sort"]);

        assert_eq!(
            pipeline.to_pipeline(),
            vec![
                doc! { "$match": { "active": true } },
                doc! { "$group": { "_id": "$city", "n": { "$sum": 1 } } },
                doc! { "$sort": { "n": -1 } },
            ]
        );
    }

    #[test]
    fn test_lookup_shape() {
        let pipeline = PipelineBuilder::new().lookup("orders", "_id", "user_id", "orders");
        assert_eq!(
            pipeline.to_pipeline(),
            vec![doc! {
                "$lookup": {
                    "from": "orders",
                    "localField": "_id",
                    "foreignField": "user_id",
                    "as": "orders",
                }
            }]
        );
    }

    #[test]
    fn test_scalar_stages() {
        let pipeline = PipelineBuilder::new()
            .skip(10)
            .limit(5)
            .unwind("$tags")
            .count("total");
        assert_eq!(
            pipeline.to_pipeline(),
            vec![
                doc! { "$skip": 10_i64 },
                doc! { "$limit": 5_i64 },
                doc! { "$unwind": { "path": "$tags" } },
                doc! { "$count": "total" },
            ]
        );
    }

    #[test]
    fn test_unwind_with_options_and_add_fields() {
        let pipeline = PipelineBuilder::new()
            .unwind_with_options("$items", true, Some("idx"))
            .add_fields(DocumentBuilder::with("flag", true))
            .project(DocumentBuilder::with("name", 1));
        assert_eq!(
            pipeline.to_pipeline(),
            vec![
                doc! { "$unwind": { "path": "$items", "preserveNullAndEmptyArrays": true, "includeArrayIndex": "idx" } },
                doc! { "$addFields": { "flag": true } },
                doc! { "$project": { "name": 1 } },
            ]
        );
    }

    #[test]
    fn test_add_stage_raw() {
        let mut raw = Fields::new();
        raw.insert("$sample".into(), FieldValue::object([("size", FieldValue::Int32(3))]));
        let pipeline = PipelineBuilder::new().add_stage(raw);
        assert_eq!(pipeline.len(), 1);
        assert_eq!(pipeline.to_pipeline(), vec![doc! { "$sample": { "size": 3 } }]);
    }

    #[test]
    fn test_document_builder_overwrites_key() {
        let doc = DocumentBuilder::new().add_field("a", 1).add_field("a", "x");
        assert_eq!(doc.build(), doc! { "a": "x" });
        assert!(PipelineBuilder::new().is_empty());
    }
}
