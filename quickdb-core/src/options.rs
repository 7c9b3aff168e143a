//! Options for find, update and find-and-modify operations.
//!
//! Each type converts into the driver's option structs; unset values are left
//! to the server defaults.

use mongodb::options as driver;

use crate::codec;
use crate::pipeline::DocumentBuilder;
use crate::value::{FieldValue, Fields};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    fn as_value(self) -> FieldValue {
        match self {
            Self::Ascending => FieldValue::Int32(1),
            Self::Descending => FieldValue::Int32(-1),
        }
    }
}

/// Options for `find_one` and `find_many`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    sort: Fields,
    limit: Option<i64>,
    skip: Option<u64>,
    projection: Option<Fields>,
}

impl FindOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sort key. Keys are applied in the order they are added.
    pub fn sort(mut self, key: &str, order: SortOrder) -> Self {
        self.sort.insert(key.to_string(), order.as_value());
        self
    }

    /// Return at most `limit` documents.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `skip` matches.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Restrict the returned fields.
    pub fn projection(mut self, projection: DocumentBuilder) -> Self {
        self.projection = Some(projection.into_fields());
        self
    }

    /// Convert to the driver's options for `find`.
    pub fn to_driver(&self) -> driver::FindOptions {
        let mut opts = driver::FindOptions::default();
        opts.sort = non_empty(&self.sort);
        opts.limit = self.limit;
        opts.skip = self.skip;
        opts.projection = self.projection.as_ref().map(codec::encode_fields);
        opts
    }

    /// Convert to the driver's options for `find_one`. The limit is ignored.
    pub fn to_driver_find_one(&self) -> driver::FindOneOptions {
        let mut opts = driver::FindOneOptions::default();
        opts.sort = non_empty(&self.sort);
        opts.skip = self.skip;
        opts.projection = self.projection.as_ref().map(codec::encode_fields);
        opts
    }
}

/// Options for `update_one` and `update_many`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    upsert: Option<bool>,
}

impl UpdateOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new document when nothing matches.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }

    /// Convert to the driver's options.
    pub fn to_driver(&self) -> driver::UpdateOptions {
        let mut opts = driver::UpdateOptions::default();
        opts.upsert = self.upsert;
        opts
    }
}

/// Which version of the document a find-and-modify returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReturnDocument {
    /// The document as it was before the modification.
    #[default]
    Before,
    /// The document after the modification.
    After,
}

impl From<ReturnDocument> for driver::ReturnDocument {
    fn from(value: ReturnDocument) -> Self {
        match value {
            ReturnDocument::Before => driver::ReturnDocument::Before,
            ReturnDocument::After => driver::ReturnDocument::After,
        }
    }
}

/// Options for `find_one_and_update`, `find_one_and_replace` and
/// `find_one_and_delete`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindAndModifyOptions {
    sort: Fields,
    projection: Fields,
    upsert: Option<bool>,
    return_document: Option<ReturnDocument>,
}

impl FindAndModifyOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sort key; the first match in this order is modified.
    pub fn sort(mut self, key: &str, order: SortOrder) -> Self {
        self.sort.insert(key.to_string(), order.as_value());
        self
    }

    /// Include or exclude a field from the returned document.
    pub fn projection(mut self, field: &str, include: bool) -> Self {
        self.projection
            .insert(field.to_string(), FieldValue::Int32(i32::from(include)));
        self
    }

    /// Insert a new document when nothing matches. Ignored by delete.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }

    /// Choose which version of the document to return. Ignored by delete.
    pub fn return_document(mut self, which: ReturnDocument) -> Self {
        self.return_document = Some(which);
        self
    }

    /// Convert to the driver's options for `find_one_and_update`.
    pub fn to_driver_update(&self) -> driver::FindOneAndUpdateOptions {
        let mut opts = driver::FindOneAndUpdateOptions::default();
        opts.sort = non_empty(&self.sort);
        opts.projection = non_empty(&self.projection);
        opts.upsert = self.upsert;
        opts.return_document = self.return_document.map(Into::into);
        opts
    }

    /// Convert to the driver's options for `find_one_and_replace`.
    pub fn to_driver_replace(&self) -> driver::FindOneAndReplaceOptions {
        let mut opts = driver::FindOneAndReplaceOptions::default();
        opts.sort = non_empty(&self.sort);
        opts.projection = non_empty(&self.projection);
        opts.upsert = self.upsert;
        opts.return_document = self.return_document.map(Into::into);
        opts
    }

    /// Convert to the driver's options for `find_one_and_delete`.
    pub fn to_driver_delete(&self) -> driver::FindOneAndDeleteOptions {
        let mut opts = driver::FindOneAndDeleteOptions::default();
        opts.sort = non_empty(&self.sort);
        opts.projection = non_empty(&self.projection);
        opts
    }
}

fn non_empty(fields: &Fields) -> Option<bson::Document> {
    if fields.is_empty() {
        None
    } else {
        Some(codec::encode_fields(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_options_conversion() {
        let opts = FindOptions::new()
            .sort("age", SortOrder::Descending)
            .sort("name", SortOrder::Ascending)
            .limit(10)
            .skip(5)
            .projection(DocumentBuilder::with("name", 1));

        let driver = opts.to_driver();
        assert_eq!(driver.sort, Some(doc! { "age": -1, "name": 1 }));
        assert_eq!(driver.limit, Some(10));
        assert_eq!(driver.skip, Some(5));
        assert_eq!(driver.projection, Some(doc! { "name": 1 }));

        let one = opts.to_driver_find_one();
        assert_eq!(one.sort, Some(doc! { "age": -1, "name": 1 }));
        assert_eq!(one.skip, Some(5));
    }

    #[test]
    fn test_empty_options_leave_defaults() {
        let driver = FindOptions::new().to_driver();
        assert_eq!(driver.sort, None);
        assert_eq!(driver.limit, None);
        assert_eq!(driver.projection, None);
        assert_eq!(UpdateOptions::new().to_driver().upsert, None);
    }

    #[test]
    fn test_update_options() {
        assert_eq!(UpdateOptions::new().upsert(true).to_driver().upsert, Some(true));
    }

    #[test]
    fn test_find_and_modify_options() {
        let opts = FindAndModifyOptions::new()
            .sort("score", SortOrder::Descending)
            .projection("name", true)
            .projection("secret", false)
            .upsert(true)
            .return_document(ReturnDocument::After);

        let update = opts.to_driver_update();
        assert_eq!(update.sort, Some(doc! { "score": -1 }));
        assert_eq!(update.projection, Some(doc! { "name": 1, "secret": 0 }));
        assert_eq!(update.upsert, Some(true));
        assert!(matches!(
            update.return_document,
            Some(driver::ReturnDocument::After)
        ));

        let replace = opts.to_driver_replace();
        assert_eq!(replace.upsert, Some(true));

        let delete = opts.to_driver_delete();
        assert_eq!(delete.sort, Some(doc! { "score": -1 }));
    }
}
