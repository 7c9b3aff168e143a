//! Typed collections.
//!
//! A [`Collection<T>`] stores documents of one [`Document`] type. Every read
//! and write goes through the codec: documents are encoded with
//! [`Document::to_fields`] and decoded with [`Document::from_fields`], with
//! `_id` handled by the collection.
//!
//! All data operations take an optional session so they can join a
//! transaction started with [`Database::with_transaction`](crate::Database::with_transaction).

use std::fmt;
use std::marker::PhantomData;

use bson::oid::ObjectId;
use futures::TryStreamExt;
use mongodb::options::IndexOptions;
use mongodb::{ClientSession, IndexModel};
use tracing::debug;

use crate::codec;
use crate::document::{Document, from_bson_document, to_bson_document};
use crate::error::{QuickError, QuickResult};
use crate::filter::FilterBuilder;
use crate::options::{FindAndModifyOptions, FindOptions, UpdateOptions};
use crate::pipeline::PipelineBuilder;
use crate::update::UpdateBuilder;
use crate::value::{FieldValue, Fields};

/// A collection of `T` documents.
pub struct Collection<T: Document> {
    inner: mongodb::Collection<bson::Document>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name())
            .field("document", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Document> Collection<T> {
    pub(crate) fn new(inner: mongodb::Collection<bson::Document>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// Name of the collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The underlying driver collection.
    pub fn inner(&self) -> &mongodb::Collection<bson::Document> {
        &self.inner
    }

    /// Insert a document and assign its identifier.
    ///
    /// A document whose identifier is already set is inserted under that
    /// identifier.
    pub async fn create_one(
        &self,
        doc: &mut T,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<ObjectId> {
        let bson_doc = to_bson_document(doc);
        debug!(collection = %self.name(), "create_one");

        let result = match session {
            Some(s) => self.inner.insert_one_with_session(bson_doc, None, s).await,
            None => self.inner.insert_one(bson_doc, None).await,
        }
        .map_err(|e| QuickError::operation("create document", e))?;

        let oid = result.inserted_id.as_object_id().ok_or_else(|| {
            QuickError::invalid_object_id(format!(
                "server returned non-ObjectId identifier {}",
                result.inserted_id
            ))
        })?;
        doc.id_slot().assign(oid);
        Ok(oid)
    }

    /// Insert several documents and assign their identifiers.
    ///
    /// Returns the number of documents inserted; an empty slice is a no-op.
    pub async fn create_many(
        &self,
        docs: &mut [T],
        session: Option<&mut ClientSession>,
    ) -> QuickResult<usize> {
        if docs.is_empty() {
            return Ok(0);
        }

        let bson_docs: Vec<bson::Document> = docs.iter().map(to_bson_document).collect();
        debug!(collection = %self.name(), count = docs.len(), "create_many");

        let result = match session {
            Some(s) => self.inner.insert_many_with_session(bson_docs, None, s).await,
            None => self.inner.insert_many(bson_docs, None).await,
        }
        .map_err(|e| QuickError::operation("create many documents", e))?;

        for (index, id) in &result.inserted_ids {
            if let (Some(doc), Some(oid)) = (docs.get_mut(*index), id.as_object_id()) {
                doc.id_slot().assign(oid);
            }
        }
        Ok(result.inserted_ids.len())
    }

    /// Find the first document matching `filter`.
    pub async fn find_one(
        &self,
        filter: &FilterBuilder,
        options: Option<&FindOptions>,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<Option<T>> {
        let filter_doc = filter.to_document();
        let opts = options.map(FindOptions::to_driver_find_one);
        debug!(collection = %self.name(), filter = %filter_doc, "find_one");

        let found = match session {
            Some(s) => self.inner.find_one_with_session(filter_doc, opts, s).await,
            None => self.inner.find_one(filter_doc, opts).await,
        }
        .map_err(|e| QuickError::operation("find one document", e))?;

        Ok(found.as_ref().map(from_bson_document))
    }

    /// Find every document matching `filter`.
    pub async fn find_many(
        &self,
        filter: &FilterBuilder,
        options: Option<&FindOptions>,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<Vec<T>> {
        let filter_doc = filter.to_document();
        let opts = options.map(FindOptions::to_driver);
        debug!(collection = %self.name(), filter = %filter_doc, "find_many");

        let docs = self
            .collect_find(filter_doc, opts, session)
            .await
            .map_err(|e| QuickError::operation("find many documents", e))?;

        Ok(docs.iter().map(from_bson_document).collect())
    }

    async fn collect_find(
        &self,
        filter: bson::Document,
        opts: Option<mongodb::options::FindOptions>,
        session: Option<&mut ClientSession>,
    ) -> mongodb::error::Result<Vec<bson::Document>> {
        match session {
            Some(s) => {
                let mut cursor = self.inner.find_with_session(filter, opts, s).await?;
                cursor.stream(s).try_collect().await
            }
            None => self.inner.find(filter, opts).await?.try_collect().await,
        }
    }

    /// Apply `update` to the first document matching `filter`.
    ///
    /// Returns the number of modified documents.
    pub async fn update_one(
        &self,
        filter: &FilterBuilder,
        update: &UpdateBuilder,
        options: Option<&UpdateOptions>,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<u64> {
        let filter_doc = filter.to_document();
        let update_doc = update.to_document();
        let opts = options.map(UpdateOptions::to_driver);
        debug!(collection = %self.name(), filter = %filter_doc, update = %update_doc, "update_one");

        let result = match session {
            Some(s) => {
                self.inner
                    .update_one_with_session(filter_doc, update_doc, opts, s)
                    .await
            }
            None => self.inner.update_one(filter_doc, update_doc, opts).await,
        }
        .map_err(|e| QuickError::operation("update one document", e))?;

        Ok(result.modified_count)
    }

    /// Apply `update` to every document matching `filter`.
    ///
    /// Returns the number of modified documents.
    pub async fn update_many(
        &self,
        filter: &FilterBuilder,
        update: &UpdateBuilder,
        options: Option<&UpdateOptions>,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<u64> {
        let filter_doc = filter.to_document();
        let update_doc = update.to_document();
        let opts = options.map(UpdateOptions::to_driver);
        debug!(collection = %self.name(), filter = %filter_doc, update = %update_doc, "update_many");

        let result = match session {
            Some(s) => {
                self.inner
                    .update_many_with_session(filter_doc, update_doc, opts, s)
                    .await
            }
            None => self.inner.update_many(filter_doc, update_doc, opts).await,
        }
        .map_err(|e| QuickError::operation("update many documents", e))?;

        Ok(result.modified_count)
    }

    /// Delete the first document matching `filter`.
    pub async fn delete_one(
        &self,
        filter: &FilterBuilder,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<u64> {
        let filter_doc = filter.to_document();
        debug!(collection = %self.name(), filter = %filter_doc, "delete_one");

        let result = match session {
            Some(s) => self.inner.delete_one_with_session(filter_doc, None, s).await,
            None => self.inner.delete_one(filter_doc, None).await,
        }
        .map_err(|e| QuickError::operation("delete one document", e))?;

        Ok(result.deleted_count)
    }

    /// Delete every document matching `filter`.
    pub async fn delete_many(
        &self,
        filter: &FilterBuilder,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<u64> {
        let filter_doc = filter.to_document();
        debug!(collection = %self.name(), filter = %filter_doc, "delete_many");

        let result = match session {
            Some(s) => self.inner.delete_many_with_session(filter_doc, None, s).await,
            None => self.inner.delete_many(filter_doc, None).await,
        }
        .map_err(|e| QuickError::operation("delete many documents", e))?;

        Ok(result.deleted_count)
    }

    /// Count documents matching `filter`.
    pub async fn count_documents(
        &self,
        filter: &FilterBuilder,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<u64> {
        let filter_doc = filter.to_document();
        debug!(collection = %self.name(), filter = %filter_doc, "count_documents");

        match session {
            Some(s) => {
                self.inner
                    .count_documents_with_session(filter_doc, None, s)
                    .await
            }
            None => self.inner.count_documents(filter_doc, None).await,
        }
        .map_err(|e| QuickError::operation("count documents", e))
    }

    /// Run an aggregation pipeline, decoding each result as `R`.
    pub async fn aggregate<R: Document>(
        &self,
        pipeline: &PipelineBuilder,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<Vec<R>> {
        let stages = pipeline.to_pipeline();
        debug!(collection = %self.name(), stages = stages.len(), "aggregate");

        let docs: Vec<bson::Document> = match session {
            Some(s) => match self.inner.aggregate_with_session(stages, None, s).await {
                Ok(mut cursor) => cursor.stream(s).try_collect().await,
                Err(e) => Err(e),
            },
            None => match self.inner.aggregate(stages, None).await {
                Ok(cursor) => cursor.try_collect().await,
                Err(e) => Err(e),
            },
        }
        .map_err(|e| QuickError::operation("execute aggregation", e))?;

        Ok(docs.iter().map(from_bson_document).collect())
    }

    /// Atomically update the first match and return it.
    ///
    /// Returns the document from before the update unless the options ask
    /// for [`ReturnDocument::After`](crate::ReturnDocument::After).
    pub async fn find_one_and_update(
        &self,
        filter: &FilterBuilder,
        update: &UpdateBuilder,
        options: Option<&FindAndModifyOptions>,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<Option<T>> {
        let filter_doc = filter.to_document();
        let update_doc = update.to_document();
        let opts = options.map(FindAndModifyOptions::to_driver_update);
        debug!(collection = %self.name(), filter = %filter_doc, "find_one_and_update");

        let found = match session {
            Some(s) => {
                self.inner
                    .find_one_and_update_with_session(filter_doc, update_doc, opts, s)
                    .await
            }
            None => {
                self.inner
                    .find_one_and_update(filter_doc, update_doc, opts)
                    .await
            }
        }
        .map_err(|e| QuickError::operation("find one and update", e))?;

        Ok(found.as_ref().map(from_bson_document))
    }

    /// Atomically replace the first match and return it.
    ///
    /// The replacement's identifier is not written; the stored document
    /// keeps its own.
    pub async fn find_one_and_replace(
        &self,
        filter: &FilterBuilder,
        replacement: &T,
        options: Option<&FindAndModifyOptions>,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<Option<T>> {
        let filter_doc = filter.to_document();
        let replacement_doc = codec::encode_fields(&replacement.to_fields());
        let opts = options.map(FindAndModifyOptions::to_driver_replace);
        debug!(collection = %self.name(), filter = %filter_doc, "find_one_and_replace");

        let found = match session {
            Some(s) => {
                self.inner
                    .find_one_and_replace_with_session(filter_doc, replacement_doc, opts, s)
                    .await
            }
            None => {
                self.inner
                    .find_one_and_replace(filter_doc, replacement_doc, opts)
                    .await
            }
        }
        .map_err(|e| QuickError::operation("find one and replace", e))?;

        Ok(found.as_ref().map(from_bson_document))
    }

    /// Atomically delete the first match and return it.
    pub async fn find_one_and_delete(
        &self,
        filter: &FilterBuilder,
        options: Option<&FindAndModifyOptions>,
        session: Option<&mut ClientSession>,
    ) -> QuickResult<Option<T>> {
        let filter_doc = filter.to_document();
        let opts = options.map(FindAndModifyOptions::to_driver_delete);
        debug!(collection = %self.name(), filter = %filter_doc, "find_one_and_delete");

        let found = match session {
            Some(s) => {
                self.inner
                    .find_one_and_delete_with_session(filter_doc, opts, s)
                    .await
            }
            None => self.inner.find_one_and_delete(filter_doc, opts).await,
        }
        .map_err(|e| QuickError::operation("find one and delete", e))?;

        Ok(found.as_ref().map(from_bson_document))
    }

    /// Create a single-field index and return its name.
    pub async fn create_index(&self, field: &str, ascending: bool) -> QuickResult<String> {
        let mut keys = Fields::new();
        keys.insert(field.to_string(), direction(ascending));
        self.create_index_from_keys(keys, None, "create index").await
    }

    /// Create a compound index over `(field, ascending)` pairs.
    pub async fn create_compound_index(&self, fields: &[(&str, bool)]) -> QuickResult<String> {
        if fields.is_empty() {
            return Err(QuickError::invalid_argument(
                "cannot create a compound index with no fields",
            ));
        }
        let keys = fields
            .iter()
            .map(|(field, ascending)| (field.to_string(), direction(*ascending)))
            .collect();
        self.create_index_from_keys(keys, None, "create compound index")
            .await
    }

    /// Create a text index over `fields`.
    pub async fn create_text_index(&self, fields: &[&str]) -> QuickResult<String> {
        if fields.is_empty() {
            return Err(QuickError::invalid_argument(
                "cannot create a text index with no fields",
            ));
        }
        let keys = fields
            .iter()
            .map(|field| (field.to_string(), FieldValue::String("text".into())))
            .collect();
        self.create_index_from_keys(keys, None, "create text index")
            .await
    }

    /// Create a unique single-field index.
    pub async fn create_unique_index(&self, field: &str) -> QuickResult<String> {
        let mut keys = Fields::new();
        keys.insert(field.to_string(), direction(true));
        let options = IndexOptions::builder().unique(true).build();
        self.create_index_from_keys(keys, Some(options), "create unique index")
            .await
    }

    async fn create_index_from_keys(
        &self,
        keys: Fields,
        options: Option<IndexOptions>,
        operation: &'static str,
    ) -> QuickResult<String> {
        let keys = codec::encode_fields(&keys);
        debug!(collection = %self.name(), keys = %keys, "{}", operation);

        let model = IndexModel::builder().keys(keys).options(options).build();
        let result = self
            .inner
            .create_index(model, None)
            .await
            .map_err(|e| QuickError::operation(operation, e))?;
        Ok(result.index_name)
    }

    /// Drop an index by name.
    pub async fn drop_index(&self, name: &str) -> QuickResult<()> {
        debug!(collection = %self.name(), index = %name, "drop_index");
        self.inner
            .drop_index(name, None)
            .await
            .map_err(|e| QuickError::operation("drop index", e))
    }

    /// Names of every index on the collection.
    pub async fn list_indexes(&self) -> QuickResult<Vec<String>> {
        self.inner
            .list_index_names()
            .await
            .map_err(|e| QuickError::operation("list indexes", e))
    }
}

fn direction(ascending: bool) -> FieldValue {
    FieldValue::Int32(if ascending { 1 } else { -1 })
}
