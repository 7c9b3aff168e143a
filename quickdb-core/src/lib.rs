//! # quickdb-core
//!
//! Typed value model, BSON codec, query builders and MongoDB persistence
//! layer for the QuickDB object-document mapper.
//!
//! This crate provides:
//! - [`FieldValue`], a recursive tagged union for every storable value
//! - [`ToValue`] / [`FromValue`] bindings between host types and values
//! - A lossless codec between values and BSON ([`codec`])
//! - Fluent [`FilterBuilder`], [`UpdateBuilder`] and [`PipelineBuilder`]
//! - Typed [`Collection`]s, transactions and GridFS on a pooled [`Database`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use quickdb::prelude::*;
//!
//! #[derive(Debug, Default, Document)]
//! struct User {
//!     #[quickdb(id)]
//!     id: DocumentId,
//!     name: String,
//!     age: i32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> QuickResult<()> {
//!     let db = Database::connect("mongodb://localhost:27017", "app").await?;
//!     let users = db.default_collection::<User>();
//!
//!     let mut alice = User { name: "Alice".into(), age: 30, ..Default::default() };
//!     users.create_one(&mut alice, None).await?;
//!
//!     let adults = users
//!         .find_many(&FilterBuilder::new().gte("age", 18), None, None)
//!         .await?;
//!     println!("{} adults", adults.len());
//!     Ok(())
//! }
//! ```

pub mod binding;
pub mod codec;
pub mod collection;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod filter;
pub mod gridfs;
pub mod logging;
pub mod options;
pub mod pipeline;
pub mod update;
pub mod value;

pub use bson;
pub use bson::oid::ObjectId;
pub use binding::{FromValue, ToValue};
pub use collection::Collection;
pub use config::{DatabaseConfig, DatabaseConfigBuilder, ReadPreference, WriteConcern};
pub use database::{BoxFuture, Database};
pub use document::{Document, DocumentId, get_field, render};
pub use error::{QuickError, QuickResult};
pub use filter::FilterBuilder;
pub use gridfs::GridFsBucket;
pub use mongodb::ClientSession;
pub use options::{FindAndModifyOptions, FindOptions, ReturnDocument, SortOrder, UpdateOptions};
pub use pipeline::{DocumentBuilder, PipelineBuilder};
pub use update::{BitOp, UpdateBuilder};
pub use value::{FieldType, FieldValue, Fields};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::binding::{FromValue, ToValue};
    pub use crate::collection::Collection;
    pub use crate::config::DatabaseConfig;
    pub use crate::database::Database;
    pub use crate::document::{Document, DocumentId, get_field};
    pub use crate::error::{QuickError, QuickResult};
    pub use crate::filter::FilterBuilder;
    pub use crate::options::{
        FindAndModifyOptions, FindOptions, ReturnDocument, SortOrder, UpdateOptions,
    };
    pub use crate::pipeline::{DocumentBuilder, PipelineBuilder};
    pub use crate::update::UpdateBuilder;
    pub use crate::value::{FieldType, FieldValue, Fields};
    pub use bson::oid::ObjectId;
}
