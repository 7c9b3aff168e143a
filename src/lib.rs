//! # QuickDB
//!
//! A type-safe object-document mapper for MongoDB.
//!
//! QuickDB provides:
//! - A typed value model ([`FieldValue`]) covering every BSON kind
//! - `#[derive(Document)]` to map plain structs to stored documents
//! - Fluent filter, update and aggregation pipeline builders
//! - Async, session-aware collections on a pooled connection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quickdb::prelude::*;
//!
//! #[derive(Debug, Default, Document)]
//! #[quickdb(collection = "users")]
//! pub struct User {
//!     #[quickdb(id)]
//!     pub id: DocumentId,
//!     pub email: String,
//!     pub age: i32,
//!     pub tags: Vec<String>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> QuickResult<()> {
//!     let db = Database::connect("mongodb://localhost:27017", "app").await?;
//!     let users = db.default_collection::<User>();
//!
//!     let mut user = User { email: "ann@example.com".into(), age: 31, ..Default::default() };
//!     users.create_one(&mut user, None).await?;
//!
//!     let found = users
//!         .find_many(&FilterBuilder::new().gte("age", 18).in_array("tags", ["admin"]), None, None)
//!         .await?;
//!
//!     users
//!         .update_many(
//!             &FilterBuilder::new().lt("age", 18),
//!             &UpdateBuilder::new().set("minor", true),
//!             None,
//!             None,
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub use quickdb_core::*;

// Re-export proc macros
pub use quickdb_derive::{Document, FieldEnum};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use quickdb_core::prelude::*;
    pub use quickdb_derive::{Document, FieldEnum};
}
