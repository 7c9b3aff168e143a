//! Procedural macros for QuickDB.
//!
//! This crate generates the glue between plain Rust structs and the QuickDB
//! value model. It is re-exported by the `quickdb` crate; depend on that
//! instead of using this crate directly.
//!
//! # Macros
//!
//! - [`Document`] - Derive the document contract for a struct
//! - [`FieldEnum`] - Store a field-less enum as its discriminant
//!
//! # Example
//!
//! ```rust,ignore
//! use quickdb::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, Default, PartialEq, FieldEnum)]
//! enum Role {
//!     #[default]
//!     Member,
//!     Admin = 10,
//! }
//!
//! #[derive(Debug, Default, Document)]
//! #[quickdb(collection = "users")]
//! struct User {
//!     #[quickdb(id)]
//!     id: DocumentId,
//!     #[quickdb(rename = "full_name")]
//!     name: String,
//!     role: Role,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod document;
mod field_enum;

/// Derive `quickdb::Document` for a struct with named fields.
///
/// Also implements `ToValue` and `FromValue`, so the struct can be nested
/// inside other documents and stored in arrays.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[quickdb(collection = "name")]` - Collection used by `default_collection`
/// - `#[quickdb(rename_all = "camelCase")]` - Rename every field key; accepts
///   `camelCase`, `snake_case`, `PascalCase`, `kebab-case`,
///   `SCREAMING_SNAKE_CASE` and `lowercase`
///
/// ## Field-level
/// - `#[quickdb(id)]` - The `DocumentId` field. A field named `id` is used
///   when no field carries the attribute.
/// - `#[quickdb(rename = "key")]` - Store the field under a different key
/// - `#[quickdb(skip)]` - Never persist the field
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Debug, Default, quickdb::Document)]
/// #[quickdb(collection = "orders", rename_all = "camelCase")]
/// struct Order {
///     #[quickdb(id)]
///     id: DocumentId,
///     customer_name: String,
///     total_cents: i64,
///     #[quickdb(skip)]
///     dirty: bool,
/// }
/// ```
#[proc_macro_derive(Document, attributes(quickdb))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match document::derive_document_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `ToValue` and `FromValue` for a field-less enum.
///
/// The variant is stored as its `i32` discriminant. A stored value that
/// matches no variant reads back as `Default::default()`, so the enum must
/// implement `Default`.
///
/// Discriminants must fit in an `i32`: a `#[repr]` wider than `i32`
/// (`i64`, `u32`, `isize` and so on) or a literal discriminant out of range
/// is a compile error.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Copy, Default, PartialEq, quickdb::FieldEnum)]
/// enum Status {
///     #[default]
///     Pending,
///     Shipped = 5,
///     Delivered,
/// }
/// ```
#[proc_macro_derive(FieldEnum)]
pub fn derive_field_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match field_enum::derive_field_enum_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
