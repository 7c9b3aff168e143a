//! The document contract and its identifier.

use std::fmt;

use bson::oid::ObjectId;

use crate::binding::FromValue;
use crate::codec;
use crate::error::QuickResult;
use crate::value::{FieldValue, Fields};

/// Name of the identifier field on the wire.
pub const ID_FIELD: &str = "_id";

/// The identifier of a stored document.
///
/// Unset until the document is first persisted. Only the persistence layer
/// can set it; user code can read it but has no way to write it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DocumentId(Option<ObjectId>);

impl DocumentId {
    /// An unset identifier.
    pub const fn new() -> Self {
        Self(None)
    }

    /// The identifier, if the document has been persisted.
    pub fn get(&self) -> Option<ObjectId> {
        self.0
    }

    /// Check whether the identifier has been assigned.
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Hex form of the identifier, if set.
    pub fn to_hex(&self) -> Option<String> {
        self.0.map(|oid| oid.to_hex())
    }

    pub(crate) fn assign(&mut self, oid: ObjectId) {
        self.0 = Some(oid);
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(oid) => write!(f, "{}", oid),
            None => f.write_str("<unset>"),
        }
    }
}

/// A record type stored in a collection.
///
/// Usually implemented with `#[derive(Document)]`:
///
/// ```rust,ignore
/// #[derive(Debug, Default, Document)]
/// #[quickdb(collection = "users")]
/// struct User {
///     #[quickdb(id)]
///     id: DocumentId,
///     name: String,
///     age: i32,
/// }
/// ```
pub trait Document: Default + Send + Sync + 'static {
    /// Serialize every persisted field, excluding the identifier.
    fn to_fields(&self) -> Fields;

    /// Populate `self` from a field map. Missing keys leave fields untouched.
    fn from_fields(&mut self, fields: &Fields);

    /// The document identifier.
    fn id(&self) -> &DocumentId;

    #[doc(hidden)]
    fn id_slot(&mut self) -> &mut DocumentId;

    /// Collection used by `Database::default_collection`.
    fn collection_name() -> String
    where
        Self: Sized,
    {
        let full = std::any::type_name::<Self>();
        // Generic arguments carry their own paths; drop them first.
        let path = full.split('<').next().unwrap_or(full);
        let short = path.rsplit("::").next().unwrap_or(path);
        format!("{}s", short.to_lowercase())
    }
}

/// Read `key` from `fields` into `out`.
///
/// Returns `false` and leaves `out` untouched if the key is absent. A present
/// key of the wrong kind writes the zero value of `T`.
pub fn get_field<T: FromValue>(fields: &Fields, key: &str, out: &mut T) -> bool {
    match fields.get(key) {
        Some(value) => {
            *out = value.extract();
            true
        }
        None => false,
    }
}

/// Build a document from a decoded field map, moving `_id` into its identifier.
///
/// Only an ObjectId `_id` is treated as the identifier; any other `_id` (for
/// instance a `$group` key) is handed to `from_fields` like a normal field.
pub fn hydrate<T: Document>(mut fields: Fields) -> T {
    let mut doc = T::default();
    if let Some(FieldValue::ObjectId(oid)) = fields.get(ID_FIELD) {
        let oid = *oid;
        fields.shift_remove(ID_FIELD);
        doc.id_slot().assign(oid);
    }
    doc.from_fields(&fields);
    doc
}

/// Strict extraction of a nested document; used by the generated
/// `FromValue` impls.
#[doc(hidden)]
pub fn document_from_value<T: Document>(value: &FieldValue) -> Option<T> {
    match value {
        FieldValue::Object(fields) => Some(hydrate(fields.clone())),
        _ => None,
    }
}

/// Full field map of a document, with `_id` first when it is set.
pub fn fields_with_id<T: Document>(doc: &T) -> Fields {
    let mut fields = Fields::new();
    if let Some(oid) = doc.id().get() {
        fields.insert(ID_FIELD.to_string(), FieldValue::ObjectId(oid));
    }
    fields.extend(doc.to_fields());
    fields
}

/// Encode a document, including its identifier when set.
pub fn to_bson_document<T: Document>(doc: &T) -> bson::Document {
    codec::encode_fields(&fields_with_id(doc))
}

/// Decode a BSON document into `T`.
pub fn from_bson_document<T: Document>(doc: &bson::Document) -> T {
    hydrate(codec::decode_document(doc))
}

/// Pretty-print a document, identifier included.
pub fn render<T: Document>(doc: &T) -> String {
    format!("{:#}", FieldValue::Object(fields_with_id(doc)))
}

/// Parse an ObjectId from its hex form.
pub fn parse_object_id(s: &str) -> QuickResult<ObjectId> {
    Ok(ObjectId::parse_str(s)?)
}
