//! Conversion between [`FieldValue`] trees and BSON.
//!
//! Every kind has a wire mapping, so `from_bson(&to_bson(&v)) == v` holds for
//! any value. The only lossy direction is decode: BSON types with no kind of
//! their own (`JavaScriptCodeWithScope`, `DbPointer`) become `Null`.

use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Document};
use tracing::debug;

use crate::value::{FieldValue, Fields};

/// Encode a value as a BSON element.
pub fn to_bson(value: &FieldValue) -> Bson {
    match value {
        FieldValue::Object(fields) => {
            let mut sub = Document::new();
            for (key, child) in fields {
                encode_into(&mut sub, key.as_str(), child);
            }
            Bson::Document(sub)
        }
        FieldValue::Array(items) => {
            let mut arr = Vec::with_capacity(items.len());
            for child in items {
                append_to_array(&mut arr, child);
            }
            Bson::Array(arr)
        }
        FieldValue::Binary(bytes) => Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: bytes.clone(),
        }),
        FieldValue::Boolean(b) => Bson::Boolean(*b),
        FieldValue::Code(code) => Bson::JavaScriptCode(code.clone()),
        FieldValue::Date(date) => Bson::DateTime(*date),
        FieldValue::Decimal128(d) => Bson::Decimal128(*d),
        FieldValue::Double(d) => Bson::Double(*d),
        FieldValue::Int32(i) => Bson::Int32(*i),
        FieldValue::Int64(i) => Bson::Int64(*i),
        FieldValue::MaxKey => Bson::MaxKey,
        FieldValue::MinKey => Bson::MinKey,
        FieldValue::Null => Bson::Null,
        FieldValue::ObjectId(oid) => Bson::ObjectId(*oid),
        FieldValue::Regex { pattern, options } => Bson::RegularExpression(bson::Regex {
            pattern: pattern.clone(),
            options: options.clone(),
        }),
        FieldValue::String(s) => Bson::String(s.clone()),
        FieldValue::Symbol(s) => Bson::Symbol(s.clone()),
        FieldValue::Timestamp(ts) => Bson::Timestamp(*ts),
        FieldValue::Undefined => Bson::Undefined,
    }
}

/// Append `value` to `doc` under `key`, replacing any existing entry.
pub fn encode_into(doc: &mut Document, key: impl Into<String>, value: &FieldValue) {
    doc.insert(key, to_bson(value));
}

/// Append `value` positionally to a BSON array.
pub fn append_to_array(arr: &mut bson::Array, value: &FieldValue) {
    arr.push(to_bson(value));
}

/// Encode a field map as a BSON document, keeping insertion order.
pub fn encode_fields(fields: &Fields) -> Document {
    let mut doc = Document::new();
    for (key, value) in fields {
        encode_into(&mut doc, key.as_str(), value);
    }
    doc
}

/// Decode a single BSON element.
pub fn from_bson(element: &Bson) -> FieldValue {
    match element {
        Bson::Document(doc) => FieldValue::Object(decode_document(doc)),
        Bson::Array(items) => FieldValue::Array(items.iter().map(from_bson).collect()),
        Bson::Binary(bin) => FieldValue::Binary(bin.bytes.clone()),
        Bson::Boolean(b) => FieldValue::Boolean(*b),
        Bson::JavaScriptCode(code) => FieldValue::Code(code.clone()),
        Bson::DateTime(date) => FieldValue::Date(*date),
        Bson::Decimal128(d) => FieldValue::Decimal128(*d),
        Bson::Double(d) => FieldValue::Double(*d),
        Bson::Int32(i) => FieldValue::Int32(*i),
        Bson::Int64(i) => FieldValue::Int64(*i),
        Bson::MaxKey => FieldValue::MaxKey,
        Bson::MinKey => FieldValue::MinKey,
        Bson::Null => FieldValue::Null,
        Bson::ObjectId(oid) => FieldValue::ObjectId(*oid),
        Bson::RegularExpression(re) => FieldValue::Regex {
            pattern: re.pattern.clone(),
            options: re.options.clone(),
        },
        Bson::String(s) => FieldValue::String(s.clone()),
        Bson::Symbol(s) => FieldValue::Symbol(s.clone()),
        Bson::Timestamp(ts) => FieldValue::Timestamp(*ts),
        Bson::Undefined => FieldValue::Undefined,
        other => {
            debug!(element_type = ?other.element_type(), "unsupported BSON type decoded as null");
            FieldValue::Null
        }
    }
}

/// Decode every element of a BSON document into a field map.
pub fn decode_document(doc: &Document) -> Fields {
    doc.iter()
        .map(|(key, element)| (key.clone(), from_bson(element)))
        .collect()
}

/// Render a value as relaxed Extended JSON.
pub fn to_json(value: &FieldValue) -> serde_json::Value {
    to_bson(value).into_relaxed_extjson()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use bson::{Decimal128, Timestamp, doc};
    use pretty_assertions::assert_eq;

    fn round_trip(value: FieldValue) {
        assert_eq!(from_bson(&to_bson(&value)), value);
    }

    #[test]
    fn test_round_trip_every_kind() {
        round_trip(FieldValue::Binary(vec![1, 2, 3]));
        round_trip(FieldValue::Boolean(true));
        round_trip(FieldValue::Code("function() { return 1; }".into()));
        round_trip(FieldValue::Date(bson::DateTime::from_millis(1_700_000_000_123)));
        round_trip(FieldValue::Decimal128(Decimal128::from_bytes([7; 16])));
        round_trip(FieldValue::Double(3.25));
        round_trip(FieldValue::Int32(-5));
        round_trip(FieldValue::Int64(i64::MAX));
        round_trip(FieldValue::MaxKey);
        round_trip(FieldValue::MinKey);
        round_trip(FieldValue::Null);
        round_trip(FieldValue::ObjectId(ObjectId::new()));
        round_trip(FieldValue::Regex {
            pattern: "^abc".into(),
            options: "i".into(),
        });
        round_trip(FieldValue::String("héllo".into()));
        round_trip(FieldValue::Symbol("sym".into()));
        round_trip(FieldValue::Timestamp(Timestamp {
            time: 100,
            increment: 3,
        }));
        round_trip(FieldValue::Undefined);
    }

    #[test]
    fn test_round_trip_nested() {
        let value = FieldValue::object([
            ("name", FieldValue::String("A".into())),
            (
                "items",
                FieldValue::array([
                    FieldValue::object([("qty", FieldValue::Int32(2))]),
                    FieldValue::array([FieldValue::Null, FieldValue::Boolean(false)]),
                ]),
            ),
            ("empty", FieldValue::object(Vec::<(String, FieldValue)>::new())),
        ]);
        round_trip(value);
    }

    #[test]
    fn test_encode_fields_keeps_order() {
        let fields: Fields = [
            ("b".to_string(), FieldValue::Int32(1)),
            ("a".to_string(), FieldValue::Int32(2)),
        ]
        .into_iter()
        .collect();
        let doc = encode_fields(&fields);
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(doc, doc! { "b": 1, "a": 2 });
    }

    #[test]
    fn test_decode_document() {
        let oid = ObjectId::new();
        let fields = decode_document(&doc! {
            "_id": oid,
            "age": 30_i64,
            "tags": ["x", "y"],
        });
        assert_eq!(fields["_id"], FieldValue::ObjectId(oid));
        assert_eq!(fields["age"], FieldValue::Int64(30));
        assert_eq!(
            fields["tags"],
            FieldValue::array([
                FieldValue::String("x".into()),
                FieldValue::String("y".into())
            ])
        );
    }

    #[test]
    fn test_unknown_wire_type_decodes_to_null() {
        let element = Bson::JavaScriptCodeWithScope(bson::JavaScriptCodeWithScope {
            code: "x".into(),
            scope: doc! {},
        });
        assert_eq!(from_bson(&element), FieldValue::Null);
    }

    #[test]
    fn test_binary_subtype_is_dropped_on_decode() {
        let element = Bson::Binary(Binary {
            subtype: BinarySubtype::Uuid,
            bytes: vec![9; 16],
        });
        assert_eq!(from_bson(&element), FieldValue::Binary(vec![9; 16]));
    }

    #[test]
    fn test_encode_into_overwrites_key() {
        let mut doc = Document::new();
        encode_into(&mut doc, "k", &FieldValue::Int32(1));
        encode_into(&mut doc, "k", &FieldValue::Int32(2));
        assert_eq!(doc, doc! { "k": 2 });
    }

    #[test]
    fn test_to_json() {
        let value = FieldValue::object([
            ("n", FieldValue::Int32(1)),
            ("s", FieldValue::String("x".into())),
        ]);
        assert_eq!(value.to_json(), serde_json::json!({ "n": 1, "s": "x" }));
    }
}
