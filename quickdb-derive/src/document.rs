//! Implementation of the `#[derive(Document)]` macro.

use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Type};

/// Parse and generate code for the `#[derive(Document)]` macro.
pub fn derive_document_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Document derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Document derive only supports structs",
            ));
        }
    };

    let struct_attrs = parse_struct_attrs(input)?;
    let field_infos: Vec<FieldInfo> = fields
        .iter()
        .map(|f| parse_field(f, struct_attrs.rename_all))
        .collect::<Result<_, _>>()?;

    let id_field = find_id_field(input, &field_infos)?;
    let id_name = &id_field.name;

    let persisted: Vec<&FieldInfo> = field_infos
        .iter()
        .filter(|f| !f.is_skipped && f.name != *id_name)
        .collect();

    for (i, field) in persisted.iter().enumerate() {
        if field.key == "_id" {
            return Err(syn::Error::new_spanned(
                &field.name,
                "the key `_id` is reserved for the #[quickdb(id)] field",
            ));
        }
        if persisted[..i].iter().any(|other| other.key == field.key) {
            return Err(syn::Error::new_spanned(
                &field.name,
                format!("duplicate document key `{}`", field.key),
            ));
        }
    }

    let capacity = persisted.len();
    let encode_fields: Vec<_> = persisted
        .iter()
        .map(|f| {
            let field_name = &f.name;
            let key = &f.key;
            quote! {
                fields.insert(
                    ::std::string::String::from(#key),
                    ::quickdb::ToValue::to_value(&self.#field_name),
                );
            }
        })
        .collect();

    let decode_fields: Vec<_> = persisted
        .iter()
        .map(|f| {
            let field_name = &f.name;
            let key = &f.key;
            quote! {
                ::quickdb::get_field(fields, #key, &mut self.#field_name);
            }
        })
        .collect();

    let collection_name = struct_attrs.collection.map(|collection| {
        quote! {
            fn collection_name() -> ::std::string::String {
                ::std::string::String::from(#collection)
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::quickdb::Document for #name #ty_generics #where_clause {
            #[allow(unused_mut)]
            fn to_fields(&self) -> ::quickdb::Fields {
                let mut fields = ::quickdb::Fields::with_capacity(#capacity);
                #(#encode_fields)*
                fields
            }

            #[allow(unused_variables)]
            fn from_fields(&mut self, fields: &::quickdb::Fields) {
                #(#decode_fields)*
            }

            fn id(&self) -> &::quickdb::DocumentId {
                &self.#id_name
            }

            fn id_slot(&mut self) -> &mut ::quickdb::DocumentId {
                &mut self.#id_name
            }

            #collection_name
        }

        impl #impl_generics ::quickdb::ToValue for #name #ty_generics #where_clause {
            fn to_value(&self) -> ::quickdb::FieldValue {
                ::quickdb::FieldValue::Object(::quickdb::Document::to_fields(self))
            }
        }

        impl #impl_generics ::quickdb::FromValue for #name #ty_generics #where_clause {
            fn try_from_value(value: &::quickdb::FieldValue) -> ::std::option::Option<Self> {
                ::quickdb::document::document_from_value(value)
            }

            fn zero() -> Self {
                <Self as ::std::default::Default>::default()
            }
        }
    })
}

/// Struct-level attributes parsed from `#[quickdb(...)]`.
#[derive(Debug, Default)]
struct StructAttrs {
    collection: Option<String>,
    rename_all: Option<Case>,
}

/// Parse struct-level `#[quickdb(...)]` attributes.
fn parse_struct_attrs(input: &DeriveInput) -> Result<StructAttrs, syn::Error> {
    let mut attrs = StructAttrs::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("quickdb") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(meta.error("collection name must not be empty"));
                }
                attrs.collection = Some(value.value());
            } else if meta.path.is_ident("rename_all") {
                let value: LitStr = meta.value()?.parse()?;
                let case = parse_case(&value.value())
                    .ok_or_else(|| meta.error(format!("unknown case `{}`", value.value())))?;
                attrs.rename_all = Some(case);
            } else {
                return Err(meta.error("unknown quickdb struct attribute"));
            }
            Ok(())
        })?;
    }

    Ok(attrs)
}

/// Map a `rename_all` value to a case.
fn parse_case(value: &str) -> Option<Case> {
    match value {
        "camelCase" => Some(Case::Camel),
        "snake_case" => Some(Case::Snake),
        "PascalCase" => Some(Case::Pascal),
        "kebab-case" => Some(Case::Kebab),
        "SCREAMING_SNAKE_CASE" => Some(Case::UpperSnake),
        "lowercase" => Some(Case::Flat),
        _ => None,
    }
}

/// Information about a field.
#[derive(Debug)]
struct FieldInfo {
    name: Ident,
    ty: Type,
    key: String,
    is_id: bool,
    is_skipped: bool,
}

/// Parse a field and its `#[quickdb(...)]` attributes.
fn parse_field(field: &syn::Field, rename_all: Option<Case>) -> Result<FieldInfo, syn::Error> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "Fields must be named"))?;

    let ty = field.ty.clone();
    let raw_name = name.to_string();
    let raw_name = raw_name.strip_prefix("r#").unwrap_or(&raw_name);
    let mut key = match rename_all {
        Some(case) => raw_name.to_case(case),
        None => raw_name.to_string(),
    };
    let mut is_id = false;
    let mut is_skipped = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("quickdb") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                is_id = true;
            } else if meta.path.is_ident("skip") {
                is_skipped = true;
            } else if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(meta.error("renamed key must not be empty"));
                }
                key = value.value();
            } else {
                return Err(meta.error("unknown quickdb field attribute"));
            }
            Ok(())
        })?;
    }

    if is_id && is_skipped {
        return Err(syn::Error::new_spanned(
            field,
            "the id field cannot also be skipped",
        ));
    }

    Ok(FieldInfo {
        name,
        ty,
        key,
        is_id,
        is_skipped,
    })
}

/// Pick the identifier field: the one marked `#[quickdb(id)]`, or a field
/// named `id` when none is marked.
fn find_id_field<'a>(
    input: &DeriveInput,
    fields: &'a [FieldInfo],
) -> Result<&'a FieldInfo, syn::Error> {
    let marked: Vec<&FieldInfo> = fields.iter().filter(|f| f.is_id).collect();

    let field = match marked.as_slice() {
        [field] => *field,
        [] => fields
            .iter()
            .find(|f| f.name == "id" && !f.is_skipped)
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    input,
                    "Document must have a DocumentId field marked with #[quickdb(id)]",
                )
            })?,
        [_, second, ..] => {
            return Err(syn::Error::new_spanned(
                &second.name,
                "only one field may be marked with #[quickdb(id)]",
            ));
        }
    };

    if !is_document_id_type(&field.ty) {
        return Err(syn::Error::new_spanned(
            &field.ty,
            "the id field must have type DocumentId",
        ));
    }

    Ok(field)
}

/// Check if a type is `DocumentId` (by its last path segment).
fn is_document_id_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "DocumentId";
        }
    }
    false
}
