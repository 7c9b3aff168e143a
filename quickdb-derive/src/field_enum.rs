//! Implementation of the `#[derive(FieldEnum)]` macro.

use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Expr, ExprLit, ExprUnary, Fields, Lit, Path, Token, UnOp};

/// Integer reprs whose discriminants may not fit in an `i32`.
const WIDE_REPRS: &[&str] = &["i64", "u32", "u64", "i128", "u128", "isize", "usize"];

/// Parse and generate code for the `#[derive(FieldEnum)]` macro.
pub fn derive_field_enum_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    let data = match &input.data {
        Data::Enum(data) => data,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "FieldEnum derive only supports enums",
            ));
        }
    };

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "FieldEnum derive does not support generic enums",
        ));
    }

    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "FieldEnum derive needs at least one variant",
        ));
    }

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "FieldEnum variants cannot carry data",
            ));
        }
    }

    check_repr(input)?;

    for variant in &data.variants {
        if let Some((_, expr)) = &variant.discriminant {
            check_discriminant(expr)?;
        }
    }

    let variants: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();

    Ok(quote! {
        impl ::quickdb::ToValue for #name {
            fn to_value(&self) -> ::quickdb::FieldValue {
                let discriminant = match self {
                    #(Self::#variants => Self::#variants as i32,)*
                };
                ::quickdb::FieldValue::Int32(discriminant)
            }
        }

        impl ::quickdb::FromValue for #name {
            fn try_from_value(value: &::quickdb::FieldValue) -> ::std::option::Option<Self> {
                match value {
                    ::quickdb::FieldValue::Int32(n) => {
                        #(
                            if *n == Self::#variants as i32 {
                                return ::std::option::Option::Some(Self::#variants);
                            }
                        )*
                        ::std::option::Option::None
                    }
                    _ => ::std::option::Option::None,
                }
            }

            fn zero() -> Self {
                <Self as ::std::default::Default>::default()
            }
        }
    })
}

/// Reject a `#[repr(..)]` wider than `i32`.
fn check_repr(input: &DeriveInput) -> Result<(), syn::Error> {
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("repr")) {
        // Malformed reprs are reported by the compiler itself.
        let Ok(paths) = attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)
        else {
            continue;
        };
        for path in paths {
            if WIDE_REPRS.iter().any(|wide| path.is_ident(wide)) {
                return Err(syn::Error::new_spanned(
                    attr,
                    "FieldEnum discriminants must fit in i32; use a repr of i32 or narrower",
                ));
            }
        }
    }
    Ok(())
}

/// Reject an integer literal discriminant outside the `i32` range.
fn check_discriminant(expr: &Expr) -> Result<(), syn::Error> {
    let value = match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(int), ..
        }) => int.base10_parse::<i128>()?,
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr: inner,
            ..
        }) => match inner.as_ref() {
            Expr::Lit(ExprLit {
                lit: Lit::Int(int), ..
            }) => -int.base10_parse::<i128>()?,
            _ => return Ok(()),
        },
        _ => return Ok(()),
    };

    if i32::try_from(value).is_err() {
        return Err(syn::Error::new_spanned(
            expr,
            "FieldEnum discriminants must fit in i32",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_derive_unit_enum() {
        let input: DeriveInput = parse_quote! {
            enum Status {
                Pending,
                Shipped = 5,
                Delivered,
            }
        };

        let result = derive_field_enum_impl(&input);
        assert!(result.is_ok(), "Failed: {:?}", result.err());

        let code = result.unwrap().to_string();
        assert!(code.contains(":: quickdb :: ToValue for Status"));
        assert!(code.contains(":: quickdb :: FromValue for Status"));
        assert!(code.contains("Self :: Shipped as i32"));
        assert!(code.contains("Int32"));
    }

    #[test]
    fn test_data_carrying_variant_is_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Shape {
                Point,
                Circle(f64),
            }
        };

        let err = derive_field_enum_impl(&input).unwrap_err();
        assert!(err.to_string().contains("cannot carry data"));
    }

    #[test]
    fn test_struct_is_rejected() {
        let input: DeriveInput = parse_quote! {
            struct NotAnEnum {
                x: i32,
            }
        };

        assert!(derive_field_enum_impl(&input).is_err());
    }

    #[test]
    fn test_empty_enum_is_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Never {}
        };

        assert!(derive_field_enum_impl(&input).is_err());
    }

    #[test]
    fn test_wide_repr_is_rejected() {
        let input: DeriveInput = parse_quote! {
            #[repr(i64)]
            enum Big {
                Small,
                Huge = 4_294_967_296,
            }
        };

        let err = derive_field_enum_impl(&input).unwrap_err();
        assert!(err.to_string().contains("must fit in i32"));

        let input: DeriveInput = parse_quote! {
            #[repr(C, u64)]
            enum AlsoBig {
                A,
            }
        };
        assert!(derive_field_enum_impl(&input).is_err());
    }

    #[test]
    fn test_out_of_range_discriminant_is_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Counter {
                Low = -2147483648,
                High = 2147483648,
            }
        };

        let err = derive_field_enum_impl(&input).unwrap_err();
        assert!(err.to_string().contains("must fit in i32"));
    }

    #[test]
    fn test_narrow_repr_is_accepted() {
        let input: DeriveInput = parse_quote! {
            #[repr(u8)]
            enum Level {
                Low = 1,
                High = 255,
            }
        };

        assert!(derive_field_enum_impl(&input).is_ok());

        let input: DeriveInput = parse_quote! {
            #[repr(i32)]
            enum Edge {
                Min = -2147483648,
                Max = 2147483647,
            }
        };

        assert!(derive_field_enum_impl(&input).is_ok());
    }
}
