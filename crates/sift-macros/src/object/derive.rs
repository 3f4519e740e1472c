//! Implementation of the `#[derive(Object)]` macro.
//!
//! This macro generates an implementation of the `Object` trait and
//! property name constants for type-safe `where` clauses.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::parse_object_attrs;

/// Main implementation of the Object derive macro.
pub fn object_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let struct_attrs = parse_object_attrs(&input.attrs)?;
    if struct_attrs.skip {
        return Err(Error::new(
            struct_attrs.span,
            "skip is only valid on fields",
        ));
    }
    let type_name = struct_attrs
        .rename
        .unwrap_or_else(|| struct_name.to_string());
    let ancestors = &struct_attrs.extends;

    // Ensure we have a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Object can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Object can only be derived for structs",
            ))
        }
    };

    let mut property_matches: Vec<TokenStream> = Vec::new();
    let mut property_inserts: Vec<TokenStream> = Vec::new();
    let mut property_constants: Vec<TokenStream> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_object_attrs(&field.attrs)?;
        if !attrs.extends.is_empty() {
            return Err(Error::new(attrs.span, "extends is only valid on the struct"));
        }
        if attrs.skip {
            continue;
        }

        let property_name = attrs.rename.unwrap_or_else(|| field_name.to_string());
        let const_name = format_ident!("{}", to_screaming_snake_case(&property_name));

        property_constants.push(quote! {
            /// Property name constant for `where` clauses.
            pub const #const_name: &'static str = #property_name;
        });

        let value_expr = quote! {
            ::sift::Value::from(::core::clone::Clone::clone(&self.#field_name))
        };

        property_matches.push(quote! {
            #property_name => ::core::option::Option::Some(#value_expr),
        });
        property_inserts.push(quote! {
            map.insert(::sift::Key::from(#property_name), #value_expr);
        });
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#property_constants)*
        }

        impl #impl_generics ::sift::Object for #struct_name #ty_generics #where_clause {
            fn type_name(&self) -> &str {
                #type_name
            }

            fn ancestors(&self) -> &[&'static str] {
                &[#(#ancestors),*]
            }

            fn property(&self, name: &str) -> ::core::option::Option<::sift::Value> {
                match name {
                    #(#property_matches)*
                    _ => ::core::option::Option::None,
                }
            }

            fn properties(&self) -> ::sift::Map {
                let mut map = ::sift::Map::new();
                #(#property_inserts)*
                map
            }
        }
    };

    Ok(expanded)
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == '.' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("name"), "NAME");
        assert_eq!(to_screaming_snake_case("created_at"), "CREATED_AT");
        assert_eq!(to_screaming_snake_case("createdAt"), "CREATED_AT");
        assert_eq!(to_screaming_snake_case("owner.name"), "OWNER_NAME");
    }

    #[test]
    fn test_rejects_tuple_structs() {
        let input: DeriveInput = syn::parse_quote! {
            struct Pair(i64, i64);
        };
        let err = object_derive_impl(input).unwrap_err();
        assert!(err.to_string().contains("named fields"));
    }

    #[test]
    fn test_rejects_struct_level_skip() {
        let input: DeriveInput = syn::parse_quote! {
            #[object(skip)]
            struct Task { name: String }
        };
        assert!(object_derive_impl(input).is_err());
    }

    #[test]
    fn test_rejects_field_level_extends() {
        let input: DeriveInput = syn::parse_quote! {
            struct Task {
                #[object(extends = "Model")]
                name: String,
            }
        };
        let err = object_derive_impl(input).unwrap_err();
        assert!(err.to_string().contains("only valid on the struct"));
    }

    #[test]
    fn test_generates_constants_and_impl() {
        let input: DeriveInput = syn::parse_quote! {
            #[object(rename = "Job")]
            struct Task {
                name: String,
                #[object(rename = "level")]
                priority: i64,
                #[object(skip)]
                cache: Vec<u8>,
            }
        };
        let tokens = object_derive_impl(input).unwrap().to_string();
        assert!(tokens.contains("pub const NAME"));
        assert!(tokens.contains("pub const LEVEL"));
        assert!(!tokens.contains("CACHE"));
        assert!(tokens.contains("\"Job\""));
    }
}
