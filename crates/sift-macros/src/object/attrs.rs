//! Attribute parsing for the Object derive macro.
//!
//! The same `#[object(...)]` attribute is used on the struct and on its
//! fields; [`ObjectAttr`] parses either and the derive checks placement.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Expr, ExprLit, Lit, LitStr, Meta, Result, Token,
};

/// Attributes from `#[object(...)]`.
#[derive(Debug, Clone)]
pub struct ObjectAttr {
    /// Exclude the field from the properties.
    pub skip: bool,
    /// Custom property name, or custom type name on the struct.
    pub rename: Option<String>,
    /// Declared supertypes (struct only).
    pub extends: Vec<String>,
    /// The span for error reporting.
    pub span: Span,
}

impl Default for ObjectAttr {
    fn default() -> Self {
        ObjectAttr {
            skip: false,
            rename: None,
            extends: Vec::new(),
            span: Span::call_site(),
        }
    }
}

fn string_value(expr: &Expr, what: &str) -> Result<LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.clone()),
        other => Err(Error::new(
            other.span(),
            format!("{} must be a string literal", what),
        )),
    }
}

impl Parse for ObjectAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = ObjectAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) if p.is_ident("skip") => {
                    attr.skip = true;
                    attr.span = p.span();
                }

                // rename = "name" or extends = "A, B"
                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    let s = string_value(&nv.value, "rename")?;
                    if s.value().is_empty() {
                        return Err(Error::new(s.span(), "rename must not be empty"));
                    }
                    attr.rename = Some(s.value());
                    attr.span = s.span();
                }
                Meta::NameValue(nv) if nv.path.is_ident("extends") => {
                    let s = string_value(&nv.value, "extends")?;
                    attr.extends.extend(
                        s.value()
                            .split(',')
                            .map(str::trim)
                            .filter(|t| !t.is_empty())
                            .map(String::from),
                    );
                    attr.span = s.span();
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown object attribute. Expected: skip, rename = \"...\", or extends = \"...\"",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extract and merge every `#[object(...)]` attribute.
pub fn parse_object_attrs(attrs: &[Attribute]) -> Result<ObjectAttr> {
    let mut merged = ObjectAttr::default();
    for attr in attrs {
        if attr.path().is_ident("object") {
            let parsed = attr.parse_args::<ObjectAttr>()?;
            merged.skip |= parsed.skip;
            if parsed.rename.is_some() {
                merged.rename = parsed.rename;
            }
            merged.extends.extend(parsed.extends);
            merged.span = parsed.span;
        }
    }
    Ok(merged)
}
