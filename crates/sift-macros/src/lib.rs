//! Proc macros for Sift.
//!
//! # Available Macros
//!
//! - [`Object`] - Expose a struct's fields as properties of a collection object
//!
//! # Examples
//!
//! For working examples, see `sift/tests/derive_object.rs`.

mod object;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Object` trait for structs stored in sift collections.
///
/// Every named field becomes a readable property, converted with
/// `Value::from` on a clone of the field. Fields whose type has no
/// conversion into `Value` must be skipped.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `skip` | Exclude this field from the properties |
/// | `rename = "..."` | Expose the field under a custom name |
///
/// # Struct Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `rename = "..."` | Report a custom type name |
/// | `extends = "A, B"` | Declare supertypes for `where_instance_of` and `ensure` |
///
/// # Generated Code
///
/// The macro generates:
///
/// 1. Property name constants (e.g., `Task::NAME`, `Task::PRIORITY`)
/// 2. An implementation of `Object` with `type_name`, `ancestors`,
///    `property` and `properties`
///
/// # Example
///
/// ```ignore
/// use sift::{Collection, Value};
/// use sift_macros::Object;
///
/// #[derive(Debug, Object)]
/// #[object(extends = "Model")]
/// struct Task {
///     name: String,
///
///     #[object(rename = "level")]
///     priority: i64,
///
///     #[object(skip)]
///     internal_id: u64,
/// }
///
/// let tasks = Collection::from_values(vec![
///     Value::object(Task { name: "Write docs".into(), priority: 3, internal_id: 1 }),
///     Value::object(Task { name: "Fix bug".into(), priority: 5, internal_id: 2 }),
/// ]);
///
/// let urgent = tasks.filter_where((Task::LEVEL, ">", 4));
/// assert_eq!(urgent.count(), 1);
/// assert_eq!(tasks.where_instance_of(&["Model"]).count(), 2);
/// ```
#[proc_macro_derive(Object, attributes(object))]
pub fn object_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    object::object_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
