//! The user object capability.
//!
//! Any type stored in a collection as [`Value::Object`] implements
//! [`Object`]. The trait is usually derived with `#[derive(Object)]` from
//! the `sift-macros` crate, but can also be implemented by hand.
//!
//! # Derive Usage
//!
//! ```ignore
//! use sift::{Collection, Object, Value};
//! use sift_macros::Object;
//!
//! #[derive(Debug, Clone, Object)]
//! struct Task {
//!     name: String,
//!     priority: i64,
//!     #[object(skip)]
//!     cache: Vec<u8>,
//! }
//!
//! let tasks = Collection::from_values(vec![
//!     Value::object(Task { name: "Write docs".into(), priority: 3, cache: vec![] }),
//!     Value::object(Task { name: "Fix bug".into(), priority: 5, cache: vec![] }),
//! ]);
//!
//! let urgent = tasks.filter_where((Task::PRIORITY, ">", 4));
//! ```
//!
//! # Manual Implementation
//!
//! ```
//! use sift::{Map, Object, Value};
//!
//! #[derive(Debug)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl Object for Point {
//!     fn type_name(&self) -> &str {
//!         "Point"
//!     }
//!
//!     fn property(&self, name: &str) -> Option<Value> {
//!         match name {
//!             "x" => Some(self.x.into()),
//!             "y" => Some(self.y.into()),
//!             _ => None,
//!         }
//!     }
//!
//!     fn properties(&self) -> Map {
//!         [("x", self.x), ("y", self.y)]
//!             .into_iter()
//!             .map(|(k, v)| (k.into(), v.into()))
//!             .collect()
//!     }
//! }
//!
//! let p = Value::object(Point { x: 1, y: 2 });
//! assert_eq!(p.get_attr("y").unwrap(), Value::from(2));
//! ```

use std::fmt::Debug;

use crate::error::{Result, SiftError};
use crate::value::{Map, Value};

/// A user type that can live inside a collection.
///
/// Only [`Object::type_name`] is required. The remaining methods default to
/// "no such capability": no properties, no methods, no array, JSON or string
/// form.
pub trait Object: Debug {
    /// The type name used by `ensure`, `where_instance_of` and error messages.
    fn type_name(&self) -> &str;

    /// Supertypes and interfaces this type is an instance of.
    fn ancestors(&self) -> &[&'static str] {
        &[]
    }

    /// Reads a public property.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// All public properties in declaration order.
    fn properties(&self) -> Map {
        Map::new()
    }

    /// Attribute access. Missing properties read as `null`.
    fn get_attr(&self, name: &str) -> Result<Value> {
        Ok(self.property(name).unwrap_or_default())
    }

    /// Method call. The default knows no methods.
    fn call_method(&self, name: &str, _args: &[Value]) -> Result<Value> {
        Err(SiftError::unknown_operation(self.type_name(), name))
    }

    /// Array form, for types that can be viewed as a map.
    fn to_array(&self) -> Option<Map> {
        None
    }

    /// Ready-made JSON form.
    fn json_serialize(&self) -> Option<serde_json::Value> {
        None
    }

    /// JSON text form.
    fn to_json(&self) -> Option<String> {
        None
    }

    /// String form. Objects with a string form compare as strings against
    /// string operands.
    fn to_display(&self) -> Option<String> {
        None
    }
}
