//! Element proxies: apply a collection operation through each element.
//!
//! Reading an allow-listed operation name as a property of a collection
//! yields an [`ElementProxy`]. Reading a property of, or calling a method
//! on, that proxy builds a per-element callback and runs the operation
//! with it:
//!
//! ```
//! use sift::{Collection, Value};
//!
//! let orders = Collection::from_values(vec![
//!     Value::map([("total", 30)]),
//!     Value::map([("total", 12)]),
//! ]);
//!
//! // Same as `orders.sum_by("total")`.
//! let total = orders.get_attr("sum").unwrap().get_attr("total").unwrap();
//! assert_eq!(total, Value::from(42));
//! ```

use crate::collection::Collection;
use crate::error::Result;
use crate::key::Key;
use crate::object::Object;
use crate::value::Value;

/// A pending collection operation, waiting for the element member it
/// should be applied through.
#[derive(Debug, Clone)]
pub struct ElementProxy {
    collection: Collection,
    method: String,
}

impl ElementProxy {
    /// Type name of the proxy object.
    pub const TYPE_NAME: &'static str = "HigherOrderCollectionProxy";

    /// Binds an operation name to a collection. The name is not checked;
    /// use [`Collection::element_proxy`] for the allow-list check.
    pub fn new(collection: Collection, method: impl Into<String>) -> Self {
        ElementProxy {
            collection,
            method: method.into(),
        }
    }

    /// The bound collection.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// The bound operation name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Runs the operation with a callback reading `attr` from each element.
    ///
    /// Arrays and collections are indexed by `attr`; other elements answer
    /// through their own attribute lookup.
    pub fn get(&self, attr: &str) -> Result<Value> {
        let attr = attr.to_string();
        let callback = Value::func(move |args| element_attr(args.first().unwrap_or(&Value::Null), &attr));
        self.collection.call(&self.method, &[callback])
    }

    /// Runs the operation with a callback calling `method` on each element.
    ///
    /// String elements name a type: the call becomes a static call on the
    /// class of that name, resolved through the collection's extensions.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        let extensions = self.collection.extensions().clone();
        let method = method.to_string();
        let args = args.to_vec();
        let callback = Value::func(move |params| match params.first() {
            Some(Value::String(class)) => extensions.call_static(class, &method, &args),
            Some(element) => element.call_method(&method, &args),
            None => Ok(Value::Null),
        });
        self.collection.call(&self.method, &[callback])
    }
}

fn element_attr(element: &Value, attr: &str) -> Result<Value> {
    match element {
        Value::Array(m) => Ok(m.get(&Key::from(attr)).cloned().unwrap_or_default()),
        Value::Collection(c) => Ok(c.get(attr).cloned().unwrap_or_default()),
        other => other.get_attr(attr),
    }
}

impl Object for ElementProxy {
    fn type_name(&self) -> &str {
        Self::TYPE_NAME
    }

    fn get_attr(&self, name: &str) -> Result<Value> {
        self.get(name)
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.call(name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SiftError;
    use crate::extensions::Extensions;

    #[derive(Debug)]
    struct User {
        name: &'static str,
        active: bool,
    }

    impl Object for User {
        fn type_name(&self) -> &str {
            "User"
        }

        fn property(&self, name: &str) -> Option<Value> {
            match name {
                "name" => Some(Value::from(self.name)),
                "active" => Some(Value::from(self.active)),
                _ => None,
            }
        }

        fn call_method(&self, name: &str, _args: &[Value]) -> Result<Value> {
            match name {
                "shout" => Ok(Value::from(self.name.to_uppercase())),
                other => Err(SiftError::unknown_operation("User", other)),
            }
        }
    }

    fn users() -> Collection {
        Collection::from_values(vec![
            Value::object(User { name: "ada", active: true }),
            Value::object(User { name: "bob", active: false }),
        ])
    }

    #[test]
    fn property_access_runs_operation() {
        let active = users().element_proxy("filter").unwrap().get("active").unwrap();
        assert_eq!(active.as_collection().map(Collection::count), Some(1));
    }

    #[test]
    fn method_call_runs_operation() {
        let shouted = users().element_proxy("map").unwrap().call("shout", &[]).unwrap();
        let shouted = shouted.as_collection().cloned().unwrap_or_default();
        assert_eq!(shouted, Collection::from_values(vec!["ADA", "BOB"]));
    }

    #[test]
    fn arrays_are_indexed() {
        let c = Collection::from_values(vec![Value::map([("n", 2)]), Value::map([("n", 5)])]);
        assert_eq!(c.get_attr("max").unwrap().get_attr("n").unwrap(), Value::from(5));
    }

    #[test]
    fn string_elements_become_static_calls() {
        let ext = Extensions::new();
        ext.register_class("Greeter", |method: &str, args: &[Value]| match method {
            "hello" => Ok(Value::from(format!(
                "hello {}",
                args.first().and_then(Value::as_str).unwrap_or_default()
            ))),
            other => Err(SiftError::unknown_operation("Greeter", other)),
        });
        let c = Collection::from_values(vec!["Greeter"]).with_extensions(ext);
        let out = c
            .element_proxy("map")
            .unwrap()
            .call("hello", &[Value::from("you")])
            .unwrap();
        assert_eq!(out.as_collection().and_then(|c| c.first().cloned()), Some(Value::from("hello you")));
    }

    #[test]
    fn element_errors_propagate() {
        let err = users().element_proxy("map").unwrap().call("whisper", &[]).unwrap_err();
        assert!(err.is_unknown_operation("User", "whisper"));
    }

    #[test]
    fn undeclared_operation_fails() {
        let err = users().get_attr("toJson").unwrap_err();
        assert!(matches!(err, SiftError::UndeclaredProxyProperty { ref property } if property == "toJson"));
    }
}
