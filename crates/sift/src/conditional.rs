//! Conditional application: `when`, `unless` and their deferred form.
//!
//! The closure forms run a callback when a condition holds and otherwise
//! hand the collection back untouched. The deferred form,
//! [`ConditionalProxy`], lets the condition itself come from the next
//! member access on the target:
//!
//! ```
//! use sift::{Collection, Value};
//!
//! let c = Collection::from_values(vec![1, 2, 3]);
//!
//! // The first call captures the condition, the second is applied only
//! // if that condition was truthy.
//! let out = c
//!     .higher_order_when()
//!     .call("isNotEmpty", &[])
//!     .unwrap();
//! let out = out.call_method("count", &[]).unwrap();
//! assert_eq!(out, Value::from(3));
//! ```

use crate::collection::Collection;
use crate::error::Result;
use crate::object::Object;
use crate::value::Value;

/// Defers a `when`/`unless` decision to the next member access.
///
/// Until a condition is known, a property read or method call on the proxy
/// is evaluated on the target and its truthiness becomes the condition
/// (negated for `unless`). Once known, the next access is forwarded to the
/// target if the condition holds and yields the target itself otherwise.
#[derive(Debug, Clone)]
pub struct ConditionalProxy {
    target: Value,
    condition: Option<bool>,
    negate_on_capture: bool,
}

impl ConditionalProxy {
    /// Type name of the proxy object.
    pub const TYPE_NAME: &'static str = "HigherOrderWhenProxy";

    /// A proxy with no condition yet.
    pub fn new(target: impl Into<Value>) -> Self {
        ConditionalProxy {
            target: target.into(),
            condition: None,
            negate_on_capture: false,
        }
    }

    /// Fixes the condition.
    pub fn with_condition(mut self, condition: bool) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Negates the condition when it is captured from the target.
    pub fn negate_condition_on_capture(mut self) -> Self {
        self.negate_on_capture = true;
        self
    }

    /// The condition, once known.
    pub fn condition(&self) -> Option<bool> {
        self.condition
    }

    /// The wrapped target.
    pub fn target(&self) -> &Value {
        &self.target
    }

    fn capture(&self, found: Value) -> Value {
        let condition = found.is_truthy() != self.negate_on_capture;
        Value::object(self.clone().with_condition(condition))
    }

    /// Reads a property of the target: captures it as the condition, or
    /// forwards the read once the condition is known.
    pub fn get(&self, name: &str) -> Result<Value> {
        match self.condition {
            None => Ok(self.capture(self.target.get_attr(name)?)),
            Some(true) => self.target.get_attr(name),
            Some(false) => Ok(self.target.clone()),
        }
    }

    /// Calls a method of the target: captures its result as the condition,
    /// or forwards the call once the condition is known.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        match self.condition {
            None => Ok(self.capture(self.target.call_method(method, args)?)),
            Some(true) => self.target.call_method(method, args),
            Some(false) => Ok(self.target.clone()),
        }
    }
}

impl Object for ConditionalProxy {
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

impl Collection {
    /// Applies `f` when `value` is truthy. `f` receives the collection and
    /// the condition value.
    pub fn when<V, F>(self, value: V, f: F) -> Collection
    where
        V: Into<Value>,
        F: FnOnce(Collection, &Value) -> Collection,
    {
        let value = value.into();
        if value.is_truthy() {
            f(self, &value)
        } else {
            self
        }
    }

    /// Applies `f` when `value` is truthy and `default` otherwise.
    pub fn when_else<V, F, D>(self, value: V, f: F, default: D) -> Collection
    where
        V: Into<Value>,
        F: FnOnce(Collection, &Value) -> Collection,
        D: FnOnce(Collection, &Value) -> Collection,
    {
        let value = value.into();
        if value.is_truthy() {
            f(self, &value)
        } else {
            default(self, &value)
        }
    }

    /// Applies `f` when `value` is falsy.
    pub fn unless<V, F>(self, value: V, f: F) -> Collection
    where
        V: Into<Value>,
        F: FnOnce(Collection, &Value) -> Collection,
    {
        let value = value.into();
        if value.is_truthy() {
            self
        } else {
            f(self, &value)
        }
    }

    /// Applies `f` when `value` is falsy and `default` otherwise.
    pub fn unless_else<V, F, D>(self, value: V, f: F, default: D) -> Collection
    where
        V: Into<Value>,
        F: FnOnce(Collection, &Value) -> Collection,
        D: FnOnce(Collection, &Value) -> Collection,
    {
        let value = value.into();
        if value.is_truthy() {
            default(self, &value)
        } else {
            f(self, &value)
        }
    }

    pub fn when_empty<F>(self, f: F) -> Collection
    where
        F: FnOnce(Collection) -> Collection,
    {
        let empty = self.is_empty();
        self.when(empty, |c, _| f(c))
    }

    pub fn when_not_empty<F>(self, f: F) -> Collection
    where
        F: FnOnce(Collection) -> Collection,
    {
        let filled = self.is_not_empty();
        self.when(filled, |c, _| f(c))
    }

    pub fn unless_empty<F>(self, f: F) -> Collection
    where
        F: FnOnce(Collection) -> Collection,
    {
        self.when_not_empty(f)
    }

    pub fn unless_not_empty<F>(self, f: F) -> Collection
    where
        F: FnOnce(Collection) -> Collection,
    {
        self.when_empty(f)
    }

    /// A conditional proxy that captures its condition from the next access.
    pub fn higher_order_when(&self) -> ConditionalProxy {
        ConditionalProxy::new(self.clone())
    }

    /// Like [`Collection::higher_order_when`] with the captured condition
    /// negated.
    pub fn higher_order_unless(&self) -> ConditionalProxy {
        ConditionalProxy::new(self.clone()).negate_condition_on_capture()
    }

    /// A conditional proxy with a known condition.
    pub fn when_condition(&self, value: impl Into<Value>) -> ConditionalProxy {
        ConditionalProxy::new(self.clone()).with_condition(value.into().is_truthy())
    }

    /// A conditional proxy with a known, negated condition.
    pub fn unless_condition(&self, value: impl Into<Value>) -> ConditionalProxy {
        ConditionalProxy::new(self.clone()).with_condition(!value.into().is_truthy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(c: Collection, v: i64) -> Collection {
        let mut items = c.all().clone();
        items.insert(items.len().into(), Value::from(v));
        c.derive(items)
    }

    #[test]
    fn when_and_unless() {
        let c = Collection::from_values(vec![1]);
        assert_eq!(c.clone().when(true, |c, _| push(c, 2)).count(), 2);
        assert_eq!(c.clone().when(0, |c, _| push(c, 2)).count(), 1);
        assert_eq!(c.clone().unless(false, |c, _| push(c, 2)).count(), 2);
        assert_eq!(
            c.clone().when_else("", |c, _| push(c, 2), |c, _| c.values().map(|_, _| Value::Null)).first(),
            Some(&Value::Null)
        );
        assert_eq!(c.unless_else(1, |c, _| c, |c, v| push(c, v.as_i64().unwrap_or(0))).count(), 2);
    }

    #[test]
    fn callback_sees_condition_value() {
        let c = Collection::new().when("tag", |c, v| {
            assert_eq!(v, &Value::from("tag"));
            c
        });
        assert!(c.is_empty());
    }

    #[test]
    fn emptiness_conditions() {
        let empty = Collection::new();
        assert_eq!(empty.clone().when_empty(|c| push(c, 1)).count(), 1);
        assert_eq!(empty.clone().when_not_empty(|c| push(c, 1)).count(), 0);
        assert_eq!(empty.clone().unless_not_empty(|c| push(c, 1)).count(), 1);
        assert_eq!(empty.unless_empty(|c| push(c, 1)).count(), 0);
    }

    #[test]
    fn proxy_captures_then_forwards() {
        let c = Collection::from_values(vec![1, 2]);

        let captured = c.higher_order_when().call("isEmpty", &[]).unwrap();
        // `isEmpty` was false, so the next call returns the collection itself.
        let out = captured.call_method("count", &[]).unwrap();
        assert_eq!(out, Value::Collection(c.clone()));

        let captured = c.higher_order_unless().call("isEmpty", &[]).unwrap();
        assert_eq!(captured.call_method("count", &[]).unwrap(), Value::from(2));
    }

    #[test]
    fn proxy_with_known_condition() {
        let c = Collection::from_values(vec![1, 2]);
        assert_eq!(c.when_condition(true).call("count", &[]).unwrap(), Value::from(2));
        assert_eq!(
            c.unless_condition(true).call("count", &[]).unwrap(),
            Value::Collection(c.clone())
        );
        assert_eq!(c.when_condition(false).condition(), Some(false));
        assert_eq!(c.higher_order_when().condition(), None);
    }
}
