//! Predicates for `where`-style filtering.
//!
//! A [`Clause`] is a single `(key, operator, value)` test: the key is a
//! dotted path resolved on each item, the operator decides how the
//! resolved value is compared with the clause value.
//!
//! [`Where`] is the argument accepted by every predicate-taking operation.
//! It is either a callback or one of the clause shapes, and converts from
//! plain tuples:
//!
//! ```
//! use sift::{Collection, Value};
//!
//! let people = Collection::from_values(vec![
//!     Value::map([("name", Value::from("Ada")), ("age", Value::from(36))]),
//!     Value::map([("name", Value::from("Linus")), ("age", Value::from(21))]),
//! ]);
//!
//! assert_eq!(people.filter_where(("age", ">", 30)).count(), 1);
//! assert_eq!(people.filter_where(("name", "Linus")).count(), 1);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::access::data_get;
use crate::compare::strict_eq;
use crate::key::Key;
use crate::op::Operator;
use crate::value::Value;

/// A shared predicate over `(value, key)`.
pub type Predicate = Rc<dyn Fn(&Value, &Key) -> bool>;

/// A single comparison against a nested value of each item.
#[derive(Debug, Clone)]
pub struct Clause {
    /// Dotted path resolved on each item.
    pub key: String,
    /// The comparison operator.
    pub op: Operator,
    /// The value to compare against.
    pub value: Value,
}

impl Clause {
    /// Creates a new clause.
    pub fn new(key: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Clause {
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluates this clause against an item.
    ///
    /// Both sides are normalised through [`Value::enum_value`]. When fewer
    /// than two sides are string-like and exactly one side is an object,
    /// the sides are never equal: only the not-equal family holds.
    pub fn matches(&self, item: &Value) -> bool {
        let retrieved = data_get(item, &self.key).enum_value();
        let value = self.value.enum_value();

        let sides = [&retrieved, &value];
        let strings = sides.iter().filter(|v| v.is_string_like()).count();
        let objects = sides.iter().filter(|v| v.is_object()).count();
        if strings < 2 && objects == 1 {
            return self.op.is_negation();
        }

        self.op.eval(&retrieved, &value)
    }

    /// Converts the clause into a shared predicate.
    pub fn into_predicate(self) -> Predicate {
        Rc::new(move |item, _| self.matches(item))
    }
}

/// Argument of `filter_where`, `every`, `partition` and friends.
#[derive(Clone)]
pub enum Where {
    /// A callback over `(value, key)`.
    Callback(Predicate),
    /// The value at the path must loosely equal `true`.
    Key(String),
    /// The value at the path must loosely equal the given value.
    Eq(String, Value),
    /// The value at the path is compared with the given operator.
    Compare(String, Operator, Value),
}

impl Where {
    /// A callback predicate.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Value, &Key) -> bool + 'static,
    {
        Where::Callback(Rc::new(f))
    }

    /// Path must be truthy (loosely equal to `true`).
    pub fn key(key: impl Into<String>) -> Self {
        Where::Key(key.into())
    }

    /// Path must loosely equal `value`.
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Where::Eq(key.into(), value.into())
    }

    /// Path compared with `value` through `op`.
    pub fn compare(key: impl Into<String>, op: impl Into<Operator>, value: impl Into<Value>) -> Self {
        Where::Compare(key.into(), op.into(), value.into())
    }

    /// Builds the predicate this argument describes.
    pub fn into_predicate(self) -> Predicate {
        match self {
            Where::Callback(f) => f,
            Where::Key(key) => Clause::new(key, Operator::Eq, true).into_predicate(),
            Where::Eq(key, value) => Clause::new(key, Operator::Eq, value).into_predicate(),
            Where::Compare(key, op, value) => Clause::new(key, op, value).into_predicate(),
        }
    }
}

impl fmt::Debug for Where {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Where::Callback(_) => f.write_str("Where::Callback(..)"),
            Where::Key(k) => f.debug_tuple("Where::Key").field(k).finish(),
            Where::Eq(k, v) => f.debug_tuple("Where::Eq").field(k).field(v).finish(),
            Where::Compare(k, op, v) => f
                .debug_tuple("Where::Compare")
                .field(k)
                .field(op)
                .field(v)
                .finish(),
        }
    }
}

impl From<&str> for Where {
    fn from(key: &str) -> Self {
        Where::Key(key.to_string())
    }
}

impl From<String> for Where {
    fn from(key: String) -> Self {
        Where::Key(key)
    }
}

impl From<Clause> for Where {
    fn from(clause: Clause) -> Self {
        Where::Compare(clause.key, clause.op, clause.value)
    }
}

impl<V: Into<Value>> From<(&str, V)> for Where {
    fn from((key, value): (&str, V)) -> Self {
        Where::eq(key, value)
    }
}

impl<V: Into<Value>> From<(&str, &str, V)> for Where {
    fn from((key, op, value): (&str, &str, V)) -> Self {
        Where::compare(key, Operator::parse(op), value)
    }
}

impl<V: Into<Value>> From<(&str, Operator, V)> for Where {
    fn from((key, op, value): (&str, Operator, V)) -> Self {
        Where::compare(key, op, value)
    }
}

/// Resolves the value an aggregate or grouping operation works on.
#[derive(Clone, Default)]
pub enum Retriever {
    /// The item itself.
    #[default]
    Identity,
    /// The value at a dotted path.
    Path(String),
    /// A callback over `(value, key)`.
    Callback(Rc<dyn Fn(&Value, &Key) -> Value>),
}

impl Retriever {
    /// A callback retriever.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Value, &Key) -> Value + 'static,
    {
        Retriever::Callback(Rc::new(f))
    }

    /// Resolves the retrieved value for an item.
    pub fn resolve(&self, item: &Value, key: &Key) -> Value {
        match self {
            Retriever::Identity => item.clone(),
            Retriever::Path(path) => data_get(item, path),
            Retriever::Callback(f) => f(item, key),
        }
    }
}

impl fmt::Debug for Retriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retriever::Identity => f.write_str("Retriever::Identity"),
            Retriever::Path(p) => f.debug_tuple("Retriever::Path").field(p).finish(),
            Retriever::Callback(_) => f.write_str("Retriever::Callback(..)"),
        }
    }
}

impl From<&str> for Retriever {
    fn from(path: &str) -> Self {
        Retriever::Path(path.to_string())
    }
}

impl From<String> for Retriever {
    fn from(path: String) -> Self {
        Retriever::Path(path)
    }
}

/// A predicate that holds for items identical to `value`.
pub(crate) fn identical_to(value: Value) -> impl Fn(&Value, &Key) -> bool {
    move |item, _| strict_eq(item, &value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::value::{Backing, EnumCase};

    fn row(age: i64) -> Value {
        Value::map([("age", age)])
    }

    fn check(w: impl Into<Where>, item: &Value) -> bool {
        (w.into().into_predicate())(item, &Key::Int(0))
    }

    #[test]
    fn key_only_tests_truthiness() {
        let item = Value::map([("active", Value::from(1)), ("deleted", Value::from(0))]);
        assert!(check("active", &item));
        assert!(!check("deleted", &item));
        assert!(!check("missing", &item));
    }

    #[test]
    fn two_part_form_is_loose_equality() {
        assert!(check(("age", "36"), &row(36)));
        assert!(!check(("age", 35), &row(36)));
    }

    #[test]
    fn ordered_operators() {
        assert!(check(("age", ">", 30), &row(36)));
        assert!(check(("age", "<=", 36), &row(36)));
        assert!(!check(("age", "<", 36), &row(36)));
        assert!(check(("age", "===", 36), &row(36)));
        assert!(!check(("age", "===", "36"), &row(36)));
    }

    #[test]
    fn unknown_operator_behaves_as_equality() {
        assert!(check(("age", "like", 36), &row(36)));
        assert!(!check(("age", "like", 35), &row(36)));
    }

    #[test]
    fn object_against_scalar_only_matches_negations() {
        let item = Value::map([("inner", Value::Collection(Collection::empty()))]);
        assert!(!check(("inner", "=", 1), &item));
        assert!(check(("inner", "!=", 1), &item));
        assert!(check(("inner", "!==", 1), &item));
        assert!(!check(("inner", "<=>", 1), &item));
    }

    #[test]
    fn enums_compare_by_backing_value() {
        let item = Value::map([(
            "suit",
            Value::Enum(EnumCase::backed("Suit", "Hearts", Backing::Str("H".into()))),
        )]);
        assert!(check(("suit", "H"), &item));
        let spade = Value::Enum(EnumCase::backed("Suit", "Spades", Backing::Str("S".into())));
        assert!(check(("suit", "!=", spade), &item));
    }

    #[test]
    fn retriever_resolution() {
        let item = Value::map([("a", Value::map([("b", 2)]))]);
        assert_eq!(Retriever::Identity.resolve(&item, &Key::Int(0)), item);
        assert_eq!(Retriever::from("a.b").resolve(&item, &Key::Int(0)), Value::from(2));
        let by_key = Retriever::callback(|_, k| k.to_value());
        assert_eq!(by_key.resolve(&item, &Key::from("x")), Value::from("x"));
    }
}
