//! The collection type: construction and basic access.
//!
//! Transformations live in [`pipeline`](crate::pipeline), aggregates in
//! [`aggregate`](crate::aggregate), `where`-style queries in
//! [`query`](crate::query) and ordering/windowing in
//! [`ordering`](crate::ordering). Every operation returns a new collection;
//! the receiver is never mutated.

use std::fmt;

use crate::access;
use crate::compare;
use crate::extensions::Extensions;
use crate::json;
use crate::key::Key;
use crate::mixin::{Macroable, MixinRegistry};
use crate::predicate::Where;
use crate::value::{list, Map, Value};

/// An ordered map from [`Key`] to [`Value`].
///
/// # Example
///
/// ```
/// use sift::{Collection, Value};
///
/// let scores = Collection::from_values(vec![3, 9, 4]);
///
/// let high = scores.filter(|v, _| v.as_i64().unwrap_or(0) > 3);
/// assert_eq!(high.keys().all().values().cloned().collect::<Vec<_>>(), vec![Value::from(1), Value::from(2)]);
/// assert_eq!(scores.sum().to_f64(), 16.0);
/// ```
#[derive(Clone)]
pub struct Collection {
    items: Map,
    extensions: Extensions,
    escape_when_casting: bool,
}

impl Collection {
    /// Type name reported by `debug_type` and unknown-operation errors.
    pub const TYPE_NAME: &'static str = "Collection";

    /// Type names a collection is an instance of.
    pub const INTERFACES: &'static [&'static str] = &[
        "Collection",
        "Enumerable",
        "Arrayable",
        "Jsonable",
        "JsonSerializable",
        "Countable",
    ];

    /// Creates an empty collection.
    pub fn new() -> Self {
        Collection::from_map(Map::new())
    }

    /// Creates an empty collection.
    pub fn empty() -> Self {
        Collection::new()
    }

    /// Creates a collection over the given map, keys kept.
    pub fn from_map(items: Map) -> Self {
        Collection {
            items,
            extensions: Extensions::shared(),
            escape_when_casting: false,
        }
    }

    /// Creates a list collection keyed `0..n`.
    pub fn from_values<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Collection::from_map(list(items))
    }

    /// Creates a collection from anything array-like.
    ///
    /// `null` gives an empty collection, arrays and collections contribute
    /// their entries, objects their array form (falling back to their JSON
    /// form, then their properties). Scalars become a one-item list.
    pub fn make(items: impl Into<Value>) -> Self {
        Collection::from_map(arrayable_items(items.into()))
    }

    /// Wraps a value: collections pass through, arrays keep their entries,
    /// `null` is empty and anything else becomes a one-item list.
    pub fn wrap(value: impl Into<Value>) -> Self {
        match value.into() {
            Value::Null => Collection::new(),
            Value::Array(m) => Collection::from_map(m),
            Value::Collection(c) => c,
            other => Collection::from_values([other]),
        }
    }

    /// Returns the entries of a collection as an array value; other values
    /// are returned unchanged.
    pub fn unwrap(value: impl Into<Value>) -> Value {
        match value.into() {
            Value::Collection(c) => Value::Array(c.items),
            other => other,
        }
    }

    /// `1..=n` as a list. Empty when `n < 1`.
    pub fn times(n: i64) -> Self {
        if n < 1 {
            return Collection::new();
        }
        Collection::range(1, n)
    }

    /// The callback applied to `1..=n`. Empty when `n < 1`.
    pub fn times_with<F, V>(n: i64, mut f: F) -> Self
    where
        F: FnMut(i64) -> V,
        V: Into<Value>,
    {
        if n < 1 {
            return Collection::new();
        }
        Collection::from_values((1..=n).map(|i| f(i).into()))
    }

    /// The inclusive integer range `from..=to`, descending when `from > to`.
    pub fn range(from: i64, to: i64) -> Self {
        if from <= to {
            Collection::from_values(from..=to)
        } else {
            Collection::from_values((to..=from).rev())
        }
    }

    /// Attaches explicit registries to this collection and everything
    /// derived from it.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// The registries this collection consults.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Sets whether the string form (`Display`) is HTML-escaped.
    pub fn escape_when_casting_to_string(mut self, escape: bool) -> Self {
        self.escape_when_casting = escape;
        self
    }

    /// Returns `true` if the string form is HTML-escaped.
    pub fn escapes_when_casting(&self) -> bool {
        self.escape_when_casting
    }

    /// A new collection over `items` carrying this collection's registries.
    pub(crate) fn derive(&self, items: Map) -> Self {
        Collection {
            items,
            extensions: self.extensions.clone(),
            escape_when_casting: self.escape_when_casting,
        }
    }

    pub(crate) fn derive_values<I, V>(&self, items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.derive(list(items))
    }

    pub(crate) fn items_mut(&mut self) -> &mut Map {
        &mut self.items
    }

    /// The underlying entries.
    pub fn all(&self) -> &Map {
        &self.items
    }

    /// Consumes the collection, returning its entries.
    pub fn into_map(self) -> Map {
        self.items
    }

    /// Iterates over `(key, value)` pairs in order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.items.iter()
    }

    /// Number of entries.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` if there is at least one entry.
    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// The keys, as a list.
    pub fn keys(&self) -> Collection {
        self.derive_values(self.items.keys().map(Key::to_value))
    }

    /// The values, re-keyed `0..n`.
    pub fn values(&self) -> Collection {
        self.derive_values(self.items.values().cloned())
    }

    /// The value under `key`.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.items.get(&key.into())
    }

    /// Returns `true` if `key` is present.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.items.contains_key(&key.into())
    }

    /// The first value.
    pub fn first(&self) -> Option<&Value> {
        self.items.values().next()
    }

    /// The first value passing the test.
    pub fn first_by<F>(&self, mut f: F) -> Option<&Value>
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        self.items.iter().find(|(k, v)| f(v, k)).map(|(_, v)| v)
    }

    /// The first value matching a `where` argument.
    pub fn first_where(&self, w: impl Into<Where>) -> Option<&Value> {
        let predicate = w.into().into_predicate();
        self.first_by(|v, k| predicate(v, k))
    }

    /// The last value.
    pub fn last(&self) -> Option<&Value> {
        self.items.values().next_back()
    }

    /// The last value passing the test.
    pub fn last_by<F>(&self, mut f: F) -> Option<&Value>
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        self.items.iter().rev().find(|(k, v)| f(v, k)).map(|(_, v)| v)
    }

    /// The last value matching a `where` argument.
    pub fn last_where(&self, w: impl Into<Where>) -> Option<&Value> {
        let predicate = w.into().into_predicate();
        self.last_by(|v, k| predicate(v, k))
    }

    /// The value at `path` in the first item where that path exists, or
    /// `default`.
    pub fn value(&self, path: &str, default: impl Into<Value>) -> Value {
        let default = default.into();
        match self.first_by(|v, _| access::data_has(v, path)) {
            Some(item) => access::data_get_or(item, path, default),
            None => default,
        }
    }

    /// A key-preserving slice.
    ///
    /// A negative `offset` counts from the end. A negative `length` stops
    /// that many entries before the end; `None` runs to the end.
    pub fn slice(&self, offset: i64, length: Option<i64>) -> Collection {
        let len = self.count() as i64;
        let start = if offset < 0 {
            len.saturating_add(offset).max(0)
        } else {
            offset.min(len)
        };
        let end = match length {
            None => len,
            Some(l) if l < 0 => len.saturating_add(l).max(start),
            Some(l) => start.saturating_add(l).min(len),
        };
        self.derive(
            self.items
                .iter()
                .skip(start as usize)
                .take((end - start).max(0) as usize)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// One page of `per_page` entries, pages counted from 1.
    pub fn for_page(&self, page: i64, per_page: i64) -> Collection {
        let offset = page.saturating_sub(1).saturating_mul(per_page).max(0);
        self.slice(offset, Some(per_page))
    }

    /// Flattens nested arrays and collections one level into a list.
    pub fn collapse(&self) -> Collection {
        self.derive(access::collapse(self.items.values().cloned()))
    }

    /// The entries with nested collections and array-capable objects
    /// converted to arrays, recursively.
    pub fn to_array(&self) -> Map {
        self.items
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::Collection(c) => Value::Array(c.to_array()),
                    Value::Object(obj) => obj.to_array().map(Value::Array).unwrap_or_else(|| v.clone()),
                    other => other.clone(),
                };
                (k.clone(), v)
            })
            .collect()
    }
}

/// The entries of an array-like value, see [`Collection::make`].
pub(crate) fn arrayable_items(value: Value) -> Map {
    match value {
        Value::Null => Map::new(),
        Value::Array(m) => m,
        Value::Collection(c) => c.items,
        Value::Object(obj) => {
            if let Some(m) = obj.to_array() {
                m
            } else if let Some(j) = obj.json_serialize() {
                match json::from_serde(j) {
                    Value::Array(m) => m,
                    other => list([other]),
                }
            } else {
                obj.properties()
            }
        }
        other => list([other]),
    }
}

impl Default for Collection {
    fn default() -> Self {
        Collection::new()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        compare::maps_identical(&self.items, &other.items)
    }
}

impl Macroable for Collection {
    fn class_name() -> &'static str {
        Collection::TYPE_NAME
    }

    fn registry(&self) -> &MixinRegistry<Self> {
        self.extensions.macros()
    }
}

impl FromIterator<(Key, Value)> for Collection {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        Collection::from_map(iter.into_iter().collect())
    }
}

impl FromIterator<Value> for Collection {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Collection::from_values(iter)
    }
}

impl IntoIterator for Collection {
    type Item = (Key, Value);
    type IntoIter = indexmap::map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl From<Map> for Collection {
    fn from(items: Map) -> Self {
        Collection::from_map(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(c: &Collection) -> Vec<i64> {
        c.all().values().filter_map(Value::as_i64).collect()
    }

    fn keys(c: &Collection) -> Vec<Key> {
        c.all().keys().cloned().collect()
    }

    #[test]
    fn make_from_various_inputs() {
        assert!(Collection::make(Value::Null).is_empty());
        assert_eq!(Collection::make(5).count(), 1);
        assert_eq!(Collection::make(vec![1, 2, 3]).count(), 3);
        let nested = Collection::from_values(vec![1, 2]);
        assert_eq!(Collection::make(nested.clone()), nested);
    }

    #[test]
    fn wrap_and_unwrap() {
        assert!(Collection::wrap(Value::Null).is_empty());
        assert_eq!(ints(&Collection::wrap(7)), vec![7]);
        let c = Collection::from_values(vec![1, 2]);
        assert_eq!(Collection::wrap(c.clone()), c);
        assert_eq!(Collection::unwrap(c), Value::array(vec![1, 2]));
        assert_eq!(Collection::unwrap("x"), Value::from("x"));
    }

    #[test]
    fn times_and_range() {
        assert_eq!(ints(&Collection::times(3)), vec![1, 2, 3]);
        assert!(Collection::times(0).is_empty());
        assert!(Collection::times(-4).is_empty());
        assert_eq!(ints(&Collection::times_with(3, |i| i * 10)), vec![10, 20, 30]);
        assert_eq!(ints(&Collection::range(3, 1)), vec![3, 2, 1]);
    }

    #[test]
    fn slice_clamps_extreme_bounds() {
        let c = Collection::times(3);
        assert_eq!(ints(&c.slice(1, Some(i64::MAX))), vec![2, 3]);
        assert_eq!(ints(&c.slice(i64::MIN, Some(1))), vec![1]);
        assert_eq!(ints(&c.slice(i64::MAX, None)), Vec::<i64>::new());
        assert!(c.slice(0, Some(i64::MIN)).is_empty());
    }

    #[test]
    fn for_page_clamps_extreme_pages() {
        let c = Collection::times(3);
        assert!(c.for_page(i64::MAX, 10).is_empty());
        assert_eq!(ints(&c.for_page(i64::MIN, 2)), vec![1, 2]);
        assert_eq!(ints(&c.for_page(2, i64::MAX)), Vec::<i64>::new());
        assert_eq!(ints(&c.for_page(2, 2)), vec![3]);
    }

    #[test]
    fn first_and_last() {
        let c = Collection::from_values(vec![1, 2, 3, 4]);
        assert_eq!(c.first(), Some(&Value::from(1)));
        assert_eq!(c.last(), Some(&Value::from(4)));
        assert_eq!(c.first_by(|v, _| v.as_i64() > Some(2)), Some(&Value::from(3)));
        assert_eq!(c.last_by(|v, _| v.as_i64() < Some(3)), Some(&Value::from(2)));
        assert_eq!(Collection::new().first(), None);
    }

    #[test]
    fn slicing_preserves_keys() {
        let c = Collection::from_values(vec![1, 2, 3, 4, 5]);
        let s = c.slice(1, Some(2));
        assert_eq!(ints(&s), vec![2, 3]);
        assert_eq!(keys(&s), vec![Key::Int(1), Key::Int(2)]);
        assert_eq!(ints(&c.slice(-2, None)), vec![4, 5]);
        assert_eq!(ints(&c.slice(1, Some(-1))), vec![2, 3, 4]);
        assert!(c.slice(10, None).is_empty());
    }

    #[test]
    fn pagination() {
        let c = Collection::times(7);
        assert_eq!(ints(&c.for_page(2, 3)), vec![4, 5, 6]);
        assert_eq!(ints(&c.for_page(3, 3)), vec![7]);
        assert_eq!(ints(&c.for_page(0, 3)), vec![1, 2, 3]);
    }

    #[test]
    fn keys_and_values() {
        let c = Collection::from_map(
            [(Key::from("a"), Value::from(1)), (Key::from("b"), Value::from(2))]
                .into_iter()
                .collect(),
        );
        assert_eq!(c.keys().all().values().cloned().collect::<Vec<_>>(), vec![Value::from("a"), Value::from("b")]);
        assert_eq!(keys(&c.values()), vec![Key::Int(0), Key::Int(1)]);
        assert!(c.has("a"));
        assert_eq!(c.get("b"), Some(&Value::from(2)));
    }

    #[test]
    fn value_reads_first_item_with_path() {
        let c = Collection::from_values(vec![
            Value::map([("name", "Ada")]),
            Value::map([("email", "ada@example.com")]),
        ]);
        assert_eq!(c.value("email", Value::Null), Value::from("ada@example.com"));
        assert_eq!(c.value("phone", "none"), Value::from("none"));
    }

    #[test]
    fn collapse_flattens_one_level() {
        let c = Collection::from_values(vec![
            Value::array(vec![1, 2]),
            Value::array(vec![Value::array(vec![3])]),
            Value::from(9),
        ]);
        let flat = c.collapse();
        assert_eq!(flat.count(), 3);
        assert_eq!(flat.get(2), Some(&Value::array(vec![3])));
    }

    #[test]
    fn derived_collections_keep_extensions() {
        let ext = Extensions::new();
        let c = Collection::from_values(vec![1, 2]).with_extensions(ext.clone());
        assert!(c.values().extensions().ptr_eq(&ext));
        assert!(c.slice(0, None).extensions().ptr_eq(&ext));
    }
}
