//! `where`-style filtering, partitioning and de-duplication.
//!
//! Every method here filters through a predicate built from a [`Where`]
//! argument or from a path plus a set of candidate values. Keys and order
//! of the surviving entries are preserved.

use std::cmp::Ordering;

use crate::access::data_get;
use crate::collection::{arrayable_items, Collection};
use crate::compare::{loose_cmp, loose_eq, strict_eq};
use crate::op::Operator;
use crate::predicate::{Retriever, Where};
use crate::value::Value;

impl Collection {
    // ========================================================================
    // Operator clauses
    // ========================================================================

    /// Keeps the entries matching a `where` argument.
    ///
    /// - a callback is used as is,
    /// - a bare key keeps entries whose value at that path is truthy,
    /// - `(key, value)` compares with loose equality,
    /// - `(key, op, value)` compares with the given operator.
    pub fn filter_where(&self, w: impl Into<Where>) -> Collection {
        let predicate = w.into().into_predicate();
        self.filter(|v, k| predicate(v, k))
    }

    /// Keeps entries whose value at `key` is identical to `value`.
    pub fn where_strict(&self, key: &str, value: impl Into<Value>) -> Collection {
        self.filter_where(Where::compare(key, Operator::Identical, value))
    }

    /// Keeps entries whose value at `key` is `null`. `None` tests the items
    /// themselves.
    pub fn where_null(&self, key: Option<&str>) -> Collection {
        self.where_strict(key.unwrap_or_default(), Value::Null)
    }

    /// Keeps entries whose value at `key` is not `null`. `None` tests the
    /// items themselves.
    pub fn where_not_null(&self, key: Option<&str>) -> Collection {
        self.filter_where(Where::compare(
            key.unwrap_or_default(),
            Operator::NotIdentical,
            Value::Null,
        ))
    }

    // ========================================================================
    // Candidate sets
    // ========================================================================

    /// Keeps entries whose value at `key` loosely equals one of `values`.
    pub fn where_in(&self, key: &str, values: impl Into<Value>) -> Collection {
        let candidates = candidates(values);
        self.filter(|v, _| in_candidates(&data_get(v, key), &candidates, false))
    }

    /// Keeps entries whose value at `key` is identical to one of `values`.
    pub fn where_in_strict(&self, key: &str, values: impl Into<Value>) -> Collection {
        let candidates = candidates(values);
        self.filter(|v, _| in_candidates(&data_get(v, key), &candidates, true))
    }

    /// Drops entries whose value at `key` loosely equals one of `values`.
    pub fn where_not_in(&self, key: &str, values: impl Into<Value>) -> Collection {
        let candidates = candidates(values);
        self.reject(|v, _| in_candidates(&data_get(v, key), &candidates, false))
    }

    /// Drops entries whose value at `key` is identical to one of `values`.
    pub fn where_not_in_strict(&self, key: &str, values: impl Into<Value>) -> Collection {
        let candidates = candidates(values);
        self.reject(|v, _| in_candidates(&data_get(v, key), &candidates, true))
    }

    /// Keeps entries whose value at `key` lies between the first and last
    /// of `values`, inclusive.
    pub fn where_between(&self, key: &str, values: impl Into<Value>) -> Collection {
        let candidates = candidates(values);
        let low = candidates.first().cloned().unwrap_or_default();
        let high = candidates.last().cloned().unwrap_or_default();
        self.filter_where(Where::compare(key, Operator::Gte, low))
            .filter_where(Where::compare(key, Operator::Lte, high))
    }

    /// Keeps entries whose value at `key` lies outside the first and last
    /// of `values`.
    pub fn where_not_between(&self, key: &str, values: impl Into<Value>) -> Collection {
        let candidates = candidates(values);
        let low = candidates.first().cloned().unwrap_or_default();
        let high = candidates.last().cloned().unwrap_or_default();
        self.filter(|v, _| {
            let found = data_get(v, key);
            loose_cmp(&found, &low) == Some(Ordering::Less)
                || loose_cmp(&found, &high) == Some(Ordering::Greater)
        })
    }

    /// Keeps items that are instances of one of the named types.
    pub fn where_instance_of(&self, types: &[&str]) -> Collection {
        self.filter(|v, _| types.iter().any(|t| v.is_instance_of(t)))
    }

    // ========================================================================
    // Partitioning and uniqueness
    // ========================================================================

    /// Splits the entries into those matching and those not, in one pass.
    /// Keys are preserved in both halves.
    pub fn partition(&self, w: impl Into<Where>) -> (Collection, Collection) {
        let predicate = w.into().into_predicate();
        let (passed, failed): (Vec<_>, Vec<_>) = self
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .partition(|(k, v)| predicate(v, k));
        (
            self.derive(passed.into_iter().collect()),
            self.derive(failed.into_iter().collect()),
        )
    }

    /// Drops items loosely equal to an earlier item. First seen wins.
    pub fn unique(&self) -> Collection {
        self.unique_with(Retriever::Identity, false)
    }

    /// Drops items whose resolved value loosely equals an earlier one.
    pub fn unique_by(&self, retriever: impl Into<Retriever>) -> Collection {
        self.unique_with(retriever.into(), false)
    }

    /// Drops items identical to an earlier item.
    pub fn unique_strict(&self) -> Collection {
        self.unique_with(Retriever::Identity, true)
    }

    /// Drops items whose resolved value is identical to an earlier one.
    pub fn unique_strict_by(&self, retriever: impl Into<Retriever>) -> Collection {
        self.unique_with(retriever.into(), true)
    }

    fn unique_with(&self, retriever: Retriever, strict: bool) -> Collection {
        let mut seen: Vec<Value> = Vec::new();
        self.reject(|v, k| {
            let id = retriever.resolve(v, k);
            if in_candidates(&id, &seen, strict) {
                return true;
            }
            seen.push(id);
            false
        })
    }
}

fn candidates(values: impl Into<Value>) -> Vec<Value> {
    arrayable_items(values.into()).into_values().collect()
}

fn in_candidates(needle: &Value, haystack: &[Value], strict: bool) -> bool {
    haystack.iter().any(|candidate| {
        if strict {
            strict_eq(needle, candidate)
        } else {
            loose_eq(needle, candidate)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;

    fn products() -> Collection {
        Collection::from_values(vec![
            Value::map([("name", Value::from("Desk")), ("price", Value::from(200))]),
            Value::map([("name", Value::from("Chair")), ("price", Value::from(100))]),
            Value::map([("name", Value::from("Lamp")), ("price", Value::from("150"))]),
            Value::map([("name", Value::from("Door")), ("price", Value::Null)]),
        ])
    }

    fn names(c: &Collection) -> Vec<String> {
        c.iter()
            .map(|(_, v)| data_get(v, "name").as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn where_with_operators() {
        assert_eq!(names(&products().filter_where(("price", ">", 120))), vec!["Desk", "Lamp"]);
        assert_eq!(names(&products().filter_where(("price", 150))), vec!["Lamp"]);
        assert!(products().where_strict("price", 150).is_empty());
    }

    #[test]
    fn where_keeps_keys_and_order() {
        let c = products().filter_where(("price", "<", 160));
        assert_eq!(
            c.all().keys().cloned().collect::<Vec<_>>(),
            vec![Key::Int(1), Key::Int(2), Key::Int(3)]
        );
    }

    #[test]
    fn null_filters() {
        assert_eq!(names(&products().where_null(Some("price"))), vec!["Door"]);
        assert_eq!(products().where_not_null(Some("price")).count(), 3);
        let raw = Collection::from_values(vec![Value::Null, Value::from(1)]);
        assert_eq!(raw.where_null(None).count(), 1);
    }

    #[test]
    fn membership_filters() {
        assert_eq!(names(&products().where_in("price", vec![100, 150])), vec!["Chair", "Lamp"]);
        assert_eq!(names(&products().where_in_strict("price", vec![100, 150])), vec!["Chair"]);
        assert_eq!(
            names(&products().where_not_in("price", vec![100, 150])),
            vec!["Desk", "Door"]
        );
        assert_eq!(products().where_not_in_strict("price", vec![100, 150]).count(), 3);
    }

    #[test]
    fn between_uses_first_and_last_bounds() {
        assert_eq!(
            names(&products().where_between("price", vec![100, 999, 150])),
            vec!["Chair", "Lamp"]
        );
        assert_eq!(
            names(&products().where_not_between("price", vec![120, 180])),
            vec!["Desk", "Chair", "Door"]
        );
    }

    #[test]
    fn instance_filter() {
        let c = Collection::from_values(vec![
            Value::Collection(Collection::new()),
            Value::from(1),
            Value::func(|_| Ok(Value::Null)),
        ]);
        assert_eq!(c.where_instance_of(&["Enumerable"]).count(), 1);
        assert_eq!(c.where_instance_of(&["Enumerable", "Closure"]).count(), 2);
    }

    #[test]
    fn partition_splits_with_keys() {
        let (even, odd) = Collection::from_values(vec![1, 2, 3, 4])
            .partition(Where::callback(|v, _| v.as_i64().unwrap_or(1) % 2 == 0));
        assert_eq!(even.values(), Collection::from_values(vec![2, 4]));
        assert_eq!(odd.values(), Collection::from_values(vec![1, 3]));
        assert_eq!(
            even.all().keys().cloned().collect::<Vec<_>>(),
            vec![Key::Int(1), Key::Int(3)]
        );
    }

    #[test]
    fn unique_loose_and_strict() {
        let c = Collection::from_values(vec![Value::from(1), Value::from("1"), Value::from(2), Value::from(1)]);
        assert_eq!(c.unique().values(), Collection::from_values(vec![1, 2]));
        assert_eq!(
            c.unique_strict().values(),
            Collection::from_values(vec![Value::from(1), Value::from("1"), Value::from(2)])
        );
        assert_eq!(names(&products().unique_by("name")).len(), 4);
    }
}
