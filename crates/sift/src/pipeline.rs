//! Transformations: map, filter, reduce and their derived forms.

use std::ops::ControlFlow;

use indexmap::IndexMap;

use crate::collection::Collection;
use crate::error::{Result, SiftError};
use crate::key::Key;
use crate::predicate::identical_to;
use crate::value::{list, Map, Value};

impl Collection {
    /// Applies `f` to every entry, keeping keys and order.
    pub fn map<F>(&self, mut f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> Value,
    {
        self.derive(
            self.iter()
                .map(|(k, v)| (k.clone(), f(v, k)))
                .collect(),
        )
    }

    /// Like [`Collection::map`], with array items spread into a slice.
    /// Non-array items arrive as a one-element slice.
    pub fn map_spread<F>(&self, mut f: F) -> Collection
    where
        F: FnMut(&[Value], &Key) -> Value,
    {
        self.map(|v, k| f(&spread(v), k))
    }

    /// Keeps the entries passing the test, keys and order preserved.
    pub fn filter<F>(&self, mut f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        self.derive(
            self.iter()
                .filter(|(k, v)| f(v, k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Keeps the truthy entries.
    pub fn filter_truthy(&self) -> Collection {
        self.filter(|v, _| v.is_truthy())
    }

    /// Drops the entries passing the test.
    pub fn reject<F>(&self, mut f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> bool,
    {
        self.filter(|v, k| !f(v, k))
    }

    /// Drops the entries identical (`===`) to `value`.
    pub fn reject_value(&self, value: impl Into<Value>) -> Collection {
        let identical = identical_to(value.into());
        self.reject(|v, k| identical(v, k))
    }

    /// Left fold. Every entry is visited; there is no short-circuit.
    pub fn reduce<A, F>(&self, mut f: F, initial: A) -> A
    where
        F: FnMut(A, &Value, &Key) -> A,
    {
        self.iter().fold(initial, |acc, (k, v)| f(acc, v, k))
    }

    /// Alias of [`Collection::reduce`].
    pub fn reduce_with_keys<A, F>(&self, f: F, initial: A) -> A
    where
        F: FnMut(A, &Value, &Key) -> A,
    {
        self.reduce(f, initial)
    }

    /// Folds into several accumulators at once.
    ///
    /// The reducer receives the current accumulators plus the entry and must
    /// return an array with one value per accumulator.
    ///
    /// # Errors
    ///
    /// [`SiftError::ReduceShape`] when the reducer returns anything else.
    pub fn reduce_spread<F>(&self, mut f: F, initial: Vec<Value>) -> Result<Vec<Value>>
    where
        F: FnMut(&[Value], &Value, &Key) -> Value,
    {
        let arity = initial.len();
        let mut acc = initial;
        for (k, v) in self.iter() {
            acc = match f(&acc, v, k) {
                Value::Array(m) if m.len() == arity => m.into_values().collect(),
                Value::Array(m) => {
                    return Err(SiftError::ReduceShape {
                        type_name: Collection::TYPE_NAME,
                        found: format!("array({})", m.len()),
                    })
                }
                other => {
                    return Err(SiftError::ReduceShape {
                        type_name: Collection::TYPE_NAME,
                        found: other.debug_type(),
                    })
                }
            };
        }
        Ok(acc)
    }

    /// Runs `f` for every entry until it breaks. Returns the receiver.
    pub fn each<F>(&self, mut f: F) -> &Self
    where
        F: FnMut(&Value, &Key) -> ControlFlow<()>,
    {
        for (k, v) in self.iter() {
            if f(v, k).is_break() {
                break;
            }
        }
        self
    }

    /// Like [`Collection::each`], with array items spread into a slice.
    pub fn each_spread<F>(&self, mut f: F) -> &Self
    where
        F: FnMut(&[Value], &Key) -> ControlFlow<()>,
    {
        self.each(|v, k| f(&spread(v), k))
    }

    /// Runs `f` for its effects and returns the collection.
    pub fn tap<F>(self, f: F) -> Self
    where
        F: FnOnce(&Collection),
    {
        f(&self);
        self
    }

    /// Groups values under the keys the callback returns. Each group is a
    /// collection; insertion order is kept within and across groups.
    pub fn map_to_groups<F>(&self, f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> (Key, Value),
    {
        let groups = self.dictionary(f);
        self.derive(
            groups
                .into_iter()
                .map(|(k, vs)| (k, Value::Collection(self.derive_values(vs))))
                .collect(),
        )
    }

    /// Like [`Collection::map_to_groups`] with plain arrays as groups.
    pub fn map_to_dictionary<F>(&self, f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> (Key, Value),
    {
        let groups = self.dictionary(f);
        self.derive(
            groups
                .into_iter()
                .map(|(k, vs)| (k, Value::Array(list(vs))))
                .collect(),
        )
    }

    /// [`Collection::map_to_groups`] for callbacks that return a
    /// single-entry array `[group_key => value]`.
    ///
    /// # Errors
    ///
    /// [`SiftError::GroupShape`] when a result is not a single-entry array.
    pub fn try_map_to_groups<F>(&self, mut f: F) -> Result<Collection>
    where
        F: FnMut(&Value, &Key) -> Value,
    {
        let pairs = self.pairs(&mut f)?;
        Ok(self.map_to_groups(pair_source(pairs)))
    }

    /// [`Collection::map_to_dictionary`] for callbacks returning
    /// single-entry arrays.
    ///
    /// # Errors
    ///
    /// [`SiftError::GroupShape`] when a result is not a single-entry array.
    pub fn try_map_to_dictionary<F>(&self, mut f: F) -> Result<Collection>
    where
        F: FnMut(&Value, &Key) -> Value,
    {
        let pairs = self.pairs(&mut f)?;
        Ok(self.map_to_dictionary(pair_source(pairs)))
    }

    fn dictionary<F>(&self, mut f: F) -> IndexMap<Key, Vec<Value>>
    where
        F: FnMut(&Value, &Key) -> (Key, Value),
    {
        let mut groups: IndexMap<Key, Vec<Value>> = IndexMap::new();
        for (k, v) in self.iter() {
            let (group, value) = f(v, k);
            groups.entry(group).or_default().push(value);
        }
        groups
    }

    fn pairs<F>(&self, f: &mut F) -> Result<Vec<(Key, Value)>>
    where
        F: FnMut(&Value, &Key) -> Value,
    {
        self.iter().map(|(k, v)| single_pair(f(v, k))).collect()
    }

    /// Maps, then flattens the results one level. Non-array results are
    /// dropped; deeper nesting is kept.
    pub fn flat_map<F>(&self, f: F) -> Collection
    where
        F: FnMut(&Value, &Key) -> Value,
    {
        self.map(f).collapse()
    }

    /// Passes the collection to `f`.
    pub fn pipe<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&Collection) -> R,
    {
        f(self)
    }

    /// Threads the collection through each callable in turn.
    pub fn pipe_through<I>(&self, fns: I) -> Value
    where
        I: IntoIterator<Item = Box<dyn FnOnce(Value) -> Value>>,
    {
        fns.into_iter()
            .fold(Value::Collection(self.clone()), |carry, f| f(carry))
    }

    /// Checks that every item is of one of the allowed types: its debug
    /// type or a type it is an instance of.
    ///
    /// # Errors
    ///
    /// [`SiftError::TypeMismatch`] for the first item that is not.
    pub fn ensure(&self, types: &[&str]) -> Result<&Self> {
        for (k, v) in self.iter() {
            let found = v.debug_type();
            if !types.iter().any(|t| *t == found || v.is_instance_of(t)) {
                return Err(SiftError::TypeMismatch {
                    allowed: types.iter().map(|t| t.to_string()).collect(),
                    found,
                    position: k.clone(),
                });
            }
        }
        Ok(self)
    }
}

fn spread(v: &Value) -> Vec<Value> {
    match v {
        Value::Array(m) => m.values().cloned().collect(),
        Value::Collection(c) => c.all().values().cloned().collect(),
        other => vec![other.clone()],
    }
}

fn single_pair(result: Value) -> Result<(Key, Value)> {
    match result {
        Value::Array(m) if m.len() == 1 => {
            let mut entries: Map = m;
            entries
                .pop()
                .ok_or_else(|| SiftError::GroupShape {
                    found: "array(0)".to_string(),
                })
        }
        Value::Array(m) => Err(SiftError::GroupShape {
            found: format!("array({})", m.len()),
        }),
        other => Err(SiftError::GroupShape {
            found: other.debug_type(),
        }),
    }
}

fn pair_source(pairs: Vec<(Key, Value)>) -> impl FnMut(&Value, &Key) -> (Key, Value) {
    let mut pairs = pairs.into_iter();
    move |_, _| pairs.next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(c: &Collection) -> Vec<i64> {
        c.all().values().filter_map(Value::as_i64).collect()
    }

    #[test]
    fn map_preserves_keys() {
        let c = Collection::from_values(vec![1, 2, 3]).filter(|v, _| v.as_i64() != Some(2));
        let doubled = c.map(|v, _| Value::from(v.as_i64().unwrap_or(0) * 2));
        assert_eq!(ints(&doubled), vec![2, 6]);
        assert_eq!(
            doubled.all().keys().cloned().collect::<Vec<_>>(),
            vec![Key::Int(0), Key::Int(2)]
        );
    }

    #[test]
    fn reject_value_uses_identity() {
        let c = Collection::from_values(vec![Value::from(true), Value::from(1), Value::from("1")]);
        assert_eq!(c.reject_value(true).count(), 2);
        assert_eq!(c.reject_value(1).count(), 2);
    }

    #[test]
    fn reduce_with_null_seed() {
        let c = Collection::from_values(vec![1, 2, 3]);
        let last = c.reduce(|_, v, _| v.clone(), Value::Null);
        assert_eq!(last, Value::from(3));
        let total = c.reduce_with_keys(|acc, v, _| acc + v.as_i64().unwrap_or(0), 0);
        assert_eq!(total, 6);
    }

    #[test]
    fn reduce_spread_folds_multiple_accumulators() {
        let c = Collection::from_values(vec![1, 2, 3]);
        let [sum, count] = c
            .reduce_spread(
                |acc, v, _| {
                    let sum = acc[0].as_i64().unwrap_or(0) + v.as_i64().unwrap_or(0);
                    let count = acc[1].as_i64().unwrap_or(0) + 1;
                    Value::array(vec![sum, count])
                },
                vec![Value::from(0), Value::from(0)],
            )
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(sum, Value::from(6));
        assert_eq!(count, Value::from(3));
    }

    #[test]
    fn reduce_spread_rejects_wrong_shapes() {
        let c = Collection::from_values(vec![1]);
        let err = c
            .reduce_spread(|_, _, _| Value::from(1), vec![Value::Null, Value::Null])
            .unwrap_err();
        assert!(matches!(err, SiftError::ReduceShape { ref found, .. } if found == "int"));

        let err = c
            .reduce_spread(|_, _, _| Value::array(vec![1]), vec![Value::Null, Value::Null])
            .unwrap_err();
        assert!(matches!(err, SiftError::ReduceShape { ref found, .. } if found == "array(1)"));
    }

    #[test]
    fn each_stops_on_break() {
        let c = Collection::times(5);
        let mut seen = Vec::new();
        c.each(|v, _| {
            seen.push(v.clone());
            if v.as_i64() == Some(2) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(seen, vec![Value::from(1), Value::from(2)]);
    }

    #[test]
    fn spread_forms() {
        let c = Collection::from_values(vec![Value::array(vec![1, 2]), Value::array(vec![3, 4])]);
        let sums = c.map_spread(|xs, _| {
            Value::from(xs.iter().filter_map(Value::as_i64).sum::<i64>())
        });
        assert_eq!(ints(&sums), vec![3, 7]);

        let mut firsts = Vec::new();
        c.each_spread(|xs, _| {
            firsts.push(xs[0].clone());
            ControlFlow::Continue(())
        });
        assert_eq!(firsts, vec![Value::from(1), Value::from(3)]);
    }

    #[test]
    fn map_to_groups_appends_in_order() {
        let people = Collection::from_values(vec![
            Value::map([("name", "Ada"), ("dept", "eng")]),
            Value::map([("name", "Grace"), ("dept", "ops")]),
            Value::map([("name", "Linus"), ("dept", "eng")]),
        ]);
        let groups = people.map_to_groups(|v, _| {
            (
                Key::from_value(&v.get_attr("dept").unwrap_or_default()).unwrap_or_default(),
                v.get_attr("name").unwrap_or_default(),
            )
        });
        let eng = groups.get("eng").and_then(Value::as_collection).unwrap();
        assert_eq!(eng.values(), Collection::from_values(vec!["Ada", "Linus"]));
        assert_eq!(groups.count(), 2);

        let dict = people.map_to_dictionary(|v, _| {
            (
                Key::from_value(&v.get_attr("dept").unwrap_or_default()).unwrap_or_default(),
                v.get_attr("name").unwrap_or_default(),
            )
        });
        assert_eq!(dict.get("ops"), Some(&Value::array(vec!["Grace"])));
    }

    #[test]
    fn dynamic_groups_check_pair_shape() {
        let c = Collection::from_values(vec![1, 2, 3]);
        let parity = c
            .try_map_to_groups(|v, _| {
                let key = if v.as_i64().unwrap_or(0) % 2 == 0 { "even" } else { "odd" };
                Value::map([(key, v.clone())])
            })
            .unwrap();
        assert_eq!(parity.count(), 2);

        let err = c.try_map_to_dictionary(|v, _| v.clone()).unwrap_err();
        assert!(matches!(err, SiftError::GroupShape { ref found } if found == "int"));
    }

    #[test]
    fn flat_map_flattens_one_level() {
        let c = Collection::from_values(vec![1, 2]);
        let out = c.flat_map(|v, _| Value::array(vec![v.clone(), Value::array(vec![v.clone()])]));
        assert_eq!(out.count(), 4);
        assert_eq!(out.get(1), Some(&Value::array(vec![1])));
        assert!(c.flat_map(|v, _| v.clone()).is_empty());
    }

    #[test]
    fn pipe_through_folds_left_to_right() {
        let c = Collection::from_values(vec![1, 2, 3]);
        let fns: Vec<Box<dyn FnOnce(Value) -> Value>> = vec![
            Box::new(|v| Value::from(v.as_collection().map(Collection::count).unwrap_or(0))),
            Box::new(|v| Value::from(v.as_i64().unwrap_or(0) * 10)),
        ];
        assert_eq!(c.pipe_through(fns), Value::from(30));
        assert_eq!(c.pipe(|c| c.count()), 3);
    }

    #[test]
    fn ensure_reports_first_mismatch() {
        let c = Collection::from_values(vec![Value::from(1), Value::from(2.5), Value::from("x")]);
        assert!(c.ensure(&["int", "float", "string"]).is_ok());
        let err = c.ensure(&["int", "float"]).unwrap_err();
        match err {
            SiftError::TypeMismatch { found, position, .. } => {
                assert_eq!(found, "string");
                assert_eq!(position, Key::Int(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ensure_accepts_collection_interfaces() {
        let c = Collection::from_values(vec![Value::Collection(Collection::empty())]);
        assert!(c.ensure(&["Enumerable"]).is_ok());
    }
}
