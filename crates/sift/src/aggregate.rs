//! Aggregates and membership tests.
//!
//! Aggregates resolve each item through a [`Retriever`] and ignore `null`
//! results. `sum` and `avg` additionally skip values with no numeric form.

use std::cmp::Ordering;

use crate::collection::Collection;
use crate::compare::{loose_cmp, loose_eq, strict_eq};
use crate::predicate::{Retriever, Where};
use crate::value::{Number, Value};

/// Decimal places beyond which `f64` rounding has no effect.
pub(crate) const MAX_PRECISION: i32 = 15;

impl Collection {
    fn resolved(&self, retriever: &Retriever) -> impl Iterator<Item = Value> + '_ {
        let retriever = retriever.clone();
        self.iter()
            .map(move |(k, v)| retriever.resolve(v, k))
            .filter(|v| !v.is_null())
    }

    fn numbers(&self, retriever: &Retriever) -> Vec<Number> {
        self.resolved(retriever)
            .filter_map(|v| v.to_number())
            .collect()
    }

    /// Sum of the items. `0` when empty.
    pub fn sum(&self) -> Number {
        self.sum_by(Retriever::Identity)
    }

    /// Sum of the resolved values.
    pub fn sum_by(&self, retriever: impl Into<Retriever>) -> Number {
        self.numbers(&retriever.into())
            .into_iter()
            .fold(Number::Int(0), Number::add)
    }

    /// Mean of the non-null items, `None` when there are none.
    pub fn avg(&self) -> Option<Number> {
        self.avg_by(Retriever::Identity)
    }

    /// Mean of the non-null resolved values.
    pub fn avg_by(&self, retriever: impl Into<Retriever>) -> Option<Number> {
        let numbers = self.numbers(&retriever.into());
        if numbers.is_empty() {
            return None;
        }
        let total = numbers.iter().copied().fold(Number::Int(0), Number::add);
        total.div(Number::from(numbers.len()))
    }

    /// Alias of [`Collection::avg`].
    pub fn average(&self) -> Option<Number> {
        self.avg()
    }

    /// Alias of [`Collection::avg_by`].
    pub fn average_by(&self, retriever: impl Into<Retriever>) -> Option<Number> {
        self.avg_by(retriever)
    }

    /// Smallest non-null item under loose comparison.
    pub fn min(&self) -> Option<Value> {
        self.min_by(Retriever::Identity)
    }

    /// Smallest non-null resolved value.
    pub fn min_by(&self, retriever: impl Into<Retriever>) -> Option<Value> {
        self.extreme(&retriever.into(), Ordering::Less)
    }

    /// Largest non-null item under loose comparison.
    pub fn max(&self) -> Option<Value> {
        self.max_by(Retriever::Identity)
    }

    /// Largest non-null resolved value.
    pub fn max_by(&self, retriever: impl Into<Retriever>) -> Option<Value> {
        self.extreme(&retriever.into(), Ordering::Greater)
    }

    fn extreme(&self, retriever: &Retriever, wanted: Ordering) -> Option<Value> {
        self.resolved(retriever).reduce(|best, v| {
            if loose_cmp(&v, &best) == Some(wanted) {
                v
            } else {
                best
            }
        })
    }

    /// Percentage of entries passing the test, rounded half away from zero
    /// to `precision` decimals. `None` when empty.
    ///
    /// `precision` is clamped to `-15..=15`; a negative precision rounds to
    /// tens, hundreds and so on.
    pub fn percentage<F>(&self, f: F, precision: i32) -> Option<f64>
    where
        F: FnMut(&Value, &crate::key::Key) -> bool,
    {
        if self.is_empty() {
            return None;
        }
        let ratio = self.filter(f).count() as f64 / self.count() as f64 * 100.0;
        let scale = 10f64.powi(precision.clamp(-MAX_PRECISION, MAX_PRECISION));
        Some((ratio * scale).round() / scale)
    }

    /// Returns `true` if every entry matches. Vacuously true when empty.
    pub fn every(&self, w: impl Into<Where>) -> bool {
        let predicate = w.into().into_predicate();
        self.iter().all(|(k, v)| predicate(v, k))
    }

    /// Returns `true` if some item loosely equals `value`.
    pub fn contains(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        self.iter().any(|(_, v)| loose_eq(v, &value))
    }

    /// Returns `true` if some item is identical to `value`.
    pub fn contains_strict(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        self.iter().any(|(_, v)| strict_eq(v, &value))
    }

    /// Returns `true` if some entry matches.
    pub fn contains_where(&self, w: impl Into<Where>) -> bool {
        let predicate = w.into().into_predicate();
        self.iter().any(|(k, v)| predicate(v, k))
    }

    /// Alias of [`Collection::contains_where`].
    pub fn some(&self, w: impl Into<Where>) -> bool {
        self.contains_where(w)
    }

    /// Negation of [`Collection::contains`].
    pub fn doesnt_contain(&self, value: impl Into<Value>) -> bool {
        !self.contains(value)
    }

    /// Negation of [`Collection::contains_where`].
    pub fn doesnt_contain_where(&self, w: impl Into<Where>) -> bool {
        !self.contains_where(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums<V: Into<Value>>(items: Vec<V>) -> Collection {
        Collection::from_values(items)
    }

    #[test]
    fn averages_ignore_nulls() {
        assert_eq!(nums(vec![Value::Null, Value::Null]).avg(), None);
        assert_eq!(
            nums(vec![Value::from(2), Value::Null, Value::from(4)]).avg(),
            Some(Number::Int(3))
        );
        assert_eq!(nums(vec![1, 2]).avg(), Some(Number::Float(1.5)));
        assert_eq!(Collection::new().average(), None);
    }

    #[test]
    fn sums_ignore_nulls() {
        assert_eq!(nums(vec![Value::Null, Value::from(5)]).sum(), Number::Int(5));
        assert_eq!(Collection::new().sum(), Number::Int(0));
        assert_eq!(nums(vec![Value::from("2"), Value::from(1.5)]).sum(), Number::Float(3.5));
    }

    #[test]
    fn aggregates_by_path() {
        let c = nums(vec![
            Value::map([("price", 10)]),
            Value::map([("price", 30)]),
            Value::map([("other", 1)]),
        ]);
        assert_eq!(c.sum_by("price"), Number::Int(40));
        assert_eq!(c.avg_by("price"), Some(Number::Int(20)));
        assert_eq!(c.max_by("price"), Some(Value::from(30)));
        assert_eq!(c.min_by("price"), Some(Value::from(10)));
    }

    #[test]
    fn min_and_max_skip_nulls() {
        let c = nums(vec![Value::Null, Value::from(3), Value::from(1), Value::from(2)]);
        assert_eq!(c.min(), Some(Value::from(1)));
        assert_eq!(c.max(), Some(Value::from(3)));
        assert_eq!(Collection::new().max(), None);
    }

    #[test]
    fn percentage_rounds() {
        let c = nums(vec![1, 2, 3, 4]);
        assert_eq!(c.percentage(|v, _| v.as_i64() > Some(2), 2), Some(50.0));
        let thirds = nums(vec![1, 2, 3]);
        assert_eq!(thirds.percentage(|v, _| v.as_i64() == Some(1), 2), Some(33.33));
        assert_eq!(thirds.percentage(|v, _| v.as_i64() == Some(1), 0), Some(33.0));
        assert_eq!(Collection::new().percentage(|_, _| true, 2), None);
    }

    #[test]
    fn percentage_clamps_precision() {
        let thirds = Collection::from_values(vec![1, 2, 3]);
        let huge = thirds.percentage(|v, _| v.as_i64() == Some(1), i32::MAX).unwrap_or(f64::NAN);
        assert!(huge.is_finite());
        assert!((huge - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(thirds.percentage(|v, _| v.as_i64() == Some(1), -1), Some(30.0));
        assert_eq!(thirds.percentage(|v, _| v.as_i64() == Some(1), i32::MIN), Some(0.0));
    }

    #[test]
    fn every_is_vacuously_true() {
        assert!(Collection::new().every(Where::callback(|_, _| false)));
        assert!(nums(vec![2, 4]).every(Where::callback(|v, _| v.as_i64().unwrap_or(1) % 2 == 0)));
        assert!(!nums(vec![2, 3]).every(("", ">", 2)));
    }

    #[test]
    fn membership() {
        let c = nums(vec![Value::from(1), Value::from("2")]);
        assert!(c.contains("1"));
        assert!(c.contains(2));
        assert!(!c.contains_strict(2));
        assert!(c.contains_strict("2"));
        assert!(c.doesnt_contain(3));
        assert!(c.some(Where::callback(|v, _| v.is_string())));
        assert!(c.doesnt_contain_where(("", ">", 5)));
    }
}
