//! Loose and strict value comparison.
//!
//! Three comparisons drive every filtering and ordering operation:
//!
//! - [`strict_eq`]: identity. Same kind and same value; `1` and `1.0` differ,
//!   objects and functions compare by pointer.
//! - [`loose_eq`]: equality with coercion. Booleans compare by truthiness,
//!   numeric strings compare as numbers, `null` equals `""`, arrays compare
//!   entry by entry regardless of order.
//! - [`loose_cmp`]: three-way ordering with the same coercions. Returns
//!   `None` when the two values cannot be ordered.
//!
//! Coercion table for [`loose_cmp`] (first matching row wins):
//!
//! | left            | right           | compared as                        |
//! |-----------------|-----------------|------------------------------------|
//! | null            | string          | `""` vs the string                 |
//! | bool or null    | anything        | truthiness                         |
//! | number          | number          | numerically                        |
//! | number          | numeric string  | numerically                        |
//! | number          | other string    | number's text vs the string        |
//! | string          | string          | numerically if both numeric, else bytewise |
//! | array           | array           | by length, then entry by entry     |
//! | array           | anything else   | the array is greater               |
//! | object          | same-type object| by properties                      |
//! | collection      | string          | JSON text vs the string            |
//! | stringable obj  | string          | as strings                         |
//! | object          | scalar          | the object is greater              |

use std::cmp::Ordering;
use std::rc::Rc;

use crate::object::Object;
use crate::value::{Map, Number, Value};

/// Identity comparison.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(Number::Int(x)), Value::Number(Number::Int(y))) => x == y,
        (Value::Number(Number::Float(x)), Value::Number(Number::Float(y))) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => maps_identical(x, y),
        (Value::Collection(x), Value::Collection(y)) => maps_identical(x.all(), y.all()),
        (Value::Enum(x), Value::Enum(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => same_object(x, y),
        (Value::Func(x), Value::Func(y)) => x.ptr_eq(y),
        _ => false,
    }
}

pub(crate) fn maps_identical(a: &Map, b: &Map) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|((ka, va), (kb, vb))| ka == kb && strict_eq(va, vb))
}

fn same_object(a: &Rc<dyn Object>, b: &Rc<dyn Object>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Equality with coercion.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Enum(x), Value::Enum(y)) => x == y,
        (Value::Enum(_), _) | (_, Value::Enum(_)) => false,
        (Value::Func(x), Value::Func(y)) => x.ptr_eq(y),
        (Value::Object(x), Value::Object(y)) => {
            same_object(x, y)
                || (x.type_name() == y.type_name()
                    && maps_loose_eq(&x.properties(), &y.properties()))
        }
        (Value::Collection(x), Value::Collection(y)) => maps_loose_eq(x.all(), y.all()),
        (Value::Array(x), Value::Array(y)) => maps_loose_eq(x, y),
        _ => loose_cmp(a, b) == Some(Ordering::Equal),
    }
}

fn maps_loose_eq(a: &Map, b: &Map) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(k, va)| b.get(k).is_some_and(|vb| loose_eq(va, vb)))
}

/// Three-way comparison with coercion. `None` means the values are not
/// comparable; every ordered operator is then false.
pub fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    use Value::*;

    match (a, b) {
        (Null, String(s)) => Some("".cmp(s.as_str())),
        (String(s), Null) => Some(s.as_str().cmp("")),
        (Null | Bool(_), _) | (_, Null | Bool(_)) => Some(a.is_truthy().cmp(&b.is_truthy())),

        (Number(x), Number(y)) => x.compare(*y),
        (Number(x), String(s)) => match self::Number::parse(s) {
            Some(y) => x.compare(y),
            None => Some(x.to_text().as_str().cmp(s.as_str())),
        },
        (String(s), Number(y)) => match self::Number::parse(s) {
            Some(x) => x.compare(*y),
            None => Some(s.as_str().cmp(y.to_text().as_str())),
        },
        (String(x), String(y)) => compare_strings(x, y),

        (Array(x), Array(y)) => compare_maps(x, y),
        (Collection(x), Collection(y)) => compare_maps(x.all(), y.all()),
        (Array(_), _) => Some(Ordering::Greater),
        (_, Array(_)) => Some(Ordering::Less),

        (Enum(x), Enum(y)) if x == y => Some(Ordering::Equal),
        (Enum(_), _) | (_, Enum(_)) => None,
        (Func(x), Func(y)) if x.ptr_eq(y) => Some(Ordering::Equal),
        (Func(_), _) | (_, Func(_)) => None,

        (Object(x), Object(y)) => {
            if same_object(x, y) {
                Some(Ordering::Equal)
            } else if x.type_name() == y.type_name() {
                compare_maps(&x.properties(), &y.properties())
            } else {
                None
            }
        }
        (Collection(c), String(s)) => c.text().map(|t| t.as_str().cmp(s.as_str())),
        (String(s), Collection(c)) => c.text().map(|t| s.as_str().cmp(t.as_str())),
        (Object(x), String(s)) => match x.to_display() {
            Some(d) => Some(d.as_str().cmp(s.as_str())),
            None => Some(Ordering::Greater),
        },
        (String(s), Object(y)) => match y.to_display() {
            Some(d) => Some(s.as_str().cmp(d.as_str())),
            None => Some(Ordering::Less),
        },
        (Object(_) | Collection(_), _) => Some(Ordering::Greater),
        (_, Object(_) | Collection(_)) => Some(Ordering::Less),
    }
}

fn compare_strings(a: &str, b: &str) -> Option<Ordering> {
    match (Number::parse(a), Number::parse(b)) {
        (Some(x), Some(y)) => x.compare(y),
        _ => Some(a.cmp(b)),
    }
}

fn compare_maps(a: &Map, b: &Map) -> Option<Ordering> {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        other => return Some(other),
    }
    for (k, va) in a {
        let vb = b.get(k)?;
        match loose_cmp(va, vb)? {
            Ordering::Equal => {}
            other => return Some(other),
        }
    }
    Some(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Backing, EnumCase};

    fn v<T: Into<Value>>(x: T) -> Value {
        x.into()
    }

    #[test]
    fn strict_distinguishes_kinds() {
        assert!(strict_eq(&v(1), &v(1)));
        assert!(!strict_eq(&v(1), &v(1.0)));
        assert!(!strict_eq(&v(1), &v("1")));
        assert!(!strict_eq(&Value::Null, &v(false)));
        assert!(!strict_eq(&v(f64::NAN), &v(f64::NAN)));
    }

    #[test]
    fn strict_arrays_respect_order() {
        let a = Value::map([("a", 1), ("b", 2)]);
        let b = Value::map([("b", 2), ("a", 1)]);
        assert!(!strict_eq(&a, &b));
        assert!(loose_eq(&a, &b));
    }

    #[test]
    fn loose_numeric_strings() {
        assert!(loose_eq(&v("1"), &v(1)));
        assert!(loose_eq(&v("1.0"), &v("1")));
        assert!(loose_eq(&v(" 1"), &v(1)));
        assert!(!loose_eq(&v("abc"), &v(0)));
        assert!(loose_eq(&v("1e3"), &v(1000)));
    }

    #[test]
    fn loose_null_and_bool() {
        assert!(loose_eq(&Value::Null, &v("")));
        assert!(!loose_eq(&Value::Null, &v("0")));
        assert!(loose_eq(&Value::Null, &v(0)));
        assert!(loose_eq(&Value::Null, &v(false)));
        assert!(loose_eq(&v(true), &v("yes")));
        assert!(loose_eq(&v(false), &v("0")));
        assert!(loose_eq(&Value::Null, &Value::array(Vec::<Value>::new())));
    }

    #[test]
    fn ordering_coercions() {
        assert_eq!(loose_cmp(&v(2), &v("10")), Some(Ordering::Less));
        assert_eq!(loose_cmp(&v("2"), &v("10")), Some(Ordering::Less));
        assert_eq!(loose_cmp(&v("b"), &v("a")), Some(Ordering::Greater));
        assert_eq!(loose_cmp(&v(5), &v("abc")), Some(Ordering::Less));
        assert_eq!(loose_cmp(&Value::array(vec![1]), &v(100)), Some(Ordering::Greater));
        assert_eq!(
            loose_cmp(&Value::array(vec![1, 2]), &Value::array(vec![5])),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn arrays_with_disjoint_keys_are_uncomparable() {
        let a = Value::map([("a", 1)]);
        let b = Value::map([("b", 1)]);
        assert_eq!(loose_cmp(&a, &b), None);
        assert!(!loose_eq(&a, &b));
    }

    #[test]
    fn enums_compare_by_identity() {
        let a = Value::Enum(EnumCase::backed("Suit", "Hearts", Backing::Str("H".into())));
        let b = Value::Enum(EnumCase::backed("Suit", "Hearts", Backing::Str("H".into())));
        assert!(loose_eq(&a, &b));
        assert!(strict_eq(&a, &b));
        assert!(!loose_eq(&a, &v("H")));
        assert_eq!(loose_cmp(&a, &v(1)), None);
    }

    #[test]
    fn functions_compare_by_pointer() {
        let f = Value::func(|_| Ok(Value::Null));
        let g = Value::func(|_| Ok(Value::Null));
        assert!(strict_eq(&f, &f.clone()));
        assert!(!strict_eq(&f, &g));
        assert!(!loose_eq(&f, &g));
    }
}
