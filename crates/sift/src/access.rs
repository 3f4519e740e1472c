//! Nested value access by dotted path.
//!
//! Paths are dot separated (`user.address.city`). Bracketed segments are
//! accepted as an alternative spelling (`rows[0].name` is `rows.0.name`).
//! Two segments are special:
//!
//! - `*` collects the rest of the path across every entry of the current
//!   level. A second `*` further down collapses the nested results one level.
//! - `{first}` / `{last}` select the first or last entry of the current level.
//!
//! Arrays and collections are indexed by key; objects answer through
//! [`Object::property`](crate::Object::property).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::key::Key;
use crate::value::{list, Map, Value};

static BRACKETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]").expect("bracket pattern is valid"));

/// Splits a path into its segments.
pub fn segments(path: &str) -> Vec<String> {
    BRACKETS
        .replace_all(path, ".$1")
        .split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads the value at `path`, or `null` when the path does not resolve.
///
/// An empty path returns the target itself.
pub fn data_get(target: &Value, path: &str) -> Value {
    data_get_or(target, path, Value::Null)
}

/// Reads the value at `path`, or `default` when the path does not resolve.
///
/// # Example
///
/// ```
/// use sift::{data_get_or, Value};
///
/// let user = Value::map([("name", Value::from("Ada")), ("tags", Value::array(vec!["x", "y"]))]);
///
/// assert_eq!(data_get_or(&user, "tags[1]", Value::Null), Value::from("y"));
/// assert_eq!(data_get_or(&user, "email", Value::from("n/a")), Value::from("n/a"));
/// ```
pub fn data_get_or(target: &Value, path: &str, default: Value) -> Value {
    lookup(target, &segments(path)).unwrap_or(default)
}

/// Returns `true` if `path` resolves on the target, even to `null`.
pub fn data_has(target: &Value, path: &str) -> bool {
    let segments = segments(path);
    !segments.is_empty() && lookup(target, &segments).is_some()
}

/// Writes `value` at `path`, creating intermediate arrays as needed.
///
/// With `overwrite == false` existing entries are left alone. A `*`
/// segment writes into every entry of that level. Shared objects cannot be
/// written through and are left unchanged; any other scalar met along the
/// path is replaced by an array.
pub fn data_set(target: &mut Value, path: &str, value: Value, overwrite: bool) {
    set_segments(target, &segments(path), value, overwrite);
}

fn lookup(target: &Value, segments: &[String]) -> Option<Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(target.clone());
    };

    match segment.as_str() {
        "*" => {
            let items = entries(target)?;
            let found: Vec<Value> = items
                .values()
                .map(|item| lookup(item, rest).unwrap_or_default())
                .collect();
            if rest.iter().any(|s| s == "*") {
                Some(Value::Array(collapse(found)))
            } else {
                Some(Value::array(found))
            }
        }
        "{first}" => lookup(entries(target)?.values().next()?, rest),
        "{last}" => lookup(entries(target)?.values().last()?, rest),
        name => lookup(&child(target, name)?, rest),
    }
}

fn entries(target: &Value) -> Option<&Map> {
    match target {
        Value::Array(m) => Some(m),
        Value::Collection(c) => Some(c.all()),
        _ => None,
    }
}

fn child(target: &Value, name: &str) -> Option<Value> {
    match target {
        Value::Array(m) => m.get(&Key::from(name)).cloned(),
        Value::Collection(c) => c.all().get(&Key::from(name)).cloned(),
        Value::Object(obj) => obj.property(name),
        _ => None,
    }
}

/// Flattens one level: nested arrays and collections contribute their
/// values, anything else is dropped.
pub(crate) fn collapse<I: IntoIterator<Item = Value>>(items: I) -> Map {
    let mut out = Vec::new();
    for item in items {
        match item {
            Value::Array(m) => out.extend(m.into_values()),
            Value::Collection(c) => out.extend(c.into_map().into_values()),
            _ => {}
        }
    }
    list(out)
}

fn set_segments(target: &mut Value, segments: &[String], value: Value, overwrite: bool) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    if matches!(target, Value::Object(_)) {
        return;
    }
    if !target.is_sequence_like() {
        *target = Value::Array(Map::new());
    }
    let map = match target {
        Value::Array(m) => m,
        Value::Collection(c) => c.items_mut(),
        _ => return,
    };

    if segment == "*" {
        for inner in map.values_mut() {
            if rest.is_empty() {
                if overwrite {
                    *inner = value.clone();
                }
            } else {
                set_segments(inner, rest, value.clone(), overwrite);
            }
        }
        return;
    }

    let key = Key::from(segment.as_str());
    if rest.is_empty() {
        if overwrite || !map.contains_key(&key) {
            map.insert(key, value);
        }
    } else {
        let inner = map.entry(key).or_insert_with(|| Value::Array(Map::new()));
        set_segments(inner, rest, value, overwrite);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Value {
        Value::array(vec![
            Value::map([("name", Value::from("Ada")), ("tags", Value::array(vec!["a", "b"]))]),
            Value::map([("name", Value::from("Linus")), ("tags", Value::array(vec!["c"]))]),
        ])
    }

    #[test]
    fn bracket_segments_normalise() {
        assert_eq!(segments("rows[0].name"), vec!["rows", "0", "name"]);
        assert_eq!(segments("a.b.c"), vec!["a", "b", "c"]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn nested_reads() {
        let data = Value::map([("user", Value::map([("name", "Ada")]))]);
        assert_eq!(data_get(&data, "user.name"), Value::from("Ada"));
        assert_eq!(data_get(&data, "user.email"), Value::Null);
        assert_eq!(data_get(&data, ""), data);
    }

    #[test]
    fn wildcard_collects_one_level() {
        assert_eq!(
            data_get(&users(), "*.name"),
            Value::array(vec!["Ada", "Linus"])
        );
    }

    #[test]
    fn nested_wildcards_collapse() {
        assert_eq!(
            data_get(&users(), "*.tags.*"),
            Value::array(vec!["a", "b", "c"])
        );
    }

    #[test]
    fn first_and_last_segments() {
        assert_eq!(data_get(&users(), "{first}.name"), Value::from("Ada"));
        assert_eq!(data_get(&users(), "{last}.name"), Value::from("Linus"));
    }

    #[test]
    fn has_sees_present_nulls() {
        let data = Value::map([("a", Value::Null)]);
        assert!(data_has(&data, "a"));
        assert!(!data_has(&data, "b"));
        assert!(!data_has(&data, ""));
    }

    #[test]
    fn set_creates_intermediate_levels() {
        let mut data = Value::Null;
        data_set(&mut data, "a.b", Value::from(1), true);
        assert_eq!(data_get(&data, "a.b"), Value::from(1));

        data_set(&mut data, "a.b", Value::from(2), false);
        assert_eq!(data_get(&data, "a.b"), Value::from(1));
    }

    #[test]
    fn set_through_wildcard() {
        let mut data = users();
        data_set(&mut data, "*.name", Value::from("anon"), true);
        assert_eq!(data_get(&data, "*.name"), Value::array(vec!["anon", "anon"]));
    }
}
