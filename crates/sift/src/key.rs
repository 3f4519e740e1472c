//! Collection keys.
//!
//! A [`Key`] is either an integer or a string. String keys that spell a
//! canonical decimal integer collapse to [`Key::Int`], so `"5"` and `5`
//! address the same entry.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::value::{Number, Value};

/// Key of a collection entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(String),
}

impl Key {
    /// Normalises a string key, turning canonical integers into [`Key::Int`].
    ///
    /// `"7"` and `"-7"` become integers; `"07"`, `"+7"` and `"-0"` stay strings.
    pub fn normalize(s: &str) -> Key {
        match parse_canonical_int(s) {
            Some(n) => Key::Int(n),
            None => Key::Str(s.to_string()),
        }
    }

    /// Converts a value into a key, the way values are used as group or
    /// index keys.
    ///
    /// Booleans become `0`/`1`, floats truncate, null becomes the empty
    /// string and enums use their backing value or case name. Arrays,
    /// collections and objects without a string form are rejected.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value.enum_value() {
            Value::Null => Some(Key::Str(String::new())),
            Value::Bool(b) => Some(Key::Int(b as i64)),
            Value::Number(Number::Int(n)) => Some(Key::Int(n)),
            Value::Number(Number::Float(f)) if f.is_finite() => Some(Key::Int(f.trunc() as i64)),
            Value::String(s) => Some(Key::normalize(&s)),
            Value::Object(obj) => obj.to_display().map(|s| Key::normalize(&s)),
            _ => None,
        }
    }

    /// Returns the integer form of this key, if it has one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(n) => Some(*n),
            Key::Str(_) => None,
        }
    }

    /// Returns the string form of this key, if it has one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Int(_) => None,
            Key::Str(s) => Some(s),
        }
    }

    /// Converts the key into a value.
    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(n) => Value::from(*n),
            Key::Str(s) => Value::String(s.clone()),
        }
    }
}

fn parse_canonical_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if s == "-0" {
        return None;
    }
    s.parse().ok()
}

/// The empty string key, which is also the key `null` converts to.
impl Default for Key {
    fn default() -> Self {
        Key::Str(String::new())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Str(s) => write!(f, "{}", s),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(n as i64)
    }
}

impl From<usize> for Key {
    fn from(n: usize) -> Self {
        Key::Int(n as i64)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::normalize(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        match parse_canonical_int(&s) {
            Some(n) => Key::Int(n),
            None => Key::Str(s),
        }
    }
}

impl From<&Key> for Key {
    fn from(k: &Key) -> Self {
        k.clone()
    }
}
