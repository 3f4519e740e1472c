//! Runtime values held by collections.
//!
//! [`Value`] is the dynamic element type of a [`Collection`]. It covers the
//! scalars, nested ordered maps, nested collections, enum cases, shared user
//! objects (anything implementing [`Object`]) and dynamically callable
//! functions ([`Func`]).

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::collection::Collection;
use crate::compare;
use crate::error::{Result, SiftError};
use crate::key::Key;
use crate::object::Object;

/// Ordered key/value storage used by collections and nested arrays.
pub type Map = IndexMap<Key, Value>;

/// A dynamic value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent or null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// String value.
    String(String),
    /// Nested ordered map. Lists are maps keyed `0..n`.
    Array(Map),
    /// Nested collection.
    Collection(Collection),
    /// Enum case.
    Enum(EnumCase),
    /// Shared user object.
    Object(Rc<dyn Object>),
    /// Dynamically callable function.
    Func(Func),
}

impl Value {
    /// Builds a list value keyed `0..n`.
    pub fn array<I, V>(items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(list(items))
    }

    /// Builds a map value from key/value pairs.
    pub fn map<I, K, V>(pairs: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        Value::Array(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wraps a user object.
    pub fn object<O: Object + 'static>(object: O) -> Value {
        Value::Object(Rc::new(object))
    }

    /// Wraps a closure as a callable value.
    pub fn func<F>(f: F) -> Value
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Value::Func(Func::new(f))
    }

    /// Wraps an enum implementing [`EnumLike`].
    pub fn from_enum<E: EnumLike + ?Sized>(e: &E) -> Value {
        Value::Enum(e.to_case())
    }

    /// Returns `true` if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if this is a `Bool`.
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns `true` if this is a `Number`.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns `true` if this is a `String`.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns `true` for values that can be indexed like a sequence:
    /// nested arrays and collections.
    pub fn is_sequence_like(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Collection(_))
    }

    /// Returns `true` for object-like values: collections, user objects and
    /// functions. Enum cases count as objects until normalised by
    /// [`Value::enum_value`].
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            Value::Collection(_) | Value::Object(_) | Value::Func(_) | Value::Enum(_)
        )
    }

    /// Returns `true` for strings, collections and objects that have a
    /// string form.
    pub fn is_string_like(&self) -> bool {
        match self {
            Value::String(_) | Value::Collection(_) => true,
            Value::Object(obj) => obj.to_display().is_some(),
            _ => false,
        }
    }

    /// Extracts the boolean, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extracts the number, if this is a `Number`.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts an integer, if this is an integral `Number`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(Number::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Extracts a float from any `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::to_f64)
    }

    /// Extracts the string slice, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the nested map, if this is an `Array`.
    pub fn as_array(&self) -> Option<&Map> {
        match self {
            Value::Array(m) => Some(m),
            _ => None,
        }
    }

    /// Extracts the nested collection, if this is a `Collection`.
    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Value::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Extracts the function, if this is a `Func`.
    pub fn as_func(&self) -> Option<&Func> {
        match self {
            Value::Func(f) => Some(f),
            _ => None,
        }
    }

    /// Truthiness: `null`, `false`, `0`, `0.0`, `""`, `"0"` and empty arrays
    /// are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !n.is_zero(),
            Value::String(s) => !(s.is_empty() || s == "0"),
            Value::Array(m) => !m.is_empty(),
            Value::Collection(_) | Value::Enum(_) | Value::Object(_) | Value::Func(_) => true,
        }
    }

    /// Interprets the value as a boolean flag.
    ///
    /// Accepts `true`/`1`/`on`/`yes` and `false`/`0`/`off`/`no`/`""`
    /// (case-insensitive, surrounding whitespace ignored), booleans, the
    /// integers `0` and `1`, and `null` (false). Anything else is `None`.
    pub fn as_boolean_like(&self) -> Option<bool> {
        match self {
            Value::Null => Some(false),
            Value::Bool(b) => Some(*b),
            Value::Number(Number::Int(0)) => Some(false),
            Value::Number(Number::Int(1)) => Some(true),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => Some(true),
                "0" | "false" | "off" | "no" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Normalises enum cases to their scalar form: backed cases become their
    /// backing value, unit cases their case name. Other values are returned
    /// unchanged.
    pub fn enum_value(&self) -> Value {
        match self {
            Value::Enum(case) => match &case.backing {
                Some(Backing::Int(n)) => Value::from(*n),
                Some(Backing::Str(s)) => Value::String(s.clone()),
                None => Value::String(case.case.clone()),
            },
            other => other.clone(),
        }
    }

    /// Coerces the value to a number for arithmetic.
    ///
    /// Booleans count as `0`/`1` and numeric strings are parsed. `null`,
    /// non-numeric strings and compound values yield `None`.
    pub fn to_number(&self) -> Option<Number> {
        match self.enum_value() {
            Value::Bool(b) => Some(Number::Int(b as i64)),
            Value::Number(n) => Some(n),
            Value::String(s) => Number::parse(&s),
            _ => None,
        }
    }

    /// Coerces the value to a string where a string form exists.
    ///
    /// `null` is the empty string, `true` is `"1"`, `false` is empty.
    /// Collections render as their JSON text. Arrays and functions have no
    /// string form.
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(true) => Some("1".to_string()),
            Value::Bool(false) => Some(String::new()),
            Value::Number(n) => Some(n.to_text()),
            Value::String(s) => Some(s.clone()),
            Value::Enum(_) => self.enum_value().coerce_string(),
            Value::Object(obj) => obj.to_display(),
            Value::Collection(c) => c.text(),
            Value::Array(_) | Value::Func(_) => None,
        }
    }

    /// Returns the debug type name: `null`, `bool`, `int`, `float`,
    /// `string`, `array`, or the type name of collections, enums, objects
    /// and functions.
    pub fn debug_type(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Number(Number::Int(_)) => "int".to_string(),
            Value::Number(Number::Float(_)) => "float".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Collection(_) => Collection::TYPE_NAME.to_string(),
            Value::Enum(case) => case.type_name.clone(),
            Value::Object(obj) => obj.type_name().to_string(),
            Value::Func(_) => Func::TYPE_NAME.to_string(),
        }
    }

    /// Returns `true` if the value is an instance of the named type: its
    /// own type, a declared ancestor, or one of the capability names its
    /// kind carries. Scalars and arrays are never instances.
    pub fn is_instance_of(&self, type_name: &str) -> bool {
        match self {
            Value::Collection(_) => Collection::INTERFACES.contains(&type_name),
            Value::Enum(case) => {
                case.type_name == type_name
                    || type_name == "UnitEnum"
                    || (type_name == "BackedEnum" && case.backing.is_some())
            }
            Value::Object(obj) => {
                obj.type_name() == type_name || obj.ancestors().contains(&type_name)
            }
            Value::Func(_) => type_name == Func::TYPE_NAME,
            _ => false,
        }
    }

    /// Reads an attribute the way the element proxy does: sequences are
    /// indexed, objects answer through [`Object::get_attr`], collections
    /// hand out element proxies. Everything else reads as `null`.
    pub fn get_attr(&self, name: &str) -> Result<Value> {
        match self {
            Value::Array(m) => Ok(m.get(&Key::from(name)).cloned().unwrap_or_default()),
            Value::Collection(c) => c.get_attr(name),
            Value::Object(obj) => obj.get_attr(name),
            _ => Ok(Value::Null),
        }
    }

    /// Calls a method on the value.
    ///
    /// Collections dispatch through [`Collection::call`], objects through
    /// [`Object::call_method`]. Other values have no methods.
    pub fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self {
            Value::Collection(c) => c.call(name, args),
            Value::Object(obj) => obj.call_method(name, args),
            other => Err(SiftError::unknown_operation(other.debug_type(), name)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        compare::strict_eq(self, other)
    }
}

/// Builds a list map keyed `0..n`.
pub fn list<I, V>(items: I) -> Map
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| (Key::from(i), v.into()))
        .collect()
}

/// Returns `true` when the map's keys are exactly `0..n` in order.
pub fn is_list(map: &Map) -> bool {
    map.keys()
        .enumerate()
        .all(|(i, k)| matches!(k, Key::Int(n) if *n == i as i64))
}

/// Numeric value.
///
/// Integers stay integral through addition until they overflow, and
/// division only produces a float when the quotient is not exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
}

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t\n\r\x0B\x0C]*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?[ \t\n\r\x0B\x0C]*$")
        .expect("numeric pattern is valid")
});

static INTEGRAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("integral pattern is valid"));

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    /// Returns `true` for `0` and `0.0`.
    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(n) => n == 0,
            Number::Float(n) => n == 0.0,
        }
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Adds two numbers; integer overflow promotes to float.
    pub fn add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => match a.checked_add(b) {
                Some(n) => Number::Int(n),
                None => Number::Float(a as f64 + b as f64),
            },
            _ => Number::Float(self.to_f64() + other.to_f64()),
        }
    }

    /// Divides two numbers. Exact integer quotients stay integral.
    /// Returns `None` on division by zero.
    pub fn div(self, other: Number) -> Option<Number> {
        if other.is_zero() {
            return None;
        }
        match (self, other) {
            (Number::Int(a), Number::Int(b)) if b != -1 && a % b == 0 => Some(Number::Int(a / b)),
            _ => Some(Number::Float(self.to_f64() / other.to_f64())),
        }
    }

    /// Parses a numeric string.
    ///
    /// Leading and trailing whitespace, a sign, a fraction and an exponent
    /// are accepted. Integral strings that fit `i64` parse as integers.
    pub fn parse(s: &str) -> Option<Number> {
        if !NUMERIC.is_match(s) {
            return None;
        }
        let trimmed = s.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\x0B');
        if INTEGRAL.is_match(trimmed) {
            if let Ok(n) = trimmed.parse::<i64>() {
                return Some(Number::Int(n));
            }
        }
        trimmed.parse::<f64>().ok().map(Number::Float)
    }

    /// Renders the number as text: integral floats print without a
    /// fraction, non-finite floats as `INF`/`-INF`/`NAN`.
    pub fn to_text(self) -> String {
        match self {
            Number::Int(n) => n.to_string(),
            Number::Float(f) if f.is_nan() => "NAN".to_string(),
            Number::Float(f) if f.is_infinite() => {
                if f > 0.0 { "INF" } else { "-INF" }.to_string()
            }
            Number::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            Number::Float(f) => f.to_string(),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

macro_rules! number_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Number {
            fn from(n: $t) -> Self {
                Number::Int(n as i64)
            }
        })*
    };
}

number_from_signed!(i8, i16, i32, i64, isize, u8, u16, u32);

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Number::Int(n),
            Err(_) => Number::Float(n as f64),
        }
    }
}

impl From<usize> for Number {
    fn from(n: usize) -> Self {
        Number::from(n as u64)
    }
}

impl From<f32> for Number {
    fn from(n: f32) -> Self {
        Number::Float(n as f64)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::Float(n)
    }
}

/// Backing scalar of a backed enum case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Backing {
    /// Integer-backed case.
    Int(i64),
    /// String-backed case.
    Str(String),
}

/// An enum case carried as a value.
///
/// Cases compare by identity (same enum type and case) under strict and
/// loose equality; the operator predicate normalises them to their scalar
/// form first, see [`Value::enum_value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumCase {
    /// The enum's type name.
    pub type_name: String,
    /// The case name.
    pub case: String,
    /// The backing scalar for backed enums.
    pub backing: Option<Backing>,
}

impl EnumCase {
    /// Creates a unit case.
    pub fn unit(type_name: impl Into<String>, case: impl Into<String>) -> Self {
        EnumCase {
            type_name: type_name.into(),
            case: case.into(),
            backing: None,
        }
    }

    /// Creates a backed case.
    pub fn backed(type_name: impl Into<String>, case: impl Into<String>, backing: Backing) -> Self {
        EnumCase {
            type_name: type_name.into(),
            case: case.into(),
            backing: Some(backing),
        }
    }
}

/// Conversion of Rust enums into [`EnumCase`] values.
///
/// # Example
///
/// ```
/// use sift::{Backing, EnumLike, Value};
///
/// #[derive(Clone, Copy)]
/// enum Status {
///     Active,
///     Archived,
/// }
///
/// impl EnumLike for Status {
///     fn enum_type(&self) -> &'static str {
///         "Status"
///     }
///
///     fn case_name(&self) -> &'static str {
///         match self {
///             Status::Active => "Active",
///             Status::Archived => "Archived",
///         }
///     }
///
///     fn backing(&self) -> Option<Backing> {
///         Some(Backing::Str(self.case_name().to_lowercase()))
///     }
/// }
///
/// let v = Value::from_enum(&Status::Active);
/// assert_eq!(v.enum_value(), Value::from("active"));
/// ```
pub trait EnumLike {
    /// The enum's type name.
    fn enum_type(&self) -> &'static str;

    /// The case name.
    fn case_name(&self) -> &'static str;

    /// The backing scalar, for backed enums.
    fn backing(&self) -> Option<Backing> {
        None
    }

    /// Builds the [`EnumCase`] for this variant.
    fn to_case(&self) -> EnumCase {
        EnumCase {
            type_name: self.enum_type().to_string(),
            case: self.case_name().to_string(),
            backing: self.backing(),
        }
    }
}

/// A dynamically callable function value.
///
/// Functions compare by identity.
#[derive(Clone)]
pub struct Func(Rc<dyn Fn(&[Value]) -> Result<Value>>);

impl Func {
    /// Type name reported by [`Value::debug_type`].
    pub const TYPE_NAME: &'static str = "Closure";

    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Func(Rc::new(f))
    }

    /// Invokes the function.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.0)(args)
    }

    /// Returns `true` if both handles point at the same closure.
    pub fn ptr_eq(&self, other: &Func) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Func(..)")
    }
}

// Conversions from common types to Value

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! value_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Number(Number::from(n))
            }
        })*
    };
}

value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Array(m)
    }
}

impl From<Collection> for Value {
    fn from(c: Collection) -> Self {
        Value::Collection(c)
    }
}

impl From<EnumCase> for Value {
    fn from(e: EnumCase) -> Self {
        Value::Enum(e)
    }
}

impl From<Func> for Value {
    fn from(f: Func) -> Self {
        Value::Func(f)
    }
}

impl From<Key> for Value {
    fn from(k: Key) -> Self {
        k.to_value()
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl From<Rc<dyn Object>> for Value {
    fn from(obj: Rc<dyn Object>) -> Self {
        Value::Object(obj)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Value::array(items)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(v: Option<V>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
