//! JSON projection, encoding and decoding.
//!
//! Values project onto `serde_json::Value`: lists (maps keyed `0..n`)
//! become arrays, other maps become objects, and user objects resolve
//! through their first available capability: ready-made JSON, JSON text,
//! array form, then plain properties.
//!
//! Encoding escapes `/` and non-ASCII characters by default; see
//! [`JsonFlags`] for the switches.

use std::fmt;
use std::io;

use bitflags::bitflags;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::collection::Collection;
use crate::error::{Result, SiftError};
use crate::key::Key;
use crate::value::{is_list, list, Backing, Map, Number, Value};

bitflags! {
    /// Options for JSON encoding and decoding.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct JsonFlags: u32 {
        /// Do not escape `/`.
        const UNESCAPED_SLASHES = 1 << 0;
        /// Write non-ASCII characters as is instead of `\uXXXX`.
        const UNESCAPED_UNICODE = 1 << 1;
        /// Indent with four spaces.
        const PRETTY_PRINT = 1 << 2;
        /// Encode lists as objects.
        const FORCE_OBJECT = 1 << 3;
        /// Fail on decode errors instead of yielding an empty collection,
        /// and on NaN or infinite floats instead of writing `null`.
        const THROW_ON_ERROR = 1 << 4;
    }
}

/// Default nesting limit for [`Collection::from_json`].
pub const DEFAULT_DEPTH: usize = 512;

/// Projects a value onto JSON.
pub fn to_serde(value: &Value, flags: JsonFlags) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(Number::Int(n)) => serde_json::Value::from(*n),
        Value::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(m) => map_to_serde(m, flags),
        Value::Collection(c) => map_to_serde(c.all(), flags),
        Value::Enum(case) => match &case.backing {
            Some(Backing::Int(n)) => serde_json::Value::from(*n),
            Some(Backing::Str(s)) => serde_json::Value::String(s.clone()),
            None => serde_json::Value::String(case.case.clone()),
        },
        Value::Object(obj) => {
            if let Some(j) = obj.json_serialize() {
                j
            } else if let Some(j) = obj.to_json().and_then(|t| serde_json::from_str(&t).ok()) {
                j
            } else if let Some(m) = obj.to_array() {
                map_to_serde(&m, flags)
            } else {
                map_to_serde(&obj.properties(), flags | JsonFlags::FORCE_OBJECT)
            }
        }
        Value::Func(_) => serde_json::Value::Object(serde_json::Map::new()),
    }
}

fn map_to_serde(map: &Map, flags: JsonFlags) -> serde_json::Value {
    if is_list(map) && !flags.contains(JsonFlags::FORCE_OBJECT) {
        serde_json::Value::Array(map.values().map(|v| to_serde(v, flags)).collect())
    } else {
        serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.to_string(), to_serde(v, flags)))
                .collect(),
        )
    }
}

/// Converts decoded JSON into a value. Object keys that spell integers
/// become integer keys.
pub fn from_serde(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::from(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(list(items.into_iter().map(from_serde))),
        serde_json::Value::Object(entries) => Value::Array(
            entries
                .into_iter()
                .map(|(k, v)| (Key::from(k), from_serde(v)))
                .collect(),
        ),
    }
}

/// Encodes projected JSON as text.
pub fn encode(json: &serde_json::Value, flags: JsonFlags) -> Result<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, TextFormatter::new(flags));
    json.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Decodes JSON text, enforcing a maximum nesting depth.
///
/// # Errors
///
/// - [`SiftError::InvalidArgument`] when `depth` is zero,
/// - [`SiftError::Json`] for malformed input,
/// - [`SiftError::DepthExceeded`] when arrays or objects nest deeper than
///   `depth`.
pub fn decode(text: &str, depth: usize) -> Result<Value> {
    if depth == 0 {
        return Err(SiftError::invalid_argument(
            "fromJson",
            "depth must be greater than 0",
        ));
    }
    if nests_deeper_than(text, depth) {
        return Err(SiftError::DepthExceeded { depth });
    }
    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let parsed = serde_json::Value::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(from_serde(parsed))
}

/// Scans raw JSON text for array or object nesting beyond `limit`,
/// skipping brackets inside strings.
fn nests_deeper_than(text: &str, limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for b in text.bytes() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}

/// The first NaN or infinite float the projection would have to write.
fn non_finite(value: &Value) -> Option<f64> {
    match value {
        Value::Number(Number::Float(f)) if !f.is_finite() => Some(*f),
        Value::Array(m) => m.values().find_map(non_finite),
        Value::Collection(c) => c.all().values().find_map(non_finite),
        Value::Object(obj) if obj.json_serialize().is_none() && obj.to_json().is_none() => {
            let entries = obj.to_array().unwrap_or_else(|| obj.properties());
            entries.values().find_map(non_finite)
        }
        _ => None,
    }
}

/// Escapes `& < > " '` for HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Formatter writing compact or four-space indented JSON with optional
/// slash and unicode escaping.
struct TextFormatter {
    flags: JsonFlags,
    depth: usize,
    has_value: bool,
}

impl TextFormatter {
    fn new(flags: JsonFlags) -> Self {
        TextFormatter {
            flags,
            depth: 0,
            has_value: false,
        }
    }

    fn pretty(&self) -> bool {
        self.flags.contains(JsonFlags::PRETTY_PRINT)
    }

    fn newline_indent<W: ?Sized + io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b"\n")?;
        for _ in 0..self.depth {
            writer.write_all(b"    ")?;
        }
        Ok(())
    }

    fn open<W: ?Sized + io::Write>(&mut self, writer: &mut W, bracket: &[u8]) -> io::Result<()> {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(bracket)
    }

    fn close<W: ?Sized + io::Write>(&mut self, writer: &mut W, bracket: &[u8]) -> io::Result<()> {
        self.depth -= 1;
        if self.pretty() && self.has_value {
            self.newline_indent(writer)?;
        }
        writer.write_all(bracket)
    }

    fn separate<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if !first {
            writer.write_all(b",")?;
        }
        if self.pretty() {
            self.newline_indent(writer)?;
        }
        Ok(())
    }
}

impl serde_json::ser::Formatter for TextFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.open(writer, b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.close(writer, b"]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.separate(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.open(writer, b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.close(writer, b"}")
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.separate(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(if self.pretty() { b": " } else { b":" })
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let escape_slashes = !self.flags.contains(JsonFlags::UNESCAPED_SLASHES);
        let escape_unicode = !self.flags.contains(JsonFlags::UNESCAPED_UNICODE);
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let slash = c == '/' && escape_slashes;
            let wide = !c.is_ascii() && escape_unicode;
            if !(slash || wide) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            if slash {
                writer.write_all(b"\\/")?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

impl Collection {
    /// The JSON projection of the entries.
    pub fn json_serialize(&self) -> serde_json::Value {
        map_to_serde(self.all(), JsonFlags::empty())
    }

    /// JSON text with default flags.
    pub fn to_json(&self) -> Result<String> {
        self.to_json_with(JsonFlags::empty())
    }

    /// JSON text with the given flags.
    ///
    /// NaN and infinite floats are written as `null`, or rejected with
    /// [`SiftError::NonFiniteNumber`] under [`JsonFlags::THROW_ON_ERROR`].
    pub fn to_json_with(&self, flags: JsonFlags) -> Result<String> {
        if flags.contains(JsonFlags::THROW_ON_ERROR) {
            if let Some(value) = self.all().values().find_map(non_finite) {
                return Err(SiftError::NonFiniteNumber { value });
            }
        }
        encode(&map_to_serde(self.all(), flags), flags)
    }

    /// The string form: JSON text, HTML-escaped when
    /// [`Collection::escape_when_casting_to_string`] is set.
    pub(crate) fn text(&self) -> Option<String> {
        let text = self.to_json().ok()?;
        if self.escapes_when_casting() {
            Some(escape_html(&text))
        } else {
            Some(text)
        }
    }

    /// Four-space indented JSON text.
    pub fn to_pretty_json(&self) -> Result<String> {
        self.to_json_with(JsonFlags::PRETTY_PRINT)
    }

    /// Decodes JSON text into a collection.
    ///
    /// Decode failures yield an empty collection unless
    /// [`JsonFlags::THROW_ON_ERROR`] is set. A zero `depth` always fails.
    ///
    /// ```
    /// use sift::{Collection, JsonFlags};
    ///
    /// let c = Collection::from_json(r#"{"a": 1, "b": [2, 3]}"#, 512, JsonFlags::empty()).unwrap();
    /// assert_eq!(c.count(), 2);
    ///
    /// assert!(Collection::from_json("{oops", 512, JsonFlags::empty()).unwrap().is_empty());
    /// assert!(Collection::from_json("{oops", 512, JsonFlags::THROW_ON_ERROR).is_err());
    /// ```
    pub fn from_json(text: &str, depth: usize, flags: JsonFlags) -> Result<Collection> {
        match decode(text, depth) {
            Ok(value) => Ok(Collection::make(value)),
            Err(err @ SiftError::InvalidArgument { .. }) => Err(err),
            Err(err) if flags.contains(JsonFlags::THROW_ON_ERROR) => Err(err),
            Err(err) => {
                debug!(error = %err, "JSON decode failed, using an empty collection");
                Ok(Collection::new())
            }
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text().ok_or(fmt::Error)?)
    }
}

impl Serialize for Collection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.json_serialize().serialize(serializer)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        to_serde(self, JsonFlags::empty()).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::EnumCase;

    #[test]
    fn lists_and_maps_project_differently() {
        let c = Collection::from_values(vec![1, 2]);
        assert_eq!(c.to_json().unwrap(), "[1,2]");

        let filtered = c.filter(|v, _| v.as_i64() == Some(2));
        assert_eq!(filtered.to_json().unwrap(), r#"{"1":2}"#);

        assert_eq!(
            c.to_json_with(JsonFlags::FORCE_OBJECT).unwrap(),
            r#"{"0":1,"1":2}"#
        );
    }

    #[test]
    fn slashes_and_unicode_are_escaped_by_default() {
        let c = Collection::from_values(vec!["a/b", "é"]);
        assert_eq!(c.to_json().unwrap(), r#"["a\/b","\u00e9"]"#);
        assert_eq!(
            c.to_json_with(JsonFlags::UNESCAPED_SLASHES | JsonFlags::UNESCAPED_UNICODE)
                .unwrap(),
            r#"["a/b","é"]"#
        );
    }

    #[test]
    fn astral_characters_use_surrogate_pairs() {
        let c = Collection::from_values(vec!["😀"]);
        assert_eq!(c.to_json().unwrap(), r#"["\ud83d\ude00"]"#);
    }

    #[test]
    fn pretty_print_uses_four_spaces() {
        let c = Collection::make(Value::map([("a", Value::array(vec![1])), ("b", Value::array(Vec::<Value>::new()))]));
        assert_eq!(
            c.to_pretty_json().unwrap(),
            "{\n    \"a\": [\n        1\n    ],\n    \"b\": []\n}"
        );
    }

    #[test]
    fn enums_and_floats() {
        let c = Collection::from_values(vec![
            Value::Enum(EnumCase::backed("Level", "High", Backing::Int(3))),
            Value::Enum(EnumCase::unit("State", "Open")),
            Value::from(2.0),
            Value::from(f64::NAN),
        ]);
        assert_eq!(c.to_json().unwrap(), r#"[3,"Open",2.0,null]"#);
    }

    #[test]
    fn decode_depth_limits() {
        assert!(decode("[1]", 1).is_ok());
        assert!(matches!(decode("[[1]]", 1), Err(SiftError::DepthExceeded { depth: 1 })));
        assert!(matches!(decode("1", 0), Err(SiftError::InvalidArgument { .. })));
        assert!(matches!(
            Collection::from_json("[[1]]", 1, JsonFlags::empty()),
            Ok(ref c) if c.is_empty()
        ));
        assert!(Collection::from_json("[1]", 0, JsonFlags::empty()).is_err());
    }

    fn nested_lists(levels: usize) -> String {
        format!("{}{}", "[".repeat(levels), "]".repeat(levels))
    }

    #[test]
    fn decode_honours_depths_beyond_parser_default() {
        let text = nested_lists(200);
        assert!(Collection::from_json(&text, DEFAULT_DEPTH, JsonFlags::THROW_ON_ERROR).is_ok());
        assert!(Collection::from_json(&text, 200, JsonFlags::THROW_ON_ERROR).is_ok());
        assert!(matches!(
            Collection::from_json(&text, 199, JsonFlags::THROW_ON_ERROR),
            Err(SiftError::DepthExceeded { depth: 199 })
        ));

        let deepest = nested_lists(DEFAULT_DEPTH);
        assert!(decode(&deepest, DEFAULT_DEPTH).is_ok());
        assert!(decode(&nested_lists(DEFAULT_DEPTH + 1), DEFAULT_DEPTH).is_err());
    }

    #[test]
    fn depth_scan_ignores_brackets_in_strings() {
        assert!(decode(r#"["[[[\"]]]"]"#, 1).is_ok());
        assert!(matches!(decode("{\"a\":{\"b\":1}}", 1), Err(SiftError::DepthExceeded { .. })));
    }

    #[test]
    fn non_finite_floats_fail_when_throwing() {
        let c = Collection::from_values(vec![Value::from(1.5), Value::array(vec![f64::INFINITY])]);
        assert_eq!(c.to_json().unwrap(), "[1.5,[null]]");
        assert!(matches!(
            c.to_json_with(JsonFlags::THROW_ON_ERROR),
            Err(SiftError::NonFiniteNumber { value }) if value.is_infinite()
        ));
        let finite = Collection::from_values(vec![1.5]);
        assert_eq!(finite.to_json_with(JsonFlags::THROW_ON_ERROR).unwrap(), "[1.5]");
    }

    #[test]
    fn decoded_object_keys_normalise() {
        let c = Collection::from_json(r#"{"1":"a","x":"b"}"#, DEFAULT_DEPTH, JsonFlags::empty()).unwrap();
        assert_eq!(c.get(1), Some(&Value::from("a")));
        assert_eq!(c.get("x"), Some(&Value::from("b")));
    }

    #[test]
    fn display_escapes_html_on_request() {
        let c = Collection::from_values(vec!["<b>"]);
        assert_eq!(c.to_string(), r#"["<b>"]"#);
        let escaped = c.escape_when_casting_to_string(true);
        assert_eq!(escaped.to_string(), "[&quot;&lt;b&gt;&quot;]");
    }

    #[test]
    fn serde_serialize_matches_projection() {
        let c = Collection::from_values(vec![Value::from(1), Value::map([("k", "v")])]);
        assert_eq!(serde_json::to_string(&c).unwrap(), r#"[1,{"k":"v"}]"#);
    }
}
