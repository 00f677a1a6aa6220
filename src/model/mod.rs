//! The output document model.
//!
//! A [`Map`] is an ordered mapping from field name to [`Value`], the shape a
//! document-database encoder consumes. Field order is insertion order and is
//! preserved by every view of the model: iteration, the shell-style
//! [`Display`](fmt::Display) rendering, and `serde` serialization.

use std::fmt;
use std::ops::Index;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A single value in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A scalar string.
    String(String),
    /// An ordered list of values.
    Array(Vec<Value>),
    /// A nested document.
    Document(Map),
    /// An explicit null.
    Null,
}

impl Value {
    /// Returns the string if this is a scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the nested map if this is a document.
    #[must_use]
    pub fn as_document(&self) -> Option<&Map> {
        match self {
            Self::Document(map) => Some(map),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Document(map)
    }
}

/// An ordered document: field names in insertion order, each at most once.
///
/// # Examples
///
/// ```
/// use xml2doc::{Map, Value};
///
/// let mut map = Map::new();
/// map.insert("b", Value::from("1")).unwrap();
/// map.insert("a", Value::Null).unwrap();
/// assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
/// assert_eq!(map.to_string(), r#"{ "b" : "1", "a" : null }"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: IndexMap<String, Value>,
}

impl Map {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns `true` if the map has a field named `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Appends a field.
    ///
    /// # Errors
    ///
    /// Returns the value back if `key` is already present; the map is left
    /// unchanged in that case.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Result<(), Value> {
        match self.entries.entry(key.into()) {
            Entry::Occupied(_) => Err(value),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field names in order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.entries.keys().map(String::as_str)
    }

    /// `(name, value)` pairs in order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter(self.entries.iter())
    }
}

/// Two maps are equal when they hold the same fields in the same order.
impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for Map {}

impl Index<&str> for Map {
    type Output = Value;

    /// # Panics
    ///
    /// Panics if the field is missing.
    fn index(&self, key: &str) -> &Value {
        match self.get(key) {
            Some(v) => v,
            None => panic!("no field named '{key}'"),
        }
    }
}

/// Iterator over the fields of a [`Map`], in order.
#[derive(Debug, Clone)]
pub struct Iter<'a>(indexmap::map::Iter<'a, String, Value>);

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k.as_str(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(k, v)| (k.as_str(), v))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// --- Shell-style rendering ---

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write_quoted(f, s),
            Self::Null => f.write_str("null"),
            Self::Document(map) => map.fmt(f),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt(f)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("{ }");
        }
        f.write_str("{ ")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_quoted(f, key)?;
            write!(f, " : {value}")?;
        }
        f.write_str(" }")
    }
}

// --- serde ---

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Null => serializer.serialize_unit(),
            Self::Document(map) => map.serialize(serializer),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::{assert_eq, assert_ne};

    fn sample() -> Map {
        let mut inner = Map::new();
        inner.insert("SYSTEM", Value::from("sys")).unwrap();
        let mut map = Map::new();
        map.insert("z", Value::from("last-sorted")).unwrap();
        map.insert(
            "b",
            Value::Array(vec![Value::from("hi"), Value::from("bye")]),
        )
        .unwrap();
        map.insert("n", Value::Document(inner)).unwrap();
        map.insert("gone", Value::Null).unwrap();
        map
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let map = sample();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "b", "n", "gone"]);
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut map = sample();
        let rejected = map.insert("z", Value::Null).unwrap_err();
        assert_eq!(rejected, Value::Null);
        assert_eq!(map["z"], Value::from("last-sorted"));
    }

    #[test]
    fn test_lookup_helpers() {
        let map = sample();
        assert_eq!(map["b"].as_array().map(<[Value]>::len), Some(2));
        assert_eq!(
            map["n"].as_document().and_then(|m| m.get("SYSTEM")),
            Some(&Value::from("sys"))
        );
        assert!(map["gone"].is_null());
        assert!(map.get("missing").is_none());
    }

    #[test]
    fn test_equality_respects_order() {
        let mut ab = Map::new();
        ab.insert("a", Value::Null).unwrap();
        ab.insert("b", Value::Null).unwrap();
        let mut ba = Map::new();
        ba.insert("b", Value::Null).unwrap();
        ba.insert("a", Value::Null).unwrap();
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn test_iteration_is_concrete_and_sized() {
        let map = sample();
        let mut iter = (&map).into_iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next_back().map(|(k, _)| k), Some("gone"));
        let names: Vec<&str> = iter.map(|(k, _)| k).collect();
        assert_eq!(names, vec!["z", "b", "n"]);
    }

    #[test]
    fn test_wide_map_builds_quickly() {
        let start = std::time::Instant::now();
        let mut map = Map::new();
        for i in 0..50_000 {
            map.insert(format!("k{i}"), Value::Null).unwrap();
        }
        assert!(map.insert("k0", Value::Null).is_err());
        assert_eq!(map.len(), 50_000);
        assert!(map.contains_key("k49999"));
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_shell_display() {
        assert_eq!(
            sample().to_string(),
            r#"{ "z" : "last-sorted", "b" : ["hi", "bye"], "n" : { "SYSTEM" : "sys" }, "gone" : null }"#
        );
        assert_eq!(Map::new().to_string(), "{ }");
    }

    #[test]
    fn test_display_escapes_strings() {
        let mut map = Map::new();
        map.insert("q", Value::from("say \"hi\"\n")).unwrap();
        assert_eq!(map.to_string(), r#"{ "q" : "say \"hi\"\n" }"#);
    }

    #[test]
    fn test_serde_json_keeps_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"z":"last-sorted","b":["hi","bye"],"n":{"SYSTEM":"sys"},"gone":null}"#
        );
    }
}
