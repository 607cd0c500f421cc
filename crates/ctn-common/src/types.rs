//! Domain primitive types used across the ctn workspace.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Key of an array element: an integer index or an explicit string key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Key {
    /// Integer key, either auto-assigned or explicit.
    Index(i64),
    /// Explicit string key.
    Name(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(n) => write!(f, "{n:?}"),
        }
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Ordered array with integer or string keys.
///
/// Anonymous pushes take the next free non-negative integer index and never
/// overwrite a key that was set explicitly: with `3` already taken, four
/// pushes land on `0, 1, 2, 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedArray<T> {
    entries: Vec<(Key, T)>,
    next_index: i64,
}

impl<T> KeyedArray<T> {
    /// Creates an empty array.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_index: 0,
        }
    }

    /// Appends a value under the next free integer index and returns that key.
    pub fn push(&mut self, value: T) -> Key {
        while self.contains_key(&Key::Index(self.next_index)) {
            self.next_index += 1;
        }
        let key = Key::Index(self.next_index);
        self.entries.push((key.clone(), value));
        self.next_index += 1;
        key
    }

    /// Sets a value under an explicit key.
    ///
    /// An existing entry with the same key is replaced in place and its
    /// previous value returned.
    pub fn insert(&mut self, key: Key, value: T) -> Option<T> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &Key) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns whether `key` is taken.
    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &T)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Converts every element, keeping keys, order and the push cursor.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_map<U, E>(&self, mut f: impl FnMut(&T) -> Result<U, E>) -> Result<KeyedArray<U>, E> {
        let entries = self
            .entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), f(v)?)))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(KeyedArray {
            entries,
            next_index: self.next_index,
        })
    }
}

impl<T> Default for KeyedArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for KeyedArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        for value in iter {
            let _ = array.push(value);
        }
        array
    }
}

impl<T> IntoIterator for KeyedArray<T> {
    type Item = (Key, T);
    type IntoIter = std::vec::IntoIter<(Key, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<T: Serialize> Serialize for KeyedArray<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A decoded ctn value: parameter contents and raw service arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// `null`.
    Null,
    /// `yes`/`no` (or `true`/`false`).
    Bool(bool),
    /// Integer number.
    Int(i64),
    /// Decimal or exponent number.
    Float(f64),
    /// Quoted string with escapes decoded.
    String(String),
    /// `{ ... }` array literal.
    Array(KeyedArray<Value>),
}

impl Value {
    /// Human-readable type name used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
        }
    }

    /// Returns the string contents, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer, if this is an integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number as `f64` for both integers and floats.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the array, if this is an array.
    #[must_use]
    pub const fn as_array(&self) -> Option<&KeyedArray<Self>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Whether this is `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(true) => write!(f, "yes"),
            Self::Bool(false) => write!(f, "no"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Array(a) => {
                write!(f, "{{")?;
                for (i, (key, value)) in a.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
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

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<KeyedArray<Self>> for Value {
    fn from(a: KeyedArray<Self>) -> Self {
        Self::Array(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_skips_explicit_integer_keys() {
        let mut array = KeyedArray::new();
        let _ = array.insert(Key::Index(3), "explicit");
        let pushed: Vec<Key> = (0..4).map(|_| array.push("anon")).collect();
        assert_eq!(
            pushed,
            vec![Key::Index(0), Key::Index(1), Key::Index(2), Key::Index(4)]
        );
        assert_eq!(array.get(&Key::Index(3)), Some(&"explicit"));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut array = KeyedArray::new();
        let _ = array.insert(Key::from("a"), 1);
        let _ = array.insert(Key::from("b"), 2);
        let previous = array.insert(Key::from("a"), 3);
        assert_eq!(previous, Some(1));
        let keys: Vec<&Key> = array.keys().collect();
        assert_eq!(keys, vec![&Key::from("a"), &Key::from("b")]);
        assert_eq!(array.get(&Key::from("a")), Some(&3));
    }

    #[test]
    fn try_map_keeps_push_cursor() {
        let mut array: KeyedArray<i64> = [1, 2].into_iter().collect();
        let _ = array.insert(Key::Index(2), 3);
        let mut doubled = array
            .try_map(|v| Ok::<_, ()>(v * 2))
            .expect("mapping cannot fail");
        assert_eq!(doubled.push(0), Key::Index(3));
    }

    #[test]
    fn value_serializes_as_plain_json() {
        let mut array = KeyedArray::new();
        let _ = array.push(Value::from("x"));
        let _ = array.insert(Key::from("debug"), Value::Bool(true));
        let json = serde_json::to_string(&Value::Array(array)).expect("serialize");
        assert_eq!(json, r#"{"0":"x","debug":true}"#);
    }

    #[test]
    fn value_display_uses_ctn_literals() {
        let array: KeyedArray<Value> = vec![Value::Bool(false), Value::Null].into_iter().collect();
        assert_eq!(Value::Array(array).to_string(), "{0: no, 1: null}");
    }

    #[test]
    fn as_float_widens_integers() {
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
        assert_eq!(Value::from("2").as_float(), None);
    }
}
