//! Attribute values and attribute maps.

use indexmap::IndexMap;

/// A single attribute value.
///
/// Mirrors the value space attributes can hold on the wire: scalars, byte
/// sequences, and arbitrarily nested arrays and maps.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyValue {
    /// A UTF-8 string.
    String(String),
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating point number.
    Double(f64),
    /// An opaque byte sequence.
    Bytes(Vec<u8>),
    /// An ordered list of values.
    Array(Vec<AnyValue>),
    /// A nested key/value map.
    Map(AttributeMap),
}

impl From<&str> for AnyValue {
    fn from(value: &str) -> Self {
        AnyValue::String(value.to_string())
    }
}

impl From<String> for AnyValue {
    fn from(value: String) -> Self {
        AnyValue::String(value)
    }
}

impl From<bool> for AnyValue {
    fn from(value: bool) -> Self {
        AnyValue::Bool(value)
    }
}

impl From<i64> for AnyValue {
    fn from(value: i64) -> Self {
        AnyValue::Int(value)
    }
}

impl From<f64> for AnyValue {
    fn from(value: f64) -> Self {
        AnyValue::Double(value)
    }
}

/// An insertion-ordered map of attributes.
///
/// Insertion order is preserved so that records round-trip deterministically
/// through the pipeline: mutating and then comparing batches in tests (and in
/// correctness tooling) does not depend on hash ordering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeMap {
    entries: IndexMap<String, AnyValue>,
}

impl AttributeMap {
    /// Creates an empty attribute map.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Returns the number of attributes in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets a reference to the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&AnyValue> {
        self.entries.get(key)
    }

    /// Gets a mutable reference to the value for `key`, if present.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut AnyValue> {
        self.entries.get_mut(key)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts a value for `key`, returning the previous value if any.
    pub fn insert<V>(&mut self, key: impl Into<String>, value: V) -> Option<AnyValue>
    where
        V: Into<AnyValue>,
    {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes the value for `key`, preserving the order of the remaining
    /// entries.
    pub fn remove(&mut self, key: &str) -> Option<AnyValue> {
        self.entries.shift_remove(key)
    }

    /// Keeps only the entries for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&String, &mut AnyValue) -> bool) {
        self.entries.retain(keep);
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnyValue)> {
        self.entries.iter()
    }

    /// Iterates mutably over the entries in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut AnyValue)> {
        self.entries.iter_mut()
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeMap
where
    K: Into<String>,
    V: Into<AnyValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_preserved_across_removal() {
        let mut map = AttributeMap::new();
        map.insert("a", 1i64);
        map.insert("b", 2i64);
        map.insert("c", 3i64);
        map.remove("b");

        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn insert_replaces_existing_value() {
        let mut map = AttributeMap::new();
        map.insert("env", "staging");
        map.insert("env", "prod");

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("env"), Some(&AnyValue::String("prod".to_string())));
    }
}
