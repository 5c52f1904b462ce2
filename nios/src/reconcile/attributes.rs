//! Extensible attribute maps annotated with inheritance

use super::tag::CORRELATION_TAG_KEY;
use std::collections::BTreeMap;

/// One attribute value plus whether the remote system supplied it on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedValue {
    pub value: String,
    pub inherited: bool,
}

impl TaggedValue {
    pub fn explicit(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            inherited: false,
        }
    }

    pub fn inherited(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            inherited: true,
        }
    }
}

/// Attribute name to tagged value. Keys are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: BTreeMap<String, TaggedValue>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map where every entry is explicit
    pub fn from_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        values
            .into_iter()
            .map(|(k, v)| (k.into(), TaggedValue::explicit(v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&TaggedValue> {
        self.entries.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.value.as_str())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: TaggedValue) -> Option<TaggedValue> {
        self.entries.insert(key.into(), value)
    }

    pub fn insert_explicit(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), TaggedValue::explicit(value));
    }

    pub fn remove(&mut self, key: &str) -> Option<TaggedValue> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TaggedValue)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Entries with `inherited == false`
    pub fn explicit(&self) -> AttributeMap {
        self.filtered(|v| !v.inherited)
    }

    /// Entries with `inherited == true`
    pub fn inherited(&self) -> AttributeMap {
        self.filtered(|v| v.inherited)
    }

    fn filtered(&self, keep: impl Fn(&TaggedValue) -> bool) -> AttributeMap {
        self.entries
            .iter()
            .filter(|(_, v)| keep(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The non-empty correlation tag value, if the map carries one
    pub fn correlation_tag(&self) -> Option<&str> {
        self.value(CORRELATION_TAG_KEY).filter(|v| !v.is_empty())
    }

    /// A copy of this map without the reserved correlation key
    pub fn without_correlation_tag(&self) -> AttributeMap {
        let mut map = self.clone();
        map.remove(CORRELATION_TAG_KEY);
        map
    }

    /// Flattens to the plain name → value layout persisted in state
    pub fn values(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect()
    }
}

impl FromIterator<(String, TaggedValue)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (String, TaggedValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, String>> for AttributeMap {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self::from_values(values)
    }
}

impl<'a> IntoIterator for &'a AttributeMap {
    type Item = (&'a String, &'a TaggedValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, TaggedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
